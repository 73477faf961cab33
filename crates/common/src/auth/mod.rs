//! Authentication and authorization utilities
//!
//! Provides:
//! - JWT token generation and validation
//! - Password hashing (argon2)
//! - The authenticated `Principal` extractor
//! - Role classification and store scoping
//! - Opaque token generation for QR intake and work order sharing

mod principal;
pub mod roles;
pub mod scope;

pub use principal::Principal;
pub use roles::Role;
pub use scope::{can_see_all_stores, store_scope, StoreScope};

use crate::errors::{AppError, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Account email
    pub email: String,

    /// Role string (canonical spelling)
    pub role: String,

    /// Assigned store, when the role is store-bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<Uuid>,

    /// Backing technician record, TECHNICIAN tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technician_id: Option<Uuid>,

    /// Backing vendor record, VENDOR tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Identity fields baked into a token at issue time
#[derive(Debug, Clone)]
pub struct TokenIdentity {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    pub store_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
}

/// JWT token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
    mobile_expiration_secs: i64,
}

impl JwtManager {
    /// Create a new JWT manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64, mobile_expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
            mobile_expiration_secs: mobile_expiration_secs as i64,
        }
    }

    /// Generate a web session token
    pub fn generate_token(&self, identity: &TokenIdentity) -> Result<String> {
        self.generate_with_ttl(identity, self.expiration_secs)
    }

    /// Generate a long-lived bearer token for mobile USER clients
    pub fn generate_mobile_token(&self, identity: &TokenIdentity) -> Result<String> {
        self.generate_with_ttl(identity, self.mobile_expiration_secs)
    }

    fn generate_with_ttl(&self, identity: &TokenIdentity, ttl_secs: i64) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(ttl_secs);

        let claims = JwtClaims {
            sub: identity.user_id.to_string(),
            email: identity.email.clone(),
            role: identity.role.as_str().to_string(),
            store_id: identity.store_id,
            technician_id: identity.technician_id,
            vendor_id: identity.vendor_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a JWT token
    pub fn validate_token(&self, token: &str) -> Result<JwtClaims> {
        decode::<JwtClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid token".to_string(),
                },
            })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored argon2 hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Generate an opaque token for work order share links
pub fn generate_share_token() -> String {
    let random_bytes: [u8; 16] = rand::random();
    hex::encode(random_bytes)
}

/// Generate a store's public QR intake token. Stable once assigned.
pub fn generate_qr_token() -> String {
    let random_bytes: [u8; 12] = rand::random();
    hex::encode(random_bytes)
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Axum extractor for Principal: verifies the bearer token and materializes
/// the role-tagged identity for the handler.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    Arc<JwtManager>: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let jwt = Arc::<JwtManager>::from_ref(state);

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header is not a bearer token".to_string(),
        })?;

        let claims = jwt.validate_token(token)?;
        Principal::from_claims(&claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> TokenIdentity {
        TokenIdentity {
            user_id: Uuid::new_v4(),
            email: "admin@example.com".to_string(),
            role,
            store_id: Some(Uuid::new_v4()),
            technician_id: None,
            vendor_id: None,
        }
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600, 86400);
        let id = identity(Role::StoreAdmin);

        let token = manager.generate_token(&id).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, id.user_id.to_string());
        assert_eq!(claims.role, "STORE_ADMIN");
        assert_eq!(claims.store_id, id.store_id);
    }

    #[test]
    fn test_mobile_token_is_longer_lived() {
        let manager = JwtManager::new("test_secret", 60, 86400);
        let id = identity(Role::User);

        let web = manager.generate_token(&id).unwrap();
        let mobile = manager.generate_mobile_token(&id).unwrap();

        let web_claims = manager.validate_token(&web).unwrap();
        let mobile_claims = manager.validate_token(&mobile).unwrap();
        assert!(mobile_claims.exp > web_claims.exp);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let manager = JwtManager::new("test_secret", 3600, 86400);
        let other = JwtManager::new("other_secret", 3600, 86400);
        let token = manager.generate_token(&identity(Role::User)).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_password_hash_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("abc"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_share_token_shape() {
        let token = generate_share_token();
        assert_eq!(token.len(), 32);
        assert_ne!(token, generate_share_token());
    }
}
