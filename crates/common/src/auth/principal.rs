//! Authenticated principal
//!
//! A tagged union keyed by role: each variant carries exactly the fields
//! valid for that role, so handlers never reach into an untyped session
//! payload. Built from verified JWT claims by the request extractor.

use super::roles::Role;
use super::scope::{store_scope, StoreScope};
use super::JwtClaims;
use crate::errors::{AppError, Result};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    MasterAdmin {
        user_id: Uuid,
        email: String,
    },
    StoreAdmin {
        user_id: Uuid,
        email: String,
        store_id: Option<Uuid>,
    },
    /// Legacy ADMIN accounts, store-scoped like StoreAdmin
    Admin {
        user_id: Uuid,
        email: String,
        store_id: Option<Uuid>,
    },
    Technician {
        user_id: Uuid,
        email: String,
        technician_id: Uuid,
        store_id: Option<Uuid>,
    },
    Vendor {
        user_id: Uuid,
        email: String,
        vendor_id: Uuid,
        store_id: Option<Uuid>,
    },
    User {
        user_id: Uuid,
        email: String,
        store_id: Option<Uuid>,
    },
}

impl Principal {
    /// Build a principal from verified token claims
    pub fn from_claims(claims: &JwtClaims) -> Result<Self> {
        let role = Role::parse(&claims.role).ok_or_else(|| AppError::Unauthorized {
            message: format!("Unknown role: {}", claims.role),
        })?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized {
            message: "Malformed subject claim".to_string(),
        })?;
        let email = claims.email.clone();
        let store_id = claims.store_id;

        let principal = match role {
            Role::MasterAdmin => Principal::MasterAdmin { user_id, email },
            Role::StoreAdmin => Principal::StoreAdmin {
                user_id,
                email,
                store_id,
            },
            Role::Admin => Principal::Admin {
                user_id,
                email,
                store_id,
            },
            Role::Technician => Principal::Technician {
                user_id,
                email,
                technician_id: claims.technician_id.ok_or_else(|| {
                    AppError::Unauthorized {
                        message: "Technician token missing technician_id".to_string(),
                    }
                })?,
                store_id,
            },
            Role::Vendor => Principal::Vendor {
                user_id,
                email,
                vendor_id: claims.vendor_id.ok_or_else(|| AppError::Unauthorized {
                    message: "Vendor token missing vendor_id".to_string(),
                })?,
                store_id,
            },
            Role::User => Principal::User {
                user_id,
                email,
                store_id,
            },
        };

        Ok(principal)
    }

    pub fn role(&self) -> Role {
        match self {
            Principal::MasterAdmin { .. } => Role::MasterAdmin,
            Principal::StoreAdmin { .. } => Role::StoreAdmin,
            Principal::Admin { .. } => Role::Admin,
            Principal::Technician { .. } => Role::Technician,
            Principal::Vendor { .. } => Role::Vendor,
            Principal::User { .. } => Role::User,
        }
    }

    pub fn user_id(&self) -> Uuid {
        match self {
            Principal::MasterAdmin { user_id, .. }
            | Principal::StoreAdmin { user_id, .. }
            | Principal::Admin { user_id, .. }
            | Principal::Technician { user_id, .. }
            | Principal::Vendor { user_id, .. }
            | Principal::User { user_id, .. } => *user_id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Principal::MasterAdmin { email, .. }
            | Principal::StoreAdmin { email, .. }
            | Principal::Admin { email, .. }
            | Principal::Technician { email, .. }
            | Principal::Vendor { email, .. }
            | Principal::User { email, .. } => email,
        }
    }

    /// The store this account is assigned to, if any. MASTER_ADMIN has none.
    pub fn assigned_store_id(&self) -> Option<Uuid> {
        match self {
            Principal::MasterAdmin { .. } => None,
            Principal::StoreAdmin { store_id, .. }
            | Principal::Admin { store_id, .. }
            | Principal::Technician { store_id, .. }
            | Principal::Vendor { store_id, .. }
            | Principal::User { store_id, .. } => *store_id,
        }
    }

    /// The technician record behind this principal, when the role carries one
    pub fn technician_id(&self) -> Option<Uuid> {
        match self {
            Principal::Technician { technician_id, .. } => Some(*technician_id),
            _ => None,
        }
    }

    /// The vendor record behind this principal, when the role carries one
    pub fn vendor_id(&self) -> Option<Uuid> {
        match self {
            Principal::Vendor { vendor_id, .. } => Some(*vendor_id),
            _ => None,
        }
    }

    /// Resolve the store scope this principal queries under
    pub fn scope(&self) -> StoreScope {
        store_scope(self.role(), self.assigned_store_id())
    }

    pub fn is_admin_like(&self) -> bool {
        self.role().is_admin_like()
    }

    pub fn require_admin_like(&self) -> Result<()> {
        if self.is_admin_like() {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Administrator access required".to_string(),
            })
        }
    }

    pub fn require_can_create_work_orders(&self) -> Result<()> {
        if self.role().can_create_work_orders() {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Your role cannot create work orders".to_string(),
            })
        }
    }

    pub fn require_can_create_requests(&self) -> Result<()> {
        if self.role().can_create_requests() {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Your role cannot create maintenance requests".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: &str) -> JwtClaims {
        JwtClaims {
            sub: Uuid::new_v4().to_string(),
            email: "worker@example.com".to_string(),
            role: role.to_string(),
            store_id: Some(Uuid::new_v4()),
            technician_id: None,
            vendor_id: None,
            exp: 0,
            iat: 0,
        }
    }

    #[test]
    fn test_from_claims_master_admin() {
        let p = Principal::from_claims(&claims("MASTER_ADMIN")).unwrap();
        assert_eq!(p.role(), Role::MasterAdmin);
        // Master admins are never store-bound even if the claim names one
        assert_eq!(p.assigned_store_id(), None);
        assert_eq!(p.scope(), StoreScope::All);
    }

    #[test]
    fn test_from_claims_store_admin_scopes_to_store() {
        let c = claims("STORE_ADMIN");
        let p = Principal::from_claims(&c).unwrap();
        assert_eq!(p.scope(), StoreScope::Store(c.store_id.unwrap()));
    }

    #[test]
    fn test_technician_requires_technician_id() {
        let mut c = claims("TECHNICIAN");
        assert!(Principal::from_claims(&c).is_err());

        c.technician_id = Some(Uuid::new_v4());
        let p = Principal::from_claims(&c).unwrap();
        assert_eq!(p.technician_id(), c.technician_id);
        assert_eq!(p.vendor_id(), None);
    }

    #[test]
    fn test_vendor_requires_vendor_id() {
        let mut c = claims("VENDOR");
        assert!(Principal::from_claims(&c).is_err());

        c.vendor_id = Some(Uuid::new_v4());
        let p = Principal::from_claims(&c).unwrap();
        assert_eq!(p.vendor_id(), c.vendor_id);
        assert!(p.require_admin_like().is_err());
        assert!(p.require_can_create_requests().is_ok());
        assert!(p.require_can_create_work_orders().is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        assert!(Principal::from_claims(&claims("SUPERUSER")).is_err());
    }

    #[test]
    fn test_store_admin_without_store_is_denied_scope() {
        let mut c = claims("STORE_ADMIN");
        c.store_id = None;
        let p = Principal::from_claims(&c).unwrap();
        assert_eq!(p.scope(), StoreScope::Denied);
    }
}
