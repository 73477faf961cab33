//! Outbound mail abstraction
//!
//! Notifications are best-effort: callers log a warning on failure and never
//! fail the triggering request because mail did not go out.

use crate::config::MailConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// An outbound notification message
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Trait for mail delivery
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a single message
    async fn send(&self, message: &MailMessage) -> Result<()>;

    /// Get the provider name
    fn provider_name(&self) -> &str;
}

/// Mail client for HTTP-based providers (Resend-style JSON API)
pub struct HttpMailer {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    from_address: String,
}

#[derive(Serialize)]
struct HttpMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(
        api_base: String,
        api_key: String,
        from_address: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create mail HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_base,
            api_key,
            from_address,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        let url = format!("{}/emails", self.api_base.trim_end_matches('/'));

        let request = HttpMailRequest {
            from: &self.from_address,
            to: &message.to,
            subject: &message.subject,
            text: &message.body,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Mail {
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Mail {
                message: format!("Provider error {}: {}", status, body),
            });
        }

        Ok(())
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

/// No-op mailer for local development and tests. Logs instead of sending.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, message: &MailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Mail suppressed (noop provider)"
        );
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "noop"
    }
}

/// Create a mailer based on configuration
pub fn create_mailer(config: &MailConfig) -> Arc<dyn Mailer> {
    match config.provider.as_str() {
        "http" => match (&config.api_base, &config.api_key) {
            (Some(api_base), Some(api_key)) => {
                match HttpMailer::new(
                    api_base.clone(),
                    api_key.clone(),
                    config.from_address.clone(),
                    config.timeout_secs,
                ) {
                    Ok(mailer) => Arc::new(mailer),
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to build HTTP mailer, using noop");
                        Arc::new(NoopMailer)
                    }
                }
            }
            _ => {
                tracing::warn!("HTTP mail provider missing api_base/api_key, using noop");
                Arc::new(NoopMailer)
            }
        },
        "noop" => Arc::new(NoopMailer),
        other => {
            tracing::warn!(provider = other, "Unknown mail provider, using noop");
            Arc::new(NoopMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_mailer_always_succeeds() {
        let mailer = NoopMailer;
        let message = MailMessage {
            to: "admin@example.com".to_string(),
            subject: "New maintenance request".to_string(),
            body: "Request #42 was submitted.".to_string(),
        };
        assert!(mailer.send(&message).await.is_ok());
        assert_eq!(mailer.provider_name(), "noop");
    }

    #[test]
    fn test_factory_falls_back_to_noop() {
        let config = MailConfig {
            provider: "http".to_string(),
            api_base: None,
            api_key: None,
            from_address: "noreply@example.com".to_string(),
            timeout_secs: 10,
        };
        let mailer = create_mailer(&config);
        assert_eq!(mailer.provider_name(), "noop");
    }
}
