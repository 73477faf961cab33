//! StoreKeep Common Library
//!
//! Shared code for the StoreKeep CMMS services including:
//! - Database models and repository patterns
//! - Error types and handling
//! - Configuration management
//! - Authentication, role model, and store scoping
//! - Work order lifecycle rules
//! - Mail client abstraction
//! - Metrics and observability

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod mailer;
pub mod metrics;
pub mod workorders;

// Re-export commonly used types
pub use auth::{Principal, Role, StoreScope};
pub use config::AppConfig;
pub use db::Repository;
pub use errors::{AppError, Result};
pub use mailer::Mailer;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Title prefix applied to work orders spawned by PM schedules
pub const PM_TITLE_PREFIX: &str = "PM: ";
