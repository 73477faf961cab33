//! Role model
//!
//! Pure classification over the role string carried by a user account.
//! Every predicate is total: an unknown or missing role answers `false`.

use serde::{Deserialize, Serialize};

/// Known account roles. `Admin` is a legacy alias kept for accounts created
/// before store-scoped administration existed; it behaves like `StoreAdmin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    MasterAdmin,
    StoreAdmin,
    Admin,
    Technician,
    Vendor,
    User,
}

impl Role {
    /// Parse a role string, case-insensitive. Unknown strings parse to `None`.
    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MASTER_ADMIN" => Some(Role::MasterAdmin),
            "STORE_ADMIN" => Some(Role::StoreAdmin),
            "ADMIN" => Some(Role::Admin),
            "TECHNICIAN" => Some(Role::Technician),
            "VENDOR" => Some(Role::Vendor),
            "USER" => Some(Role::User),
            _ => None,
        }
    }

    /// Canonical persisted spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::MasterAdmin => "MASTER_ADMIN",
            Role::StoreAdmin => "STORE_ADMIN",
            Role::Admin => "ADMIN",
            Role::Technician => "TECHNICIAN",
            Role::Vendor => "VENDOR",
            Role::User => "USER",
        }
    }

    /// MASTER_ADMIN, STORE_ADMIN, or the legacy ADMIN alias
    pub fn is_admin_like(&self) -> bool {
        matches!(self, Role::MasterAdmin | Role::StoreAdmin | Role::Admin)
    }

    /// Admin-like roles and USER may open work orders directly
    pub fn can_create_work_orders(&self) -> bool {
        self.is_admin_like() || matches!(self, Role::User)
    }

    /// Admin-like roles, USER, and VENDOR may file maintenance requests
    pub fn can_create_requests(&self) -> bool {
        self.is_admin_like() || matches!(self, Role::User | Role::Vendor)
    }
}

pub fn is_master_admin(role: &str) -> bool {
    Role::parse(role) == Some(Role::MasterAdmin)
}

pub fn is_store_admin(role: &str) -> bool {
    Role::parse(role) == Some(Role::StoreAdmin)
}

pub fn is_admin_like(role: &str) -> bool {
    Role::parse(role).is_some_and(|r| r.is_admin_like())
}

pub fn is_vendor(role: &str) -> bool {
    Role::parse(role) == Some(Role::Vendor)
}

pub fn is_user(role: &str) -> bool {
    Role::parse(role) == Some(Role::User)
}

pub fn can_create_work_orders(role: &str) -> bool {
    Role::parse(role).is_some_and(|r| r.can_create_work_orders())
}

pub fn can_create_requests(role: &str) -> bool {
    Role::parse(role).is_some_and(|r| r.can_create_requests())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Role::parse("master_admin"), Some(Role::MasterAdmin));
        assert_eq!(Role::parse("Store_Admin"), Some(Role::StoreAdmin));
        assert_eq!(Role::parse(" TECHNICIAN "), Some(Role::Technician));
        assert_eq!(Role::parse("supervisor"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_admin_like_includes_legacy_alias() {
        assert!(is_admin_like("MASTER_ADMIN"));
        assert!(is_admin_like("STORE_ADMIN"));
        assert!(is_admin_like("admin"));
        assert!(!is_admin_like("TECHNICIAN"));
        assert!(!is_admin_like("VENDOR"));
    }

    #[test]
    fn test_unknown_role_fails_every_predicate() {
        for check in [
            is_master_admin,
            is_store_admin,
            is_admin_like,
            is_vendor,
            is_user,
            can_create_work_orders,
            can_create_requests,
        ] {
            assert!(!check("SUPERUSER"));
            assert!(!check(""));
        }
    }

    #[test]
    fn test_work_order_creation_roles() {
        assert!(can_create_work_orders("MASTER_ADMIN"));
        assert!(can_create_work_orders("STORE_ADMIN"));
        assert!(can_create_work_orders("ADMIN"));
        assert!(can_create_work_orders("USER"));
        assert!(!can_create_work_orders("VENDOR"));
        assert!(!can_create_work_orders("TECHNICIAN"));
    }

    #[test]
    fn test_request_creation_roles() {
        assert!(can_create_requests("USER"));
        assert!(can_create_requests("VENDOR"));
        assert!(can_create_requests("STORE_ADMIN"));
        assert!(!can_create_requests("TECHNICIAN"));
    }
}
