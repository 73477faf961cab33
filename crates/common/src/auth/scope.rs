//! Store-scoping resolver
//!
//! Narrows every list/detail/mutate query to the stores the acting principal
//! may touch. MASTER_ADMIN sees all stores; everyone else sees exactly their
//! own. A principal with no assigned store is denied rather than unscoped --
//! scoping fails closed, never open.

use super::roles::Role;
use crate::errors::{AppError, Result};
use uuid::Uuid;

/// The store filter applied to a query on behalf of a principal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    /// Unrestricted: every store's rows are visible
    All,
    /// Restricted to a single store
    Store(Uuid),
    /// No assigned store: matches nothing
    Denied,
}

/// True only for MASTER_ADMIN
pub fn can_see_all_stores(role: Role) -> bool {
    role == Role::MasterAdmin
}

/// Resolve the scope for a role and its assigned store.
pub fn store_scope(role: Role, user_store_id: Option<Uuid>) -> StoreScope {
    if can_see_all_stores(role) {
        return StoreScope::All;
    }
    match user_store_id {
        Some(store_id) => StoreScope::Store(store_id),
        None => StoreScope::Denied,
    }
}

impl StoreScope {
    /// Narrow an unrestricted scope with an explicit `store_id` query
    /// parameter. Restricted scopes ignore the parameter: a store-bound
    /// principal cannot widen or sidestep their own scope.
    pub fn narrowed(self, explicit: Option<Uuid>) -> StoreScope {
        match (self, explicit) {
            (StoreScope::All, Some(store_id)) => StoreScope::Store(store_id),
            (scope, _) => scope,
        }
    }

    /// Whether a record with the given `store_id` is visible in this scope.
    /// Records without a store are only visible to the unrestricted scope.
    pub fn allows(&self, record_store_id: Option<Uuid>) -> bool {
        match self {
            StoreScope::All => true,
            StoreScope::Store(store_id) => record_store_id == Some(*store_id),
            StoreScope::Denied => false,
        }
    }

    /// Require that the record's store is within scope
    pub fn check(&self, record_store_id: Option<Uuid>) -> Result<()> {
        if self.allows(record_store_id) {
            Ok(())
        } else {
            Err(AppError::Forbidden {
                message: "Record is outside your store scope".to_string(),
            })
        }
    }

    /// Resolve the store for a write that may also target the global
    /// directory (no store). Unrestricted callers choose the store or omit
    /// it; scoped callers always write to their own store; a denied
    /// principal cannot write anywhere.
    pub fn optional_target_store(&self, requested: Option<Uuid>) -> Result<Option<Uuid>> {
        match self {
            StoreScope::All => Ok(requested),
            StoreScope::Store(store_id) => Ok(Some(*store_id)),
            StoreScope::Denied => Err(AppError::Forbidden {
                message: "No store assigned to your account".to_string(),
            }),
        }
    }

    /// Resolve the store a mutation should be written under. Unrestricted
    /// callers must name a store explicitly; scoped callers always write to
    /// their own store regardless of what the payload claims.
    pub fn target_store(&self, requested: Option<Uuid>) -> Result<Uuid> {
        match self {
            StoreScope::All => requested.ok_or_else(|| AppError::MissingField {
                field: "store_id".to_string(),
            }),
            StoreScope::Store(store_id) => Ok(*store_id),
            StoreScope::Denied => Err(AppError::Forbidden {
                message: "No store assigned to your account".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_master_admin_sees_all() {
        assert!(can_see_all_stores(Role::MasterAdmin));
        assert_eq!(store_scope(Role::MasterAdmin, None), StoreScope::All);
        assert_eq!(
            store_scope(Role::MasterAdmin, Some(Uuid::new_v4())),
            StoreScope::All
        );
    }

    #[test]
    fn test_scoped_roles_resolve_to_own_store() {
        let store = Uuid::new_v4();
        for role in [
            Role::StoreAdmin,
            Role::Admin,
            Role::Technician,
            Role::Vendor,
            Role::User,
        ] {
            assert!(!can_see_all_stores(role));
            assert_eq!(store_scope(role, Some(store)), StoreScope::Store(store));
        }
    }

    #[test]
    fn test_missing_store_fails_closed() {
        // A STORE_ADMIN with no assigned store must see nothing, never everything
        assert_eq!(store_scope(Role::StoreAdmin, None), StoreScope::Denied);
        assert!(!StoreScope::Denied.allows(Some(Uuid::new_v4())));
        assert!(!StoreScope::Denied.allows(None));
    }

    #[test]
    fn test_narrowing_only_applies_to_all() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(StoreScope::All.narrowed(Some(a)), StoreScope::Store(a));
        assert_eq!(StoreScope::All.narrowed(None), StoreScope::All);
        // A scoped principal cannot hop stores via the query parameter
        assert_eq!(
            StoreScope::Store(a).narrowed(Some(b)),
            StoreScope::Store(a)
        );
        assert_eq!(StoreScope::Denied.narrowed(Some(b)), StoreScope::Denied);
    }

    #[test]
    fn test_allows() {
        let store = Uuid::new_v4();
        assert!(StoreScope::All.allows(None));
        assert!(StoreScope::All.allows(Some(store)));
        assert!(StoreScope::Store(store).allows(Some(store)));
        assert!(!StoreScope::Store(store).allows(Some(Uuid::new_v4())));
        assert!(!StoreScope::Store(store).allows(None));
    }

    #[test]
    fn test_target_store() {
        let store = Uuid::new_v4();
        let other = Uuid::new_v4();

        assert_eq!(StoreScope::All.target_store(Some(store)).unwrap(), store);
        assert!(StoreScope::All.target_store(None).is_err());

        // Scoped writes always land in the principal's own store
        assert_eq!(
            StoreScope::Store(store).target_store(Some(other)).unwrap(),
            store
        );
        assert!(StoreScope::Denied.target_store(Some(store)).is_err());
    }

    #[test]
    fn test_optional_target_store_fails_closed() {
        let store = Uuid::new_v4();
        let requested = Uuid::new_v4();

        assert_eq!(
            StoreScope::All.optional_target_store(Some(requested)).unwrap(),
            Some(requested)
        );
        assert_eq!(StoreScope::All.optional_target_store(None).unwrap(), None);
        assert_eq!(
            StoreScope::Store(store)
                .optional_target_store(Some(requested))
                .unwrap(),
            Some(store)
        );

        // A STORE_ADMIN with no assigned store must not be able to write a
        // directory entry into a caller-chosen store, nor into the global
        // directory
        let scope = store_scope(Role::StoreAdmin, None);
        assert_eq!(scope, StoreScope::Denied);
        assert!(scope.optional_target_store(Some(requested)).is_err());
        assert!(scope.optional_target_store(None).is_err());
    }
}
