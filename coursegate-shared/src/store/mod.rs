/// Persistence seams
///
/// Handlers and the resolver only see these traits; the binary wires in
/// [`postgres::PgStore`], tests use [`memory::InMemoryStore`].
///
/// # Modules
///
/// - [`postgres`]: sqlx-backed implementation
/// - [`memory`]: lock-protected maps, for tests and local runs

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::content::filter::Predicate;
use crate::models::content::{ContentItem, ContentKind};
use crate::models::permission::TenantRole;
use crate::models::tenant::Tenant;
use crate::models::user::User;
use crate::models::user_role::{AssignRole, AssignmentOutcome, RoleAssignment};

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    /// A compare-and-swap precondition no longer holds
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The write would break a tenant invariant
    #[error("Invalid assignment: {0}")]
    InvalidAssignment(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Users, tenants, roles and their permissions
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Every role assignment of `user_id`, optionally only in `tenant_id`
    ///
    /// Returned unfiltered: inactive roles and permissions are included.
    async fn find_user_role_assignments(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<RoleAssignment>, StoreError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError>;

    async fn find_tenant_role(&self, role_id: Uuid) -> Result<Option<TenantRole>, StoreError>;

    /// Creates or replaces the user's role in a tenant
    ///
    /// With `expected_role_id` set this is a compare-and-swap and fails with
    /// [`StoreError::Conflict`] when the current role differs.
    async fn assign_role(&self, data: AssignRole) -> Result<AssignmentOutcome, StoreError>;

    /// Cheap liveness check
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Tenant-scoped content listings
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Items of `kind` matching `predicate`, newest first
    async fn find_content(
        &self,
        kind: ContentKind,
        predicate: &Predicate,
    ) -> Result<Vec<ContentItem>, StoreError>;
}

/// Checks an assignment against the rows it references
///
/// Shared by every [`PermissionStore`] so they reject the same writes.
pub fn validate_assignment(
    data: &AssignRole,
    user: Option<&User>,
    tenant: Option<&Tenant>,
    role: Option<&TenantRole>,
) -> Result<(), StoreError> {
    if user.is_none() {
        return Err(StoreError::NotFound(format!("User {}", data.user_id)));
    }

    if tenant.is_none() {
        return Err(StoreError::NotFound(format!("Tenant {}", data.tenant_id)));
    }

    let role = role.ok_or_else(|| StoreError::NotFound(format!("Role {}", data.tenant_role_id)))?;

    if role.tenant_id != data.tenant_id {
        return Err(StoreError::InvalidAssignment(format!(
            "role {} belongs to another tenant",
            role.id
        )));
    }

    if !role.is_active {
        return Err(StoreError::InvalidAssignment(format!(
            "role {} is inactive",
            role.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fixtures() -> (AssignRole, User, Tenant, TenantRole) {
        let tenant_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();

        let data = AssignRole {
            user_id,
            tenant_id,
            tenant_role_id: role_id,
            assigned_by: None,
            expected_role_id: None,
        };
        let user = User {
            id: user_id,
            external_auth_id: "ext_1".to_string(),
            tenant_id: Some(tenant_id),
            first_name: None,
            last_name: None,
            role: "user".to_string(),
            points: 0,
            created_at: Utc::now(),
        };
        let tenant = Tenant {
            id: tenant_id,
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            subscription_tier: "free".to_string(),
            base_role_slots: 3,
            purchased_role_slots: 0,
            max_role_slots: 10,
            default_role_id: None,
            created_at: Utc::now(),
        };
        let role = TenantRole {
            id: role_id,
            tenant_id,
            role_alias: "teacher".to_string(),
            is_active: true,
        };

        (data, user, tenant, role)
    }

    #[test]
    fn test_valid_assignment() {
        let (data, user, tenant, role) = fixtures();
        assert!(validate_assignment(&data, Some(&user), Some(&tenant), Some(&role)).is_ok());
    }

    #[test]
    fn test_missing_rows_are_not_found() {
        let (data, user, tenant, role) = fixtures();

        assert!(matches!(
            validate_assignment(&data, None, Some(&tenant), Some(&role)),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            validate_assignment(&data, Some(&user), None, Some(&role)),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            validate_assignment(&data, Some(&user), Some(&tenant), None),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_cross_tenant_role_rejected() {
        let (data, user, tenant, mut role) = fixtures();
        role.tenant_id = Uuid::new_v4();

        assert!(matches!(
            validate_assignment(&data, Some(&user), Some(&tenant), Some(&role)),
            Err(StoreError::InvalidAssignment(_))
        ));
    }

    #[test]
    fn test_inactive_role_rejected() {
        let (data, user, tenant, mut role) = fixtures();
        role.is_active = false;

        assert!(matches!(
            validate_assignment(&data, Some(&user), Some(&tenant), Some(&role)),
            Err(StoreError::InvalidAssignment(_))
        ));
    }
}
