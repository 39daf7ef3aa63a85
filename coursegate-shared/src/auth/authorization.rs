/// Server-side permission gates
///
/// Built on the same resolver that answers `/v1/user-permissions`, so a
/// handler refuses exactly what a client-side check would report as missing.
/// Resolution failures are returned as errors and never treated as a grant.
///
/// # Example
///
/// ```no_run
/// use coursegate_shared::access::catalog::ROLES_ASSIGN;
/// use coursegate_shared::access::resolver::PermissionResolver;
/// use coursegate_shared::auth::authorization::require_permission;
/// use coursegate_shared::auth::middleware::AuthContext;
/// use uuid::Uuid;
///
/// async fn guard(
///     resolver: &PermissionResolver,
///     auth: &AuthContext,
///     tenant_id: Uuid,
/// ) -> Result<(), Box<dyn std::error::Error>> {
///     require_permission(resolver, auth, tenant_id, ROLES_ASSIGN).await?;
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::middleware::AuthContext;
use crate::access::resolver::PermissionResolver;
use crate::store::StoreError;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller lacks the permission in the tenant
    #[error("Missing permission {permission} in tenant {tenant_id}")]
    MissingPermission { permission: String, tenant_id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Requires `permission` to be granted to the caller inside `tenant_id`
///
/// Holding the permission in some other tenant does not count.
pub async fn require_permission(
    resolver: &PermissionResolver,
    auth: &AuthContext,
    tenant_id: Uuid,
    permission: &str,
) -> Result<(), AuthzError> {
    let effective = resolver
        .effective_permissions(auth.user_id, Some(tenant_id))
        .await?;

    if !effective.has_in_tenant(tenant_id, permission) {
        tracing::debug!(
            user_id = %auth.user_id,
            tenant_id = %tenant_id,
            permission,
            "Permission denied"
        );
        return Err(AuthzError::MissingPermission {
            permission: permission.to_string(),
            tenant_id,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;

    use crate::access::catalog::ROLES_ASSIGN;
    use crate::models::permission::{Permission, TenantRole};
    use crate::models::tenant::Tenant;
    use crate::models::user_role::UserRole;
    use crate::store::memory::InMemoryStore;

    async fn seeded(role_tenant: Uuid, assignment_tenant: Uuid) -> (Arc<InMemoryStore>, Uuid) {
        let store = Arc::new(InMemoryStore::new());
        let user_id = Uuid::new_v4();
        let role_id = Uuid::new_v4();
        let permission_id = Uuid::new_v4();

        for id in [role_tenant, assignment_tenant] {
            store
                .insert_tenant(Tenant {
                    id,
                    name: "Acme".to_string(),
                    slug: id.to_string(),
                    subscription_tier: "pro".to_string(),
                    base_role_slots: 3,
                    purchased_role_slots: 0,
                    max_role_slots: 10,
                    default_role_id: None,
                    created_at: Utc::now(),
                })
                .await;
        }
        store
            .insert_role(TenantRole {
                id: role_id,
                tenant_id: role_tenant,
                role_alias: "admin".to_string(),
                is_active: true,
            })
            .await;
        store
            .insert_permission(Permission {
                id: permission_id,
                name: ROLES_ASSIGN.to_string(),
                display_name: "Assign roles".to_string(),
                category: "roles".to_string(),
                is_active: true,
                is_deprecated: false,
            })
            .await;
        store.grant(role_id, permission_id).await;
        store
            .insert_user_role(UserRole {
                id: Uuid::new_v4(),
                user_id,
                tenant_id: assignment_tenant,
                tenant_role_id: role_id,
                assigned_at: Utc::now(),
                assigned_by: None,
            })
            .await;

        (store, user_id)
    }

    #[tokio::test]
    async fn test_granted_in_own_tenant() {
        let tenant_id = Uuid::new_v4();
        let (store, user_id) = seeded(tenant_id, tenant_id).await;
        let resolver = PermissionResolver::new(store);
        let auth = AuthContext { user_id, tenant_id: Some(tenant_id) };

        assert!(require_permission(&resolver, &auth, tenant_id, ROLES_ASSIGN)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_denied_in_other_tenant() {
        let tenant_id = Uuid::new_v4();
        let (store, user_id) = seeded(tenant_id, tenant_id).await;
        let resolver = PermissionResolver::new(store);
        let auth = AuthContext { user_id, tenant_id: Some(tenant_id) };

        let result = require_permission(&resolver, &auth, Uuid::new_v4(), ROLES_ASSIGN).await;
        assert!(matches!(result, Err(AuthzError::MissingPermission { .. })));
    }

    #[tokio::test]
    async fn test_cross_tenant_row_grants_nothing() {
        let assignment_tenant = Uuid::new_v4();
        let (store, user_id) = seeded(Uuid::new_v4(), assignment_tenant).await;
        let resolver = PermissionResolver::new(store);
        let auth = AuthContext { user_id, tenant_id: None };

        let result = require_permission(&resolver, &auth, assignment_tenant, ROLES_ASSIGN).await;
        assert!(matches!(result, Err(AuthzError::MissingPermission { .. })));
    }
}
