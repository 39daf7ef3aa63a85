//! Postgres-backed stores.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{validate_assignment, ContentStore, PermissionStore, StoreError};
use crate::access::catalog;
use crate::content::filter::Predicate;
use crate::db::pool::health_check;
use crate::models::content::{ContentItem, ContentKind};
use crate::models::permission::{Permission, TenantRole};
use crate::models::tenant::Tenant;
use crate::models::user::User;
use crate::models::user_role::{AssignRole, AssignmentOutcome, RoleAssignment, UserRole};

/// Store over a sqlx connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upserts the static permission catalog into `permissions`
    ///
    /// Labels and categories are refreshed; activity flags are left to admins.
    pub async fn sync_catalog(&self) -> Result<u64, StoreError> {
        let affected = Permission::upsert_catalog(&self.pool, catalog::catalog()).await?;
        info!(
            permissions = catalog::catalog().len(),
            rows_affected = affected,
            "Permission catalog synced"
        );
        Ok(affected)
    }
}

#[async_trait]
impl PermissionStore for PgStore {
    async fn find_user_role_assignments(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<RoleAssignment>, StoreError> {
        Ok(UserRole::find_assignments(&self.pool, user_id, tenant_id).await?)
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, user_id).await?)
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError> {
        Ok(Tenant::find_by_id(&self.pool, tenant_id).await?)
    }

    async fn find_tenant_role(&self, role_id: Uuid) -> Result<Option<TenantRole>, StoreError> {
        Ok(TenantRole::find_by_id(&self.pool, role_id).await?)
    }

    async fn assign_role(&self, data: AssignRole) -> Result<AssignmentOutcome, StoreError> {
        let mut tx = self.pool.begin().await?;

        let user = User::find_by_id(&mut *tx, data.user_id).await?;
        let tenant = Tenant::find_by_id(&mut *tx, data.tenant_id).await?;
        let role = TenantRole::find_for_assignment(&mut *tx, data.tenant_role_id).await?;
        validate_assignment(&data, user.as_ref(), tenant.as_ref(), role.as_ref())?;

        let outcome = match data.expected_role_id {
            Some(expected) => {
                let updated = UserRole::swap_role(&mut *tx, &data, expected)
                    .await?
                    .ok_or_else(|| {
                        StoreError::Conflict(format!(
                            "user {} no longer holds role {} in tenant {}",
                            data.user_id, expected, data.tenant_id
                        ))
                    })?;
                debug!(user_role_id = %updated.id, "Role swapped");
                AssignmentOutcome::Updated(updated)
            }
            None => UserRole::upsert(&mut *tx, &data).await?,
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }
}

#[async_trait]
impl ContentStore for PgStore {
    async fn find_content(
        &self,
        kind: ContentKind,
        predicate: &Predicate,
    ) -> Result<Vec<ContentItem>, StoreError> {
        Ok(ContentItem::find(&self.pool, kind, predicate).await?)
    }
}
