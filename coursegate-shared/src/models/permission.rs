/// Permission catalog rows and tenant roles
///
/// Permissions are global; tenant roles are scoped to exactly one tenant and
/// reference permissions through `tenant_role_permissions`.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE permissions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL UNIQUE,
///     display_name VARCHAR(255) NOT NULL,
///     category VARCHAR(64) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     is_deprecated BOOLEAN NOT NULL DEFAULT FALSE
/// );
///
/// CREATE TABLE tenant_roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     role_alias VARCHAR(100) NOT NULL,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (tenant_id, role_alias),
///     UNIQUE (id, tenant_id)
/// );
///
/// CREATE TABLE tenant_role_permissions (
///     tenant_role_id UUID NOT NULL REFERENCES tenant_roles(id) ON DELETE CASCADE,
///     permission_id UUID NOT NULL REFERENCES permissions(id) ON DELETE CASCADE,
///     PRIMARY KEY (tenant_role_id, permission_id)
/// );
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::access::catalog::PermissionDef;

/// A named capability such as `users.create`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub is_active: bool,
    pub is_deprecated: bool,
}

impl Permission {
    /// Whether this permission may contribute to an effective set
    pub fn is_effective(&self) -> bool {
        self.is_active && !self.is_deprecated
    }

    /// Inserts catalog entries that are missing and refreshes labels/categories
    /// of existing ones. Activation flags are left untouched.
    ///
    /// Returns the number of rows inserted or updated.
    pub async fn upsert_catalog(pool: &PgPool, defs: &[PermissionDef]) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut affected = 0;

        for def in defs {
            let result = sqlx::query(
                r#"
                INSERT INTO permissions (name, display_name, category)
                VALUES ($1, $2, $3)
                ON CONFLICT (name) DO UPDATE
                SET display_name = EXCLUDED.display_name,
                    category = EXCLUDED.category
                WHERE permissions.display_name IS DISTINCT FROM EXCLUDED.display_name
                   OR permissions.category IS DISTINCT FROM EXCLUDED.category
                "#,
            )
            .bind(def.name)
            .bind(def.label)
            .bind(def.category)
            .execute(&mut *tx)
            .await?;

            affected += result.rows_affected();
        }

        tx.commit().await?;
        Ok(affected)
    }
}

/// A role definition owned by one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TenantRole {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub role_alias: String,
    pub is_active: bool,
}

impl TenantRole {
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TenantRole>(
            r#"
            SELECT id, tenant_id, role_alias, is_active
            FROM tenant_roles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Like [`TenantRole::find_by_id`], holding a share lock on the row
    ///
    /// Inside a transaction this keeps the role's `is_active` and `tenant_id`
    /// fixed until commit, so an assignment validated against it stays valid.
    pub async fn find_for_assignment<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, TenantRole>(
            r#"
            SELECT id, tenant_id, role_alias, is_active
            FROM tenant_roles
            WHERE id = $1
            FOR SHARE
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
