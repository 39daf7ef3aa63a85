/// User role assignments and database operations
///
/// A `UserRole` row binds a user to one tenant role inside one tenant. The
/// `(user_id, tenant_id)` pair is unique, and the composite foreign key on
/// `(tenant_role_id, tenant_id)` stops a role from another tenant being
/// attached.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE user_roles (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     tenant_id UUID NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
///     tenant_role_id UUID NOT NULL,
///     assigned_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     assigned_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     UNIQUE (user_id, tenant_id),
///     FOREIGN KEY (tenant_role_id, tenant_id)
///         REFERENCES tenant_roles(id, tenant_id) ON DELETE CASCADE
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::permission::{Permission, TenantRole};
use super::tenant::TenantSummary;

/// Assignment of a tenant role to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRole {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_role_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub assigned_by: Option<Uuid>,
}

/// A user role together with everything the resolver needs to judge it
///
/// `permissions` is the raw join result: inactive and deprecated rows are
/// still present and are filtered by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleAssignment {
    pub user_role: UserRole,
    pub tenant: TenantSummary,
    pub role: TenantRole,
    pub permissions: Vec<Permission>,
}

/// Input for assigning a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRole {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub tenant_role_id: Uuid,
    pub assigned_by: Option<Uuid>,

    /// When set, the write only succeeds if the user's current role in the
    /// tenant is exactly this one.
    pub expected_role_id: Option<Uuid>,
}

/// Result of a role assignment write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignmentOutcome {
    Created(UserRole),
    Updated(UserRole),
}

impl AssignmentOutcome {
    pub fn user_role(&self) -> &UserRole {
        match self {
            AssignmentOutcome::Created(r) | AssignmentOutcome::Updated(r) => r,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentOutcome::Created(_) => "created",
            AssignmentOutcome::Updated(_) => "updated",
        }
    }
}

/// Flat row produced by the assignment join
#[derive(Debug, sqlx::FromRow)]
struct AssignmentRow {
    user_role_id: Uuid,
    user_id: Uuid,
    tenant_id: Uuid,
    tenant_role_id: Uuid,
    assigned_at: DateTime<Utc>,
    assigned_by: Option<Uuid>,
    tenant_name: String,
    tenant_slug: String,
    role_tenant_id: Uuid,
    role_alias: String,
    role_is_active: bool,
    permission_id: Option<Uuid>,
    permission_name: Option<String>,
    permission_display_name: Option<String>,
    permission_category: Option<String>,
    permission_is_active: Option<bool>,
    permission_is_deprecated: Option<bool>,
}

impl AssignmentRow {
    fn permission(&self) -> Option<Permission> {
        Some(Permission {
            id: self.permission_id?,
            name: self.permission_name.clone()?,
            display_name: self.permission_display_name.clone()?,
            category: self.permission_category.clone()?,
            is_active: self.permission_is_active?,
            is_deprecated: self.permission_is_deprecated?,
        })
    }

    fn into_assignment(self) -> RoleAssignment {
        let permissions = self.permission().into_iter().collect();
        RoleAssignment {
            user_role: UserRole {
                id: self.user_role_id,
                user_id: self.user_id,
                tenant_id: self.tenant_id,
                tenant_role_id: self.tenant_role_id,
                assigned_at: self.assigned_at,
                assigned_by: self.assigned_by,
            },
            tenant: TenantSummary {
                id: self.tenant_id,
                name: self.tenant_name,
                slug: self.tenant_slug,
            },
            role: TenantRole {
                id: self.tenant_role_id,
                tenant_id: self.role_tenant_id,
                role_alias: self.role_alias,
                is_active: self.role_is_active,
            },
            permissions,
        }
    }
}

/// Folds join rows (ordered by user role) into one assignment per user role
fn fold_rows(rows: Vec<AssignmentRow>) -> Vec<RoleAssignment> {
    let mut assignments: Vec<RoleAssignment> = Vec::new();

    for row in rows {
        match assignments.last_mut() {
            Some(current) if current.user_role.id == row.user_role_id => {
                if let Some(permission) = row.permission() {
                    current.permissions.push(permission);
                }
            }
            _ => assignments.push(row.into_assignment()),
        }
    }

    assignments
}

impl UserRole {
    /// Loads every role assignment of a user, optionally limited to one tenant
    ///
    /// Nothing is filtered on activity here; that is the resolver's job.
    pub async fn find_assignments(
        pool: &PgPool,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<RoleAssignment>, sqlx::Error> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT ur.id AS user_role_id, ur.user_id, ur.tenant_id, ur.tenant_role_id,
                   ur.assigned_at, ur.assigned_by,
                   t.name AS tenant_name, t.slug AS tenant_slug,
                   tr.tenant_id AS role_tenant_id, tr.role_alias, tr.is_active AS role_is_active,
                   p.id AS permission_id, p.name AS permission_name,
                   p.display_name AS permission_display_name, p.category AS permission_category,
                   p.is_active AS permission_is_active, p.is_deprecated AS permission_is_deprecated
            FROM user_roles ur
            JOIN tenants t ON t.id = ur.tenant_id
            JOIN tenant_roles tr ON tr.id = ur.tenant_role_id
            LEFT JOIN tenant_role_permissions trp ON trp.tenant_role_id = tr.id
            LEFT JOIN permissions p ON p.id = trp.permission_id
            WHERE ur.user_id = $1
              AND ($2::uuid IS NULL OR ur.tenant_id = $2)
            ORDER BY ur.assigned_at ASC, ur.id ASC, p.name ASC
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(fold_rows(rows))
    }

    /// Creates the assignment or replaces the role of the existing one
    ///
    /// Concurrent writers on the same `(user_id, tenant_id)` resolve as
    /// last-write-wins. Use [`UserRole::swap_role`] to guard against that.
    pub async fn upsert<'e, E>(
        executor: E,
        data: &AssignRole,
    ) -> Result<AssignmentOutcome, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO user_roles (user_id, tenant_id, tenant_role_id, assigned_by)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, tenant_id) DO UPDATE
            SET tenant_role_id = EXCLUDED.tenant_role_id,
                assigned_by = EXCLUDED.assigned_by,
                assigned_at = NOW()
            RETURNING id, user_id, tenant_id, tenant_role_id, assigned_at, assigned_by,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(data.user_id)
        .bind(data.tenant_id)
        .bind(data.tenant_role_id)
        .bind(data.assigned_by)
        .fetch_one(executor)
        .await?;
        let (role, inserted) = row.split();

        Ok(if inserted {
            AssignmentOutcome::Created(role)
        } else {
            AssignmentOutcome::Updated(role)
        })
    }

    /// Compare-and-swap update of an existing assignment
    ///
    /// Returns `None` when the user has no assignment in the tenant or it no
    /// longer points at `expected_role_id`.
    pub async fn swap_role<'e, E>(
        executor: E,
        data: &AssignRole,
        expected_role_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserRole>(
            r#"
            UPDATE user_roles
            SET tenant_role_id = $3,
                assigned_by = $4,
                assigned_at = NOW()
            WHERE user_id = $1 AND tenant_id = $2 AND tenant_role_id = $5
            RETURNING id, user_id, tenant_id, tenant_role_id, assigned_at, assigned_by
            "#,
        )
        .bind(data.user_id)
        .bind(data.tenant_id)
        .bind(data.tenant_role_id)
        .bind(data.assigned_by)
        .bind(expected_role_id)
        .fetch_optional(executor)
        .await
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UpsertRow {
    id: Uuid,
    user_id: Uuid,
    tenant_id: Uuid,
    tenant_role_id: Uuid,
    assigned_at: DateTime<Utc>,
    assigned_by: Option<Uuid>,
    inserted: bool,
}

impl UpsertRow {
    fn split(self) -> (UserRole, bool) {
        (
            UserRole {
                id: self.id,
                user_id: self.user_id,
                tenant_id: self.tenant_id,
                tenant_role_id: self.tenant_role_id,
                assigned_at: self.assigned_at,
                assigned_by: self.assigned_by,
            },
            self.inserted,
        )
    }
}
