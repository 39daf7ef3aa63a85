/// User model and database operations
///
/// Users are synced from the external identity provider. A user either belongs
/// to one home tenant or is platform-level (`tenant_id` is NULL).
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     external_auth_id VARCHAR(255) NOT NULL UNIQUE,
///     tenant_id UUID REFERENCES tenants(id) ON DELETE SET NULL,
///     first_name VARCHAR(255),
///     last_name VARCHAR(255),
///     role VARCHAR(32) NOT NULL DEFAULT 'user',
///     points BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Coarse account flag stored on the user row
///
/// This is not the permission model; fine-grained access comes from
/// tenant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    User,
    Admin,
    SuperAdmin,
}

impl UserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserKind::User => "user",
            UserKind::Admin => "admin",
            UserKind::SuperAdmin => "super_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserKind::User),
            "admin" => Some(UserKind::Admin),
            "super_admin" => Some(UserKind::SuperAdmin),
            _ => None,
        }
    }
}

/// User row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Subject ID at the identity provider
    pub external_auth_id: String,

    /// Home tenant, `None` for platform-level accounts
    pub tenant_id: Option<Uuid>,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Raw coarse role; see [`User::kind`]
    pub role: String,

    /// Reward point balance
    pub points: i64,

    pub created_at: DateTime<Utc>,
}

impl User {
    /// Parsed coarse role, unknown values degrade to `User`
    pub fn kind(&self) -> UserKind {
        UserKind::parse(&self.role).unwrap_or(UserKind::User)
    }

    /// Finds a user by internal ID
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, external_auth_id, tenant_id, first_name, last_name, role, points, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
