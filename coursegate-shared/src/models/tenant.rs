/// Tenant model and database operations
///
/// A tenant is an isolated organization/workspace. Users, tenant roles and
/// tenant-owned content all hang off a tenant row.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     slug VARCHAR(100) NOT NULL UNIQUE,
///     subscription_tier VARCHAR(32) NOT NULL DEFAULT 'free',
///     base_role_slots INTEGER NOT NULL DEFAULT 3,
///     purchased_role_slots INTEGER NOT NULL DEFAULT 0,
///     max_role_slots INTEGER NOT NULL DEFAULT 3,
///     default_role_id UUID,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use coursegate_shared::models::tenant::{Tenant, SubscriptionTier};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, tenant_id: Uuid) -> Result<(), sqlx::Error> {
/// if let Some(tenant) = Tenant::find_by_id(&pool, tenant_id).await? {
///     println!("{} is on {:?}", tenant.slug, tenant.tier());
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Subscription tiers
///
/// Older tenants may still carry the legacy `professional` and `trial`
/// values; they parse to `Pro` and `Free` respectively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[serde(alias = "trial")]
    Free,
    Starter,
    #[serde(alias = "professional")]
    Pro,
    Enterprise,
}

impl SubscriptionTier {
    /// Canonical storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Starter => "starter",
            SubscriptionTier::Pro => "pro",
            SubscriptionTier::Enterprise => "enterprise",
        }
    }

    /// Parses a stored tier, accepting legacy aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" | "trial" => Some(SubscriptionTier::Free),
            "starter" => Some(SubscriptionTier::Starter),
            "pro" | "professional" => Some(SubscriptionTier::Pro),
            "enterprise" => Some(SubscriptionTier::Enterprise),
            _ => None,
        }
    }
}

/// Tenant row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,

    pub name: String,

    /// URL-safe unique identifier
    pub slug: String,

    /// Raw tier as stored; use [`Tenant::tier`] for the parsed value.
    /// Serialized under its canonical name.
    #[serde(serialize_with = "serialize_canonical_tier")]
    pub subscription_tier: String,

    /// Role slots included with the tier
    pub base_role_slots: i32,

    /// Extra role slots bought on top of the tier
    pub purchased_role_slots: i32,

    /// Hard ceiling on role slots
    pub max_role_slots: i32,

    /// Role handed to new members when none is specified
    pub default_role_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

fn serialize_canonical_tier<S>(raw: &str, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match SubscriptionTier::parse(raw) {
        Some(tier) => tier.serialize(serializer),
        None => serializer.serialize_str(raw),
    }
}

/// The `{id, name, slug}` projection embedded in permission responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl Tenant {
    /// Parsed subscription tier, `None` for unrecognized values
    pub fn tier(&self) -> Option<SubscriptionTier> {
        SubscriptionTier::parse(&self.subscription_tier)
    }

    /// Number of custom roles the tenant may currently hold
    pub fn available_role_slots(&self) -> i32 {
        let total = self.base_role_slots.saturating_add(self.purchased_role_slots);
        total.min(self.max_role_slots).max(0)
    }

    pub fn summary(&self) -> TenantSummary {
        TenantSummary {
            id: self.id,
            name: self.name.clone(),
            slug: self.slug.clone(),
        }
    }

    /// Finds a tenant by ID
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, slug, subscription_tier, base_role_slots,
                   purchased_role_slots, max_role_slots, default_role_id, created_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }
}
