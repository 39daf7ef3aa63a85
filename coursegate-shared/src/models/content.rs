/// Tenant-scoped learning content
///
/// Courses, quizzes, rewards and flashcards share the same visibility columns
/// and live in one table each.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE courses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     tenant_id UUID REFERENCES tenants(id) ON DELETE CASCADE,
///     is_global BOOLEAN NOT NULL DEFAULT FALSE,
///     is_published BOOLEAN NOT NULL DEFAULT FALSE,
///     title VARCHAR(255) NOT NULL,
///     image_url VARCHAR(512),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// -- quizzes, rewards, flashcards: same columns
/// ```
///
/// There is deliberately no CHECK tying `is_global` to a NULL `tenant_id`;
/// legacy rows with both set exist and are handled by the tenant filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::content::filter::Predicate;

/// Kinds of tenant-scoped content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Course,
    Quiz,
    Reward,
    Flashcard,
}

impl ContentKind {
    pub const ALL: [ContentKind; 4] = [
        ContentKind::Course,
        ContentKind::Quiz,
        ContentKind::Reward,
        ContentKind::Flashcard,
    ];

    /// Backing table
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Course => "courses",
            ContentKind::Quiz => "quizzes",
            ContentKind::Reward => "rewards",
            ContentKind::Flashcard => "flashcards",
        }
    }

    /// Parses the plural path segment used by the API (`/content/quizzes`)
    pub fn from_segment(segment: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.table() == segment)
    }
}

/// One content record, whatever its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub tenant_id: Option<Uuid>,
    pub is_global: bool,
    pub is_published: bool,
    pub title: String,

    /// Always serialized, `null` when the item has no image
    pub image_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    id: Uuid,
    tenant_id: Option<Uuid>,
    is_global: bool,
    is_published: bool,
    title: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
}

impl ContentRow {
    fn into_item(self, kind: ContentKind) -> ContentItem {
        ContentItem {
            id: self.id,
            kind,
            tenant_id: self.tenant_id,
            is_global: self.is_global,
            is_published: self.is_published,
            // Empty strings were historically used for "no image"
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            title: self.title,
            created_at: self.created_at,
        }
    }
}

impl ContentItem {
    /// Lists content of one kind matching `predicate`, newest first
    pub async fn find(
        pool: &PgPool,
        kind: ContentKind,
        predicate: &Predicate,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT id, tenant_id, is_global, is_published, title, image_url, created_at FROM ",
        );
        builder.push(kind.table());
        builder.push(" WHERE ");
        predicate.push_sql(&mut builder);
        builder.push(" ORDER BY created_at DESC, id ASC");

        let rows = builder
            .build_query_as::<ContentRow>()
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.into_item(kind)).collect())
    }
}
