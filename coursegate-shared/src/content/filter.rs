/// Tenant visibility filter for content queries
///
/// A record is visible to tenant `T` when it is owned by `T`, or when it is
/// global **and** has no owning tenant:
///
/// ```text
/// base AND (tenant_id = T OR (is_global = true AND tenant_id IS NULL))
/// ```
///
/// With no tenant the owned branch is dropped entirely, so a missing tenant
/// narrows to global content instead of matching every tenant. A row with
/// `is_global = true` and a non-null `tenant_id` only ever matches its own
/// tenant.
///
/// # Example
///
/// ```
/// use coursegate_shared::content::filter::{tenant_filter, ContentField, Predicate};
/// use uuid::Uuid;
///
/// let published = Predicate::eq(ContentField::IsPublished, true);
/// let filter = tenant_filter(Some(Uuid::new_v4()), Some(published));
/// assert!(matches!(filter, Predicate::And(_)));
/// ```

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::content::ContentItem;

/// Columns a content predicate may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentField {
    Id,
    TenantId,
    IsGlobal,
    IsPublished,
    Title,
}

impl ContentField {
    pub fn column(&self) -> &'static str {
        match self {
            ContentField::Id => "id",
            ContentField::TenantId => "tenant_id",
            ContentField::IsGlobal => "is_global",
            ContentField::IsPublished => "is_published",
            ContentField::Title => "title",
        }
    }
}

/// A literal compared against a column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Uuid(Uuid),
    Bool(bool),
    Text(String),
}

impl From<Uuid> for FilterValue {
    fn from(value: Uuid) -> Self {
        FilterValue::Uuid(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

/// Boolean expression over content columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// Column equals value; a NULL column never matches
    Eq(ContentField, FilterValue),

    /// Column is NULL
    IsNull(ContentField),

    /// All must hold; empty is true
    And(Vec<Predicate>),

    /// Any must hold; empty is false
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(field: ContentField, value: impl Into<FilterValue>) -> Self {
        Predicate::Eq(field, value.into())
    }

    pub fn is_null(field: ContentField) -> Self {
        Predicate::IsNull(field)
    }

    /// `is_global = true AND tenant_id IS NULL`
    pub fn global_only() -> Self {
        Predicate::And(vec![
            Predicate::eq(ContentField::IsGlobal, true),
            Predicate::is_null(ContentField::TenantId),
        ])
    }

    /// Evaluates the predicate against an in-memory record
    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            Predicate::Eq(field, expected) => {
                field_value(item, *field).is_some_and(|actual| &actual == expected)
            }
            Predicate::IsNull(field) => field_value(item, *field).is_none(),
            Predicate::And(parts) => parts.iter().all(|p| p.matches(item)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(item)),
        }
    }

    /// Appends the predicate as parameterised SQL
    pub fn push_sql<'args>(&self, builder: &mut QueryBuilder<'args, Postgres>) {
        match self {
            Predicate::Eq(field, value) => {
                builder.push(field.column());
                builder.push(" = ");
                match value {
                    FilterValue::Uuid(v) => builder.push_bind(*v),
                    FilterValue::Bool(v) => builder.push_bind(*v),
                    FilterValue::Text(v) => builder.push_bind(v.clone()),
                };
            }
            Predicate::IsNull(field) => {
                builder.push(field.column());
                builder.push(" IS NULL");
            }
            Predicate::And(parts) => push_joined(builder, parts, " AND ", "TRUE"),
            Predicate::Or(parts) => push_joined(builder, parts, " OR ", "FALSE"),
        }
    }
}

fn push_joined<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if parts.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        part.push_sql(builder);
    }
    builder.push(")");
}

fn field_value(item: &ContentItem, field: ContentField) -> Option<FilterValue> {
    match field {
        ContentField::Id => Some(FilterValue::Uuid(item.id)),
        ContentField::TenantId => item.tenant_id.map(FilterValue::Uuid),
        ContentField::IsGlobal => Some(FilterValue::Bool(item.is_global)),
        ContentField::IsPublished => Some(FilterValue::Bool(item.is_published)),
        ContentField::Title => Some(FilterValue::Text(item.title.clone())),
    }
}

/// Builds the visibility predicate for `tenant_id`, ANDed with `base`
pub fn tenant_filter(tenant_id: Option<Uuid>, base: Option<Predicate>) -> Predicate {
    let scope = match tenant_id {
        Some(tenant_id) => Predicate::Or(vec![
            Predicate::eq(ContentField::TenantId, tenant_id),
            Predicate::global_only(),
        ]),
        None => Predicate::global_only(),
    };

    match base {
        Some(base) => Predicate::And(vec![base, scope]),
        None => scope,
    }
}
