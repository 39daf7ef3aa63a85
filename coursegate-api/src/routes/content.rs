/// Tenant-scoped content listing
///
/// # Endpoint
///
/// ```text
/// GET /v1/content/:kind?published=true
/// ```
///
/// `kind` is one of `courses`, `quizzes`, `rewards`, `flashcards`. Visibility
/// follows the tenant stored on the caller's user row: own tenant's items plus
/// global items that belong to no tenant.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::QueryParams,
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use coursegate_shared::auth::middleware::AuthContext;
use coursegate_shared::content::filter::{tenant_filter, ContentField, Predicate};
use coursegate_shared::models::content::{ContentItem, ContentKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub published: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ContentListResponse {
    pub items: Vec<ContentItem>,
}

pub async fn list_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(kind): Path<String>,
    QueryParams(query): QueryParams<ContentQuery>,
) -> ApiResult<Json<ContentListResponse>> {
    let kind = ContentKind::from_segment(&kind)
        .ok_or_else(|| ApiError::validation("kind", format!("unknown content kind: {}", kind)))?;

    let user = state
        .permissions
        .find_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let base = query
        .published
        .map(|published| Predicate::eq(ContentField::IsPublished, published));
    let predicate = tenant_filter(user.tenant_id, base);

    let items = state.content.find_content(kind, &predicate).await?;

    tracing::debug!(
        user_id = %user.id,
        user_kind = user.kind().as_str(),
        tenant_id = ?user.tenant_id,
        kind = kind.table(),
        count = items.len(),
        "Listed content"
    );

    Ok(Json(ContentListResponse { items }))
}
