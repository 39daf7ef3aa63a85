/// Effective-permission endpoints
///
/// # Endpoints
///
/// - `GET /v1/user-permissions?tenantId=` - everything the caller holds
/// - `POST /v1/user-permissions/check` - any/all check over a list
/// - `GET /v1/permissions/catalog` - the static catalog by category

use std::collections::BTreeMap;

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{QueryParams, ValidatedJson},
};
use axum::{extract::State, Extension, Json};
use coursegate_shared::access::catalog::{self, PermissionDef};
use coursegate_shared::access::check::{evaluate, CheckOutcome, CheckRequest};
use coursegate_shared::access::resolver::TenantPermissions;
use coursegate_shared::auth::middleware::AuthContext;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionsQuery {
    /// Restrict to one tenant
    pub tenant_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPermissionsResponse {
    pub user_id: Uuid,
    pub tenant_permissions: Vec<TenantPermissions>,
    pub all_permissions: Vec<String>,
    pub permissions_by_category: BTreeMap<String, Vec<String>>,

    /// Human label per held permission, the name itself when uncatalogued
    pub permission_labels: BTreeMap<String, String>,
}

/// Effective permissions of the caller
///
/// A caller without active roles gets empty collections, not an error.
pub async fn get_user_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    QueryParams(query): QueryParams<UserPermissionsQuery>,
) -> ApiResult<Json<UserPermissionsResponse>> {
    let effective = state
        .resolver
        .effective_permissions(auth.user_id, query.tenant_id)
        .await?;

    let permissions_by_category = effective.by_category();
    let permission_labels = effective
        .all
        .iter()
        .map(|name| (name.clone(), catalog::label(name).to_string()))
        .collect();

    Ok(Json(UserPermissionsResponse {
        user_id: effective.user_id,
        all_permissions: effective.all.into_iter().collect(),
        tenant_permissions: effective.tenants,
        permissions_by_category,
        permission_labels,
    }))
}

/// Check request body
///
/// A missing `permissions` field is treated like an empty list so both fail
/// validation the same way.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckPermissionsRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "permissions must be a non-empty list"))]
    pub permissions: Vec<String>,

    #[serde(default)]
    pub tenant_id: Option<Uuid>,

    #[serde(default)]
    pub require_all: bool,
}

impl From<CheckPermissionsRequest> for CheckRequest {
    fn from(body: CheckPermissionsRequest) -> Self {
        CheckRequest {
            permissions: body.permissions,
            tenant_id: body.tenant_id,
            require_all: body.require_all,
        }
    }
}

/// Checks the caller against a list of permissions
///
/// The request is validated before any permission lookup.
pub async fn check_permissions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ValidatedJson(body): ValidatedJson<CheckPermissionsRequest>,
) -> ApiResult<Json<CheckOutcome>> {
    let request = CheckRequest::from(body);
    request.validate()?;

    let effective = state
        .resolver
        .effective_permissions(auth.user_id, request.tenant_id)
        .await?;

    let outcome = evaluate(&effective, &request);

    tracing::debug!(
        user_id = %auth.user_id,
        granted = outcome.granted,
        require_all = outcome.require_all,
        "Permission check"
    );

    Ok(Json(outcome))
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub categories: BTreeMap<&'static str, Vec<&'static PermissionDef>>,
}

/// The static permission catalog grouped by category
pub async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        categories: catalog::grouped(),
    })
}
