/// Role assignment endpoint
///
/// # Endpoint
///
/// ```text
/// PUT /v1/tenants/:tenant_id/users/:user_id/role
/// ```
///
/// Body: `{ "tenantRoleId": "...", "expectedRoleId": "..." }`. When
/// `expectedRoleId` is present the write only happens if the user still holds
/// that role; otherwise it answers 409. Without it the last write wins.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::ValidatedJson,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use coursegate_shared::access::catalog::ROLES_ASSIGN;
use coursegate_shared::auth::authorization::require_permission;
use coursegate_shared::auth::middleware::AuthContext;
use coursegate_shared::models::user_role::{AssignRole, AssignmentOutcome, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssignRoleRequest {
    pub tenant_role_id: Uuid,

    #[serde(default)]
    pub expected_role_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AssignRoleResponse {
    /// `created` or `updated`
    pub outcome: &'static str,
    pub assignment: UserRole,
}

/// Assigns a tenant role to a user
///
/// Order of checks: tenant exists (404), caller holds `roles.assign` in it
/// (403), then the store validates the role (404/400) and applies the write
/// (409 on a stale `expectedRoleId`).
pub async fn assign_role(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, user_id)): Path<(Uuid, Uuid)>,
    ValidatedJson(body): ValidatedJson<AssignRoleRequest>,
) -> ApiResult<(StatusCode, Json<AssignRoleResponse>)> {
    if state.permissions.find_tenant(tenant_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("Tenant {} not found", tenant_id)));
    }

    require_permission(&state.resolver, &auth, tenant_id, ROLES_ASSIGN).await?;

    let outcome = state
        .permissions
        .assign_role(AssignRole {
            user_id,
            tenant_id,
            tenant_role_id: body.tenant_role_id,
            assigned_by: Some(auth.user_id),
            expected_role_id: body.expected_role_id,
        })
        .await?;

    tracing::info!(
        tenant_id = %tenant_id,
        user_id = %user_id,
        tenant_role_id = %body.tenant_role_id,
        assigned_by = %auth.user_id,
        outcome = outcome.as_str(),
        "Role assigned"
    );

    let status = match outcome {
        AssignmentOutcome::Created(_) => StatusCode::CREATED,
        AssignmentOutcome::Updated(_) => StatusCode::OK,
    };

    Ok((
        status,
        Json(AssignRoleResponse {
            outcome: outcome.as_str(),
            assignment: outcome.user_role().clone(),
        }),
    ))
}
