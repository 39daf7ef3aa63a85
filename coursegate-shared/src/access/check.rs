//! Permission check evaluation.
//!
//! Answers "does the user hold P" for a list of permissions, combining the
//! per-permission answers with AND (`require_all`) or OR (default).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resolver::EffectivePermissions;

/// Error type for malformed check requests
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckError {
    #[error("permissions must be a non-empty list")]
    EmptyPermissions,

    #[error("permission at index {0} is blank")]
    BlankPermission(usize),
}

/// A permission check
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub permissions: Vec<String>,

    #[serde(default)]
    pub tenant_id: Option<Uuid>,

    #[serde(default)]
    pub require_all: bool,
}

impl CheckRequest {
    /// Rejects empty lists and blank names
    ///
    /// Must run before any permission lookup.
    pub fn validate(&self) -> Result<(), CheckError> {
        if self.permissions.is_empty() {
            return Err(CheckError::EmptyPermissions);
        }

        if let Some(index) = self.permissions.iter().position(|p| p.trim().is_empty()) {
            return Err(CheckError::BlankPermission(index));
        }

        Ok(())
    }
}

/// Answer for one requested permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionResult {
    pub permission: String,
    pub granted: bool,
}

/// Answer for a whole check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutcome {
    pub granted: bool,
    pub require_all: bool,

    /// Same order as the request
    pub results: Vec<PermissionResult>,

    pub user_permission_count: usize,
}

/// Evaluates `request` against already-resolved permissions
pub fn evaluate(effective: &EffectivePermissions, request: &CheckRequest) -> CheckOutcome {
    let results: Vec<PermissionResult> = request
        .permissions
        .iter()
        .map(|permission| PermissionResult {
            permission: permission.clone(),
            granted: effective.contains(permission),
        })
        .collect();

    let granted = if request.require_all {
        results.iter().all(|r| r.granted)
    } else {
        results.iter().any(|r| r.granted)
    };

    CheckOutcome {
        granted,
        require_all: request.require_all,
        results,
        user_permission_count: effective.count(),
    }
}
