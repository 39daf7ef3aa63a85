//! Effective permission resolution.
//!
//! Turns a user's raw role assignments into per-tenant permission sets plus
//! the flattened union across tenants. Only active tenant roles contribute,
//! and only permissions that are active and not deprecated.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::catalog;
use crate::models::tenant::TenantSummary;
use crate::models::user_role::RoleAssignment;
use crate::store::{PermissionStore, StoreError};

/// Role held by the user within one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleSummary {
    /// Tenant role ID
    pub id: Uuid,
    pub role_alias: String,
    pub assigned_at: DateTime<Utc>,
}

/// Everything the user holds within one tenant
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TenantPermissions {
    pub tenant: TenantSummary,
    pub roles: Vec<RoleSummary>,
    pub permissions: BTreeSet<String>,
}

/// Resolved permissions of one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissions {
    pub user_id: Uuid,

    /// One entry per tenant with at least one active role, first-seen order
    pub tenants: Vec<TenantPermissions>,

    /// Union of every tenant's permissions
    pub all: BTreeSet<String>,

    /// Category recorded on the permission rows, by name
    categories: BTreeMap<String, String>,
}

impl EffectivePermissions {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            tenants: Vec::new(),
            all: BTreeSet::new(),
            categories: BTreeMap::new(),
        }
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.all.contains(permission)
    }

    pub fn count(&self) -> usize {
        self.all.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    pub fn tenant(&self, tenant_id: Uuid) -> Option<&TenantPermissions> {
        self.tenants.iter().find(|t| t.tenant.id == tenant_id)
    }

    /// Whether the user holds `permission` inside `tenant_id` specifically
    pub fn has_in_tenant(&self, tenant_id: Uuid, permission: &str) -> bool {
        self.tenant(tenant_id)
            .is_some_and(|t| t.permissions.contains(permission))
    }

    /// The flattened set grouped by category
    ///
    /// Uses the category stored on the permission row; names without one fall
    /// back to the static catalog.
    pub fn by_category(&self) -> BTreeMap<String, Vec<String>> {
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in &self.all {
            let category = self
                .categories
                .get(name)
                .map(String::as_str)
                .unwrap_or_else(|| catalog::category_of(name));
            groups
                .entry(category.to_string())
                .or_default()
                .push(name.clone());
        }
        groups
    }
}

/// Folds raw assignments into effective permissions
///
/// Pure; the caller is responsible for having applied any tenant filter when
/// loading `assignments`.
pub fn resolve(user_id: Uuid, assignments: Vec<RoleAssignment>) -> EffectivePermissions {
    let mut effective = EffectivePermissions::empty(user_id);

    for assignment in assignments {
        if !assignment.role.is_active {
            continue;
        }

        if assignment.role.tenant_id != assignment.user_role.tenant_id {
            warn!(
                user_role_id = %assignment.user_role.id,
                role_tenant_id = %assignment.role.tenant_id,
                assignment_tenant_id = %assignment.user_role.tenant_id,
                "Ignoring cross-tenant role assignment"
            );
            continue;
        }

        let index = match effective
            .tenants
            .iter()
            .position(|t| t.tenant.id == assignment.tenant.id)
        {
            Some(index) => index,
            None => {
                effective.tenants.push(TenantPermissions {
                    tenant: assignment.tenant.clone(),
                    roles: Vec::new(),
                    permissions: BTreeSet::new(),
                });
                effective.tenants.len() - 1
            }
        };
        let entry = &mut effective.tenants[index];

        if !entry.roles.iter().any(|r| r.id == assignment.role.id) {
            entry.roles.push(RoleSummary {
                id: assignment.role.id,
                role_alias: assignment.role.role_alias.clone(),
                assigned_at: assignment.user_role.assigned_at,
            });
        }

        for permission in assignment.permissions.into_iter().filter(|p| p.is_effective()) {
            effective.all.insert(permission.name.clone());
            effective
                .categories
                .insert(permission.name.clone(), permission.category);
            entry.permissions.insert(permission.name);
        }
    }

    effective
}

/// Loads assignments from a store and resolves them
///
/// Catalog and role data are read fresh on every call; nothing is cached
/// between requests.
#[derive(Clone)]
pub struct PermissionResolver {
    store: Arc<dyn PermissionStore>,
}

impl PermissionResolver {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Effective permissions of `user_id`, optionally only within `tenant_id`
    ///
    /// A user without active roles yields an empty result, not an error.
    pub async fn effective_permissions(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<EffectivePermissions, StoreError> {
        let assignments = self
            .store
            .find_user_role_assignments(user_id, tenant_id)
            .await?;
        let loaded = assignments.len();

        let effective = resolve(user_id, assignments);

        debug!(
            user_id = %user_id,
            tenant_id = ?tenant_id,
            assignments = loaded,
            tenants = effective.tenants.len(),
            permissions = effective.count(),
            "Resolved effective permissions"
        );

        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::permission::{Permission, TenantRole};
    use crate::models::user_role::UserRole;

    fn perm(name: &str, active: bool, deprecated: bool) -> Permission {
        Permission {
            id: Uuid::new_v4(),
            name: name.to_string(),
            display_name: name.to_string(),
            category: name.split('.').next().unwrap_or("general").to_string(),
            is_active: active,
            is_deprecated: deprecated,
        }
    }

    fn assignment(
        user_id: Uuid,
        tenant_id: Uuid,
        role_active: bool,
        permissions: Vec<Permission>,
    ) -> RoleAssignment {
        let role_id = Uuid::new_v4();
        RoleAssignment {
            user_role: UserRole {
                id: Uuid::new_v4(),
                user_id,
                tenant_id,
                tenant_role_id: role_id,
                assigned_at: Utc::now(),
                assigned_by: None,
            },
            tenant: TenantSummary {
                id: tenant_id,
                name: format!("Tenant {tenant_id}"),
                slug: tenant_id.to_string(),
            },
            role: TenantRole {
                id: role_id,
                tenant_id,
                role_alias: "teacher".to_string(),
                is_active: role_active,
            },
            permissions,
        }
    }

    #[test]
    fn test_no_assignments_is_empty() {
        let user_id = Uuid::new_v4();
        let effective = resolve(user_id, vec![]);
        assert!(effective.is_empty());
        assert!(effective.tenants.is_empty());
        assert_eq!(effective.user_id, user_id);
    }

    #[test]
    fn test_inactive_and_deprecated_permissions_excluded() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let effective = resolve(
            user_id,
            vec![assignment(
                user_id,
                tenant_id,
                true,
                vec![
                    perm("quizzes.read", true, false),
                    perm("quizzes.delete", false, false),
                    perm("quizzes.legacy", true, true),
                ],
            )],
        );

        assert_eq!(effective.all, BTreeSet::from(["quizzes.read".to_string()]));
        assert!(!effective.contains("quizzes.delete"));
        assert!(!effective.contains("quizzes.legacy"));
    }

    #[test]
    fn test_inactive_role_contributes_nothing() {
        let user_id = Uuid::new_v4();
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();

        let effective = resolve(
            user_id,
            vec![
                assignment(
                    user_id,
                    t1,
                    true,
                    vec![perm("quizzes.read", true, false), perm("quizzes.create", true, false)],
                ),
                assignment(user_id, t2, false, vec![perm("users.delete", true, false)]),
            ],
        );

        assert_eq!(
            effective.all,
            BTreeSet::from(["quizzes.create".to_string(), "quizzes.read".to_string()])
        );
        assert_eq!(effective.tenants.len(), 1);
        assert_eq!(effective.tenants[0].tenant.id, t1);
        assert!(effective.tenant(t2).is_none());
    }

    #[test]
    fn test_cross_tenant_assignment_ignored() {
        let user_id = Uuid::new_v4();
        let mut bad = assignment(
            user_id,
            Uuid::new_v4(),
            true,
            vec![perm("users.delete", true, false)],
        );
        bad.role.tenant_id = Uuid::new_v4();

        let effective = resolve(user_id, vec![bad]);
        assert!(effective.is_empty());
    }

    #[test]
    fn test_multiple_roles_in_tenant_union() {
        let user_id = Uuid::new_v4();
        let tenant_id = Uuid::new_v4();
        let mut second =
            assignment(user_id, tenant_id, true, vec![perm("users.read", true, false)]);
        second.role.role_alias = "moderator".to_string();

        let effective = resolve(
            user_id,
            vec![
                assignment(user_id, tenant_id, true, vec![perm("quizzes.read", true, false)]),
                second,
            ],
        );

        assert_eq!(effective.tenants.len(), 1);
        let tenant = &effective.tenants[0];
        assert_eq!(tenant.roles.len(), 2);
        assert_eq!(tenant.roles[0].role_alias, "teacher");
        assert_eq!(tenant.roles[1].role_alias, "moderator");
        assert_eq!(tenant.permissions.len(), 2);
        assert!(effective.has_in_tenant(tenant_id, "users.read"));
        assert!(!effective.has_in_tenant(Uuid::new_v4(), "users.read"));
    }

    #[test]
    fn test_permissions_deduplicated_across_tenants() {
        let user_id = Uuid::new_v4();
        let effective = resolve(
            user_id,
            vec![
                assignment(user_id, Uuid::new_v4(), true, vec![perm("quizzes.read", true, false)]),
                assignment(user_id, Uuid::new_v4(), true, vec![perm("quizzes.read", true, false)]),
            ],
        );

        assert_eq!(effective.count(), 1);
        assert_eq!(effective.tenants.len(), 2);
    }

    #[test]
    fn test_by_category_uses_row_category() {
        let user_id = Uuid::new_v4();
        let mut custom = perm("reports.view", true, false);
        custom.category = "analytics".to_string();

        let effective = resolve(
            user_id,
            vec![assignment(
                user_id,
                Uuid::new_v4(),
                true,
                vec![custom, perm("quizzes.read", true, false)],
            )],
        );

        let groups = effective.by_category();
        assert_eq!(groups["analytics"], vec!["reports.view"]);
        assert_eq!(groups["quizzes"], vec!["quizzes.read"]);
    }
}
