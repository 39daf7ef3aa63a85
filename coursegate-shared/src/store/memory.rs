//! In-memory stores.
//!
//! Intended for tests and local runs. All state sits behind one tokio
//! `RwLock`, so each operation observes a consistent snapshot.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{validate_assignment, ContentStore, PermissionStore, StoreError};
use crate::content::filter::Predicate;
use crate::models::content::{ContentItem, ContentKind};
use crate::models::permission::{Permission, TenantRole};
use crate::models::tenant::Tenant;
use crate::models::user::User;
use crate::models::user_role::{AssignRole, AssignmentOutcome, RoleAssignment, UserRole};

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    tenants: HashMap<Uuid, Tenant>,
    roles: HashMap<Uuid, TenantRole>,
    permissions: HashMap<Uuid, Permission>,
    role_permissions: HashMap<Uuid, Vec<Uuid>>,
    user_roles: Vec<UserRole>,
    content: Vec<ContentItem>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.id, user);
    }

    pub async fn insert_tenant(&self, tenant: Tenant) {
        self.state.write().await.tenants.insert(tenant.id, tenant);
    }

    pub async fn insert_role(&self, role: TenantRole) {
        self.state.write().await.roles.insert(role.id, role);
    }

    pub async fn insert_permission(&self, permission: Permission) {
        self.state
            .write()
            .await
            .permissions
            .insert(permission.id, permission);
    }

    /// Attaches a permission to a role
    pub async fn grant(&self, role_id: Uuid, permission_id: Uuid) {
        let mut state = self.state.write().await;
        let granted = state.role_permissions.entry(role_id).or_default();
        if !granted.contains(&permission_id) {
            granted.push(permission_id);
        }
    }

    /// Stores a user role as-is, skipping assignment validation
    ///
    /// Lets tests plant rows the database constraints would normally refuse.
    pub async fn insert_user_role(&self, user_role: UserRole) {
        let mut state = self.state.write().await;
        state
            .user_roles
            .retain(|r| !(r.user_id == user_role.user_id && r.tenant_id == user_role.tenant_id));
        state.user_roles.push(user_role);
    }

    pub async fn set_role_active(&self, role_id: Uuid, is_active: bool) {
        if let Some(role) = self.state.write().await.roles.get_mut(&role_id) {
            role.is_active = is_active;
        }
    }

    pub async fn insert_content(&self, item: ContentItem) {
        self.state.write().await.content.push(item);
    }

    /// Current assignment of a user in a tenant
    pub async fn user_role(&self, user_id: Uuid, tenant_id: Uuid) -> Option<UserRole> {
        self.state
            .read()
            .await
            .user_roles
            .iter()
            .find(|r| r.user_id == user_id && r.tenant_id == tenant_id)
            .cloned()
    }
}

impl State {
    fn assignment(&self, user_role: &UserRole) -> Option<RoleAssignment> {
        let tenant = self.tenants.get(&user_role.tenant_id)?;
        let role = self.roles.get(&user_role.tenant_role_id)?;

        let mut permissions: Vec<Permission> = self
            .role_permissions
            .get(&role.id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.permissions.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default();
        permissions.sort_by(|a, b| a.name.cmp(&b.name));

        Some(RoleAssignment {
            user_role: user_role.clone(),
            tenant: tenant.summary(),
            role: role.clone(),
            permissions,
        })
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn find_user_role_assignments(
        &self,
        user_id: Uuid,
        tenant_id: Option<Uuid>,
    ) -> Result<Vec<RoleAssignment>, StoreError> {
        let state = self.state.read().await;

        let mut user_roles: Vec<&UserRole> = state
            .user_roles
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| tenant_id.map_or(true, |t| r.tenant_id == t))
            .collect();
        user_roles.sort_by(|a, b| a.assigned_at.cmp(&b.assigned_at).then(a.id.cmp(&b.id)));

        Ok(user_roles
            .into_iter()
            .filter_map(|r| state.assignment(r))
            .collect())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_tenant(&self, tenant_id: Uuid) -> Result<Option<Tenant>, StoreError> {
        Ok(self.state.read().await.tenants.get(&tenant_id).cloned())
    }

    async fn find_tenant_role(&self, role_id: Uuid) -> Result<Option<TenantRole>, StoreError> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn assign_role(&self, data: AssignRole) -> Result<AssignmentOutcome, StoreError> {
        let mut state = self.state.write().await;

        validate_assignment(
            &data,
            state.users.get(&data.user_id),
            state.tenants.get(&data.tenant_id),
            state.roles.get(&data.tenant_role_id),
        )?;

        let existing = state
            .user_roles
            .iter()
            .position(|r| r.user_id == data.user_id && r.tenant_id == data.tenant_id);

        match (existing, data.expected_role_id) {
            (Some(index), expected)
                if expected.map_or(true, |e| e == state.user_roles[index].tenant_role_id) =>
            {
                let current = &mut state.user_roles[index];
                current.tenant_role_id = data.tenant_role_id;
                current.assigned_by = data.assigned_by;
                current.assigned_at = Utc::now();
                Ok(AssignmentOutcome::Updated(current.clone()))
            }
            (_, Some(expected)) => Err(StoreError::Conflict(format!(
                "user {} no longer holds role {} in tenant {}",
                data.user_id, expected, data.tenant_id
            ))),
            (_, None) => {
                let created = UserRole {
                    id: Uuid::new_v4(),
                    user_id: data.user_id,
                    tenant_id: data.tenant_id,
                    tenant_role_id: data.tenant_role_id,
                    assigned_at: Utc::now(),
                    assigned_by: data.assigned_by,
                };
                state.user_roles.push(created.clone());
                Ok(AssignmentOutcome::Created(created))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl ContentStore for InMemoryStore {
    async fn find_content(
        &self,
        kind: ContentKind,
        predicate: &Predicate,
    ) -> Result<Vec<ContentItem>, StoreError> {
        let state = self.state.read().await;

        let mut items: Vec<ContentItem> = state
            .content
            .iter()
            .filter(|item| item.kind == kind && predicate.matches(item))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(items)
    }
}
