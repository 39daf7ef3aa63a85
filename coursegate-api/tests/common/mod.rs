//! Shared fixtures for API integration tests
//!
//! Builds the router over an `InMemoryStore` seeded with two tenants, a few
//! roles and users, and some content, then drives it with `oneshot` requests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use coursegate_api::app::{build_router, AppState};
use coursegate_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use coursegate_shared::auth::jwt::{create_token, Claims};
use coursegate_shared::models::content::{ContentItem, ContentKind};
use coursegate_shared::models::permission::{Permission, TenantRole};
use coursegate_shared::models::tenant::Tenant;
use coursegate_shared::models::user::User;
use coursegate_shared::models::user_role::UserRole;
use coursegate_shared::store::memory::InMemoryStore;
use coursegate_shared::store::PermissionStore;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            request_timeout_secs: 5,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
            sync_permission_catalog: false,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
    }
}

pub fn token_for(user_id: Uuid, tenant_id: Option<Uuid>) -> String {
    create_token(&Claims::new(user_id, tenant_id), SECRET).unwrap()
}

pub struct TestContext {
    pub app: Router,
    pub store: Arc<InMemoryStore>,

    pub acme: Tenant,
    pub globex: Tenant,

    /// Active in acme: quizzes.read, quizzes.create
    pub teacher_role: TenantRole,
    /// Active in acme: courses.read
    pub learner_role: TenantRole,
    /// Active in acme: roles.assign, users.read
    pub admin_role: TenantRole,
    /// Inactive in globex: users.delete
    pub globex_admin_role: TenantRole,

    /// Home tenant acme; teacher in acme, inactive admin in globex
    pub teacher: User,
    /// Home tenant acme; admin in acme
    pub admin: User,
    /// Home tenant acme; no roles yet
    pub newcomer: User,
    /// No home tenant, no roles
    pub platform_user: User,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());

        let acme = tenant("acme");
        let globex = tenant("globex");
        store.insert_tenant(acme.clone()).await;
        store.insert_tenant(globex.clone()).await;

        let teacher_role = role(acme.id, "teacher", true);
        let learner_role = role(acme.id, "learner", true);
        let admin_role = role(acme.id, "admin", true);
        let globex_admin_role = role(globex.id, "admin", false);
        for r in [&teacher_role, &learner_role, &admin_role, &globex_admin_role] {
            store.insert_role(r.clone()).await;
        }

        let mut catalog = std::collections::HashMap::new();
        for name in [
            "quizzes.read",
            "quizzes.create",
            "courses.read",
            "roles.assign",
            "users.read",
            "users.delete",
        ] {
            let p = permission(name);
            catalog.insert(name, p.id);
            store.insert_permission(p).await;
        }
        for (r, names) in [
            (&teacher_role, vec!["quizzes.read", "quizzes.create"]),
            (&learner_role, vec!["courses.read"]),
            (&admin_role, vec!["roles.assign", "users.read"]),
            (&globex_admin_role, vec!["users.delete"]),
        ] {
            for name in names {
                store.grant(r.id, catalog[name]).await;
            }
        }

        let teacher = user(Some(acme.id));
        let admin = user(Some(acme.id));
        let newcomer = user(Some(acme.id));
        let platform_user = user(None);
        for u in [&teacher, &admin, &newcomer, &platform_user] {
            store.insert_user(u.clone()).await;
        }

        assign(&store, teacher.id, &teacher_role).await;
        assign(&store, teacher.id, &globex_admin_role).await;
        assign(&store, admin.id, &admin_role).await;

        let now = Utc::now();
        for (offset, tenant_id, is_global, is_published, title) in [
            (1, Some(acme.id), false, true, "acme quiz"),
            (2, None, true, true, "global quiz"),
            (3, Some(globex.id), false, true, "globex quiz"),
            (4, Some(globex.id), true, true, "globex flagged global"),
            (5, Some(acme.id), false, false, "acme draft"),
        ] {
            store
                .insert_content(ContentItem {
                    id: Uuid::new_v4(),
                    kind: ContentKind::Quiz,
                    tenant_id,
                    is_global,
                    is_published,
                    title: title.to_string(),
                    image_url: None,
                    created_at: now - Duration::minutes(offset),
                })
                .await;
        }

        let app = build_router(AppState::new(store.clone(), store.clone(), test_config()));

        Self {
            app,
            store,
            acme,
            globex,
            teacher_role,
            learner_role,
            admin_role,
            globex_admin_role,
            teacher,
            admin,
            newcomer,
            platform_user,
        }
    }

    /// Rebuilds the router with a different permission store in front of the
    /// seeded data; content still comes from the in-memory store.
    pub fn with_permission_store(mut self, permissions: Arc<dyn PermissionStore>) -> Self {
        self.app = build_router(AppState::new(permissions, self.store.clone(), test_config()));
        self
    }

    pub fn token(&self, user: &User) -> String {
        token_for(user.id, user.tenant_id)
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Non-JSON bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    pub async fn get(&self, uri: &str, user: &User) -> (StatusCode, Value) {
        let token = self.token(user);
        self.send(Method::GET, uri, Some(&token), None).await
    }

    pub async fn post(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(user);
        self.send(Method::POST, uri, Some(&token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, user: &User, body: Value) -> (StatusCode, Value) {
        let token = self.token(user);
        self.send(Method::PUT, uri, Some(&token), Some(body)).await
    }
}

fn tenant(slug: &str) -> Tenant {
    Tenant {
        id: Uuid::new_v4(),
        name: slug.to_uppercase(),
        slug: slug.to_string(),
        subscription_tier: "pro".to_string(),
        base_role_slots: 3,
        purchased_role_slots: 0,
        max_role_slots: 10,
        default_role_id: None,
        created_at: Utc::now(),
    }
}

fn role(tenant_id: Uuid, alias: &str, is_active: bool) -> TenantRole {
    TenantRole {
        id: Uuid::new_v4(),
        tenant_id,
        role_alias: alias.to_string(),
        is_active,
    }
}

fn permission(name: &str) -> Permission {
    Permission {
        id: Uuid::new_v4(),
        name: name.to_string(),
        display_name: name.to_string(),
        category: name.split('.').next().unwrap_or("general").to_string(),
        is_active: true,
        is_deprecated: false,
    }
}

fn user(tenant_id: Option<Uuid>) -> User {
    User {
        id: Uuid::new_v4(),
        external_auth_id: format!("ext_{}", Uuid::new_v4()),
        tenant_id,
        first_name: None,
        last_name: None,
        role: "user".to_string(),
        points: 0,
        created_at: Utc::now(),
    }
}

async fn assign(store: &InMemoryStore, user_id: Uuid, role: &TenantRole) {
    store
        .insert_user_role(UserRole {
            id: Uuid::new_v4(),
            user_id,
            tenant_id: role.tenant_id,
            tenant_role_id: role.id,
            assigned_at: Utc::now(),
            assigned_by: None,
        })
        .await;
}
