/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use coursegate_api::{app::{build_router, AppState}, config::Config};
/// use coursegate_shared::db::pool::{create_pool, DatabaseConfig};
/// use coursegate_shared::store::postgres::PgStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(DatabaseConfig {
///     url: config.database.url.clone(),
///     ..Default::default()
/// })
/// .await?;
/// let app = build_router(AppState::from_pg(PgStore::new(pool), config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use coursegate_shared::access::resolver::PermissionResolver;
use coursegate_shared::auth::middleware::authenticate;
use coursegate_shared::store::{postgres::PgStore, ContentStore, PermissionStore};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request by Axum's `State` extractor; every field is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub permissions: Arc<dyn PermissionStore>,

    pub content: Arc<dyn ContentStore>,

    /// Resolver over `permissions`
    pub resolver: PermissionResolver,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        permissions: Arc<dyn PermissionStore>,
        content: Arc<dyn ContentStore>,
        config: Config,
    ) -> Self {
        Self {
            resolver: PermissionResolver::new(permissions.clone()),
            permissions,
            content,
            config: Arc::new(config),
        }
    }

    /// State backed by one Postgres store for both seams
    pub fn from_pg(store: PgStore, config: Config) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, config)
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                                   # public
/// └── /v1/                                          # bearer JWT required
///     ├── GET  /user-permissions?tenantId=
///     ├── POST /user-permissions/check
///     ├── GET  /permissions/catalog
///     ├── PUT  /tenants/:tenant_id/users/:user_id/role
///     └── GET  /content/:kind?published=
/// ```
///
/// Outermost layers: timeout, CORS, tracing.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let v1_routes = Router::new()
        .route(
            "/user-permissions",
            get(routes::permissions::get_user_permissions),
        )
        .route(
            "/user-permissions/check",
            post(routes::permissions::check_permissions),
        )
        .route("/permissions/catalog", get(routes::permissions::get_catalog))
        .route(
            "/tenants/:tenant_id/users/:user_id/role",
            put(routes::roles::assign_role),
        )
        .route("/content/:kind", get(routes::content::list_content))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(TimeoutLayer::new(state.config.request_timeout()))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Validates the bearer token and injects `AuthContext` into extensions
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(req.headers(), state.jwt_secret())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
