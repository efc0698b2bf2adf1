use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::{IdentityVerifier, SiteAdmins};
use crate::config::SecurityConfig;
use crate::database::{HealthCheck, HistoryStore, UserStore};
use crate::handlers;
use crate::middleware::require_identity;
use crate::services::{HistoryService, UserService};

/// Shared handles every request sees. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub site_admins: Arc<SiteAdmins>,
    pub histories: HistoryService,
    pub users: UserService,
    pub health: Arc<dyn HealthCheck>,
}

impl AppState {
    pub fn new<S>(store: Arc<S>, verifier: Arc<dyn IdentityVerifier>, site_admins: SiteAdmins) -> Self
    where
        S: HistoryStore + UserStore + HealthCheck + 'static,
    {
        Self {
            verifier,
            site_admins: Arc::new(site_admins),
            histories: HistoryService::new(store.clone(), store.clone()),
            users: UserService::new(store.clone()),
            health: store,
        }
    }
}

pub fn router(state: AppState, security: &SecurityConfig) -> Router {
    Router::new()
        // Public
        .route("/", get(handlers::public::root))
        .route("/health", get(handlers::public::health))
        .nest("/api/v1", api_routes(state.clone()))
        // Global middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(security)),
        )
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    use handlers::protected::{histories, users};

    let protected = Router::new()
        .route("/users/:user_id", get(users::get))
        .route(
            "/users/:user_id/histories",
            get(histories::list).post(histories::create),
        )
        .route(
            "/users/:user_id/histories/:history_id",
            put(histories::update).delete(histories::delete),
        )
        .route_layer(middleware::from_fn_with_state(state, require_identity));

    Router::new()
        // Public, cross-user aggregate
        .route("/histories/total", get(handlers::public::histories_total))
        .merge(protected)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::permissive().allow_origin(AllowOrigin::list(origins))
}
