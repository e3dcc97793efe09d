use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::handlers::{protected, public};
use crate::middleware::session_auth_middleware;
use crate::state::AppState;

/// Full application router
pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(catalog_routes())
        .merge(login_routes())
        // Protected
        .merge(admin_routes(state.clone()))
        .with_state(state)
        // Global middleware
        .layer(cors_layer(&config));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/api/site", get(public::site_get))
        .route("/api/products", get(public::products_list))
        .route("/api/products/:id", get(public::product_get))
        .route("/api/products/:id/metadata", get(public::product_metadata))
}

fn login_routes() -> Router<AppState> {
    Router::new().route("/auth/login", post(public::login_post))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    let body_limit = state.config.api.max_request_size_bytes;

    Router::new()
        // Session management
        .route("/api/auth/whoami", get(protected::session_whoami))
        .route("/api/auth/logout", post(protected::session_logout))
        // Product management
        .route(
            "/api/admin/products",
            get(protected::admin_products_list).post(protected::admin_product_create),
        )
        .route(
            "/api/admin/products/:id",
            patch(protected::admin_product_update).delete(protected::admin_product_delete),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state, session_auth_middleware))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Sogrub API",
            "version": version,
            "description": "Storefront and admin backend for Sogrub restored furniture",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "site": "/api/site (public)",
                "products": "/api/products[/:id[/metadata]] (public)",
                "login": "/auth/login (public, rate limited)",
                "auth": "/api/auth/whoami, /api/auth/logout (session)",
                "admin": "/api/admin/products[/:id] (session)",
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.catalog.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "products": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "product store unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
