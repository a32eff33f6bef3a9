//! HTTP API for the eco_tech authentication service.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP
//! - **Tower**: Middleware for CORS, request IDs, authentication
//! - **JWT**: Token-based authentication with access/refresh tokens
//! - **Renderer**: Per-route `{success, message, data}` envelopes
//!
//! # Modules
//!
//! - [`auth`]: register, login, token refresh, current user
//! - [`routes`]: the static routing table
//! - [`renderer`]: response envelope middleware
//! - [`middleware`]: bearer-token authentication for protected endpoints
//! - [`request_id`]: request correlation IDs and request metrics
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                    - Health check (plain JSON)
//! POST /v1/auth/register/         - Register user
//! POST /v1/auth/login/            - Login
//! POST /v1/auth/token/refresh/    - Refresh access token
//! GET  /v1/auth/me/               - Current user (auth required)
//! ```
//!
//! With [`RoutingVariant::RegisterOnly`] only `POST /v1/auth/` (register) is
//! mounted besides `/health`.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use eco_server::api::{AppState, RoutingVariant, create_router};
//! use eco_tech::{auth::{AuthManager, TokenConfig}, db::MemoryUserRepository};
//! use std::sync::Arc;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let auth_manager = AuthManager::new(
//!     Arc::new(MemoryUserRepository::new()),
//!     "pepper".to_string(),
//!     "jwt_secret",
//!     TokenConfig::default(),
//! );
//! let state = AppState {
//!     auth_manager: Arc::new(auth_manager),
//!     database: None,
//! };
//!
//! let app = create_router(state, RoutingVariant::Standard);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod renderer;
pub mod request_id;
pub mod routes;

pub use error::ApiError;
pub use renderer::ResponseFormat;
pub use routes::RoutingVariant;

use axum::{
    Router,
    extract::State,
    http::{Method, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json},
    routing::get,
};
use eco_tech::{auth::AuthManager, db::Database};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request (cheap due to Arc wrappers).
///
/// # Fields
///
/// - `auth_manager`: registration, login and token verification
/// - `database`: PostgreSQL pool for health checks; `None` when running on
///   the in-memory store
#[derive(Clone)]
pub struct AppState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Option<Arc<Database>>,
}

/// Create the complete API router with all endpoints and middleware.
///
/// Mounts the routing table for `variant`, wrapping each route that declares
/// a response format in the renderer, then applies request-ID and CORS
/// layers to everything. A request with the wrong method gets a JSON 405,
/// enveloped like any other error of that route.
pub fn create_router(state: AppState, variant: RoutingVariant) -> Router {
    let mut router = Router::new().route("/health", get(health_check));

    for route in routes::auth_routes(&state, variant) {
        tracing::debug!(method = %route.method, path = route.path, "Mounting route");

        let allowed = route.method.clone();
        let handler = route.handler.fallback(move |method: Method| async move {
            ApiError::MethodNotAllowed { method, allowed }
        });

        let handler = match route.response_format {
            Some(format) => handler.layer(from_fn_with_state(
                Arc::new(format),
                renderer::render_envelope,
            )),
            None => handler,
        };
        router = router.route(route.path, handler);
    }

    router
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the credential store is reachable, `503 Service
/// Unavailable` otherwise. Not enveloped.
///
/// ```bash
/// curl http://localhost:8000/health
/// # {"status":"healthy","version":"0.1.0","database":true,"timestamp":"2026-01-01T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_healthy = match &state.database {
        Some(db) => db.health_check().await.is_ok(),
        None => true,
    };

    let status_code = if db_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
