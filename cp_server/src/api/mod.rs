//! HTTP/WebSocket API for the pairing server.
//!
//! # Modules
//!
//! - [`auth`]: access token verification
//! - [`tournaments`]: tournament creation, snapshots and HTTP commands
//! - [`websocket`]: live room connections
//! - [`middleware`]: bearer token middleware for protected endpoints
//! - [`throttle`]: per-connection frame throttle
//!
//! # Endpoints
//!
//! ```text
//! GET  /health                                  - Health check (public)
//! GET  /ws/{tournament_id}?token=<jwt>          - Live room (token optional)
//! GET  /api/v1/tournaments/{id}                 - Full snapshot (public)
//! GET  /api/v1/tournaments/{id}/room            - Live room statistics (public)
//! POST /api/v1/tournaments                      - Create tournament (auth required)
//! POST /api/v1/tournaments/{id}/commands        - Send a command (auth required)
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use cp_server::api::{AppState, auth::TokenVerifier, create_router};
//! use club_pairing::{room::{RoomConfig, RoomRegistry}, services::Services};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (services, _, _) = Services::in_memory();
//! let state = AppState {
//!     registry: RoomRegistry::new(RoomConfig::default(), services),
//!     tokens: Arc::new(TokenVerifier::new("a-secret-of-at-least-thirty-two-chars")),
//!     database: None,
//! };
//!
//! let app = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6970").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod middleware;
pub mod throttle;
pub mod tournaments;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use club_pairing::{
    db::Database,
    room::{DispatchError, RegistryError, RoomRegistry},
    services::ServiceError,
    tournament::TournamentError,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use auth::TokenVerifier;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: RoomRegistry,
    pub tokens: Arc<TokenVerifier>,
    /// `None` when running on in-memory services
    pub database: Option<Database>,
}

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, message: String) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            error: message,
        }),
    )
}

/// Map a registry failure to an HTTP response
pub fn registry_failure(error: RegistryError) -> ApiError {
    let status = match &error {
        RegistryError::TournamentNotFound(_) | RegistryError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
        RegistryError::Service(ServiceError::InvalidTournament(_)) => StatusCode::BAD_REQUEST,
        RegistryError::Service(_) | RegistryError::RoomClosed(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    api_error(status, error.code(), error.client_message())
}

/// Map a rejected command to an HTTP response
pub fn dispatch_failure(error: DispatchError) -> ApiError {
    let status = match &error {
        DispatchError::Validation { .. } => StatusCode::BAD_REQUEST,
        DispatchError::State(TournamentError::GameNotFound(_) | TournamentError::PlayerNotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        DispatchError::State(_) => StatusCode::CONFLICT,
        DispatchError::Authorization(_) => StatusCode::FORBIDDEN,
        DispatchError::NotFound(_) => StatusCode::NOT_FOUND,
        DispatchError::Persistence(_) | DispatchError::Service(_) | DispatchError::RoomClosed(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    api_error(status, error.code(), error.client_message())
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    let root_routes = Router::new()
        .route("/health", get(health_check))
        // WebSocket route handles its own auth via query parameter
        .route("/ws/{tournament_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", v1_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new()
        .route("/tournaments/{tournament_id}", get(tournaments::get_tournament))
        .route("/tournaments/{tournament_id}/room", get(tournaments::get_room));

    let protected_routes = Router::new()
        .route("/tournaments", post(tournaments::create_tournament))
        .route(
            "/tournaments/{tournament_id}/commands",
            post(tournaments::submit_command),
        )
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the database (if any) answers, `503 Service
/// Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:6970/health
/// # {"status":"healthy","database":true,"rooms":{"active_count":2},"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.database {
        Some(db) => Some(db.health_check().await.is_ok()),
        None => None,
    };
    let healthy = database.unwrap_or(true);

    let active_rooms = state.registry.active_rooms().await;
    crate::metrics::active_rooms(active_rooms);

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "rooms": {
            "active_count": active_rooms
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
