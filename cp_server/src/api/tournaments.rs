//! Tournament HTTP handlers.
//!
//! The WebSocket is the primary interface; these endpoints cover creation,
//! resynchronization without a socket, and organizer tooling that cannot
//! hold a connection open.
//!
//! Create a tournament:
//! ```bash
//! curl -X POST http://localhost:6970/api/v1/tournaments \
//!   -H "Authorization: Bearer $TOKEN" \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Spring Swiss", "format": "swiss", "totalRounds": 5, "playerIds": [1, 2, 3, 4]}'
//! ```

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
};
use club_pairing::{
    messages::ClientCommand,
    room::{AuthContext, CreateTournament, DispatchError, RoomInfo},
    tournament::{Tournament, TournamentId, UserId},
};
use std::time::Instant;

use super::{ApiError, AppState, api_error, dispatch_failure, registry_failure};
use crate::{logging, metrics};

/// Full snapshot of a tournament, loading its room if needed.
///
/// # Errors
///
/// - `404 Not Found`: Unknown tournament
/// - `503 Service Unavailable`: Snapshot store unreachable
pub async fn get_tournament(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<Tournament>, ApiError> {
    state
        .registry
        .snapshot(tournament_id)
        .await
        .map(Json)
        .map_err(registry_failure)
}

/// Connection counts of a running room. Does not start the room.
pub async fn get_room(
    State(state): State<AppState>,
    Path(tournament_id): Path<TournamentId>,
) -> Result<Json<RoomInfo>, ApiError> {
    state.registry.room_info(tournament_id).await.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "ROOM_NOT_RUNNING",
            format!("Tournament {} has no live room", tournament_id),
        )
    })
}

/// Create a tournament owned by the caller.
///
/// # Response
///
/// `201 Created` with the new tournament.
///
/// # Errors
///
/// - `400 Bad Request`: Empty name, bad round count or duplicate players
/// - `404 Not Found`: A player id is not in the directory
pub async fn create_tournament(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Json(request): Json<CreateTournament>,
) -> Result<(StatusCode, Json<Tournament>), ApiError> {
    let tournament = state
        .registry
        .create_tournament(user_id, request)
        .await
        .map_err(registry_failure)?;

    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Apply one command without a live connection.
///
/// Resulting events are broadcast to every connected client; the caller
/// only learns whether the command was accepted.
///
/// # Response
///
/// `204 No Content` when applied.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed command
/// - `403 Forbidden`: Caller is not the organizer
/// - `409 Conflict`: Command not valid in the current state
/// - `503 Service Unavailable`: State could not be saved; nothing was applied
pub async fn submit_command(
    State(state): State<AppState>,
    Extension(user_id): Extension<UserId>,
    Path(tournament_id): Path<TournamentId>,
    Json(command): Json<ClientCommand>,
) -> Result<StatusCode, ApiError> {
    let kind = command.kind();
    let started = Instant::now();

    let result = state
        .registry
        .dispatch_as(tournament_id, None, AuthContext::user(user_id), command)
        .await;

    let elapsed = started.elapsed();
    logging::log_performance("http_command", elapsed.as_millis() as u64, Some(kind));
    metrics::command_duration_ms(kind, elapsed.as_secs_f64() * 1000.0);

    match result {
        Ok(()) => {
            metrics::command_processed(kind, "ok");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            metrics::command_processed(kind, e.code());
            if matches!(e, DispatchError::Authorization(_)) {
                logging::log_security_event(
                    "unauthorized_command",
                    Some(user_id),
                    Some(tournament_id),
                    &e.to_string(),
                );
            }
            Err(dispatch_failure(e))
        }
    }
}
