//! Integration tests for cp_client HTTP functionality.
//!
//! Runs the API client against a small stand-in server and against
//! unreachable addresses.

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    routing::{get, post},
};
use club_pairing::{
    messages::ClientCommand,
    room::{CreateTournament, RoomInfo},
    tournament::{NewTournament, PlayerProfile, Tournament, TournamentFormat, TournamentStatus},
};
use cp_client::api_client::ApiClient;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::time::timeout;

const TOKEN: &str = "test-token";

fn sample(id: i64, name: &str, player_ids: &[i64]) -> Tournament {
    Tournament::from_new(
        id,
        NewTournament {
            name: name.to_string(),
            organizer_id: 1,
            format: TournamentFormat::Swiss,
            total_rounds: Some(3),
            players: player_ids
                .iter()
                .map(|&id| PlayerProfile {
                    id,
                    nickname: format!("member{id}"),
                    rating: 1500,
                })
                .collect(),
        },
    )
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Bearer test-token")
}

async fn create(
    headers: HeaderMap,
    Json(request): Json<CreateTournament>,
) -> Result<(StatusCode, Json<Tournament>), StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok((
        StatusCode::CREATED,
        Json(sample(77, &request.name, &request.player_ids)),
    ))
}

async fn snapshot(Path(id): Path<i64>) -> Result<Json<Tournament>, (StatusCode, Json<Value>)> {
    if id == 77 {
        Ok(Json(sample(77, "Autumn swiss", &[1, 2, 3])))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(json!({"code": "NOT_FOUND", "error": "Tournament not found"})),
        ))
    }
}

async fn room(Path(id): Path<i64>) -> Json<RoomInfo> {
    Json(RoomInfo {
        tournament_id: id,
        status: TournamentStatus::NotStarted,
        connections: 2,
        organizers: 1,
    })
}

async fn command(
    headers: HeaderMap,
    Json(command): Json<ClientCommand>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(Value::Null));
    }
    match command {
        ClientCommand::StartTournament => (StatusCode::NO_CONTENT, Json(Value::Null)),
        _ => (
            StatusCode::CONFLICT,
            Json(json!({"code": "ROUND_INCOMPLETE", "error": "Round 1 still has 2 unfinished games"})),
        ),
    }
}

/// Serve the stand-in API on an ephemeral port
async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/v1/tournaments", post(create))
        .route("/api/v1/tournaments/{id}", get(snapshot))
        .route("/api/v1/tournaments/{id}/room", get(room))
        .route("/api/v1/tournaments/{id}/commands", post(command));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

// ============================================================================
// Request Tests
// ============================================================================

#[tokio::test]
async fn test_create_tournament_sends_bearer_token() {
    let base = spawn_server().await;
    let client = ApiClient::new(base).with_token(TOKEN);

    let tournament = client
        .create_tournament(&CreateTournament {
            name: "Thursday swiss".to_string(),
            format: TournamentFormat::Swiss,
            total_rounds: Some(3),
            player_ids: vec![4, 5],
        })
        .await
        .unwrap();

    assert_eq!(tournament.id, 77);
    assert_eq!(tournament.name, "Thursday swiss");
    assert_eq!(tournament.players.len(), 2);
}

#[tokio::test]
async fn test_create_with_wrong_token_fails() {
    let base = spawn_server().await;
    let client = ApiClient::new(base).with_token("forged");

    let err = client
        .create_tournament(&CreateTournament {
            name: "Thursday swiss".to_string(),
            format: TournamentFormat::Swiss,
            total_rounds: None,
            player_ids: vec![],
        })
        .await
        .unwrap_err();
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_snapshot_and_room_info() {
    let base = spawn_server().await;
    let client = ApiClient::new(base);

    let tournament = client.snapshot(77).await.unwrap();
    assert_eq!(tournament.status, TournamentStatus::NotStarted);
    assert_eq!(tournament.players.len(), 3);

    let info = client.room_info(77).await.unwrap();
    assert_eq!(info.connections, 2);
    assert_eq!(info.organizers, 1);
}

#[tokio::test]
async fn test_snapshot_error_carries_server_message() {
    let base = spawn_server().await;
    let client = ApiClient::new(base);

    let err = client.snapshot(5).await.unwrap_err().to_string();
    assert!(err.contains("404"), "unexpected error: {}", err);
    assert!(err.contains("NOT_FOUND"), "unexpected error: {}", err);
}

#[tokio::test]
async fn test_send_command() {
    let base = spawn_server().await;
    let client = ApiClient::new(base).with_token(TOKEN);

    client
        .send_command(77, &ClientCommand::StartTournament)
        .await
        .unwrap();

    let err = client
        .send_command(77, &ClientCommand::AdvanceRound)
        .await
        .unwrap_err()
        .to_string();
    assert!(err.contains("ROUND_INCOMPLETE"), "unexpected error: {}", err);
}

// ============================================================================
// Network Error Scenario Tests
// ============================================================================

#[tokio::test]
async fn test_connection_refused() {
    let client = ApiClient::new("http://127.0.0.1:19999");

    let result = client.snapshot(1).await;

    assert!(result.is_err(), "Should fail when server is not available");
    let error_msg = format!("{:#}", result.unwrap_err());
    assert!(
        error_msg.contains("Failed to fetch tournament"),
        "Error should indicate connection failure: {}",
        error_msg
    );
}

#[tokio::test]
async fn test_timeout_handling() {
    // Non-routable documentation address
    let client = ApiClient::new("http://192.0.2.1:80");

    let result = timeout(Duration::from_secs(3), client.snapshot(1)).await;

    assert!(
        result.is_err() || result.unwrap().is_err(),
        "Should fail when connecting to unreachable host"
    );
}

#[test]
fn test_websocket_url_matches_server_route() {
    let client = ApiClient::new("http://localhost:6970").with_token(TOKEN);
    assert_eq!(
        client.websocket_url(77),
        "ws://localhost:6970/ws/77?token=test-token"
    );
}
