//! Integration tests for the HTTP API.
//!
//! The router runs on in-memory services, so no database is needed.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use club_pairing::{
    room::{RoomConfig, RoomRegistry},
    services::Services,
    tournament::PlayerProfile,
};
use cp_server::api::{AppState, auth::TokenVerifier, create_router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "test_secret_key_for_testing_only_0123";
const ORGANIZER: i64 = 100;

/// Helper to create a test router with a seeded player directory
async fn create_test_server() -> (axum::Router, Arc<TokenVerifier>) {
    let (services, players, _) = Services::in_memory();
    for id in 1..=6 {
        players
            .insert(PlayerProfile {
                id,
                nickname: format!("member{}", id),
                rating: 1400 + id as u32,
            })
            .await;
    }

    let tokens = Arc::new(TokenVerifier::new(SECRET));
    let state = AppState {
        registry: RoomRegistry::new(RoomConfig::default(), services),
        tokens: tokens.clone(),
        database: None,
    };

    (create_router(state), tokens)
}

fn bearer(tokens: &TokenVerifier, user_id: i64) -> String {
    let token = tokens
        .issue(user_id, &format!("user{}", user_id), chrono::Duration::minutes(15))
        .unwrap();
    format!("Bearer {}", token)
}

fn post_json(uri: &str, authorization: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(authorization) = authorization {
        builder = builder.header("authorization", authorization);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Create a 4-player round robin owned by `ORGANIZER` and return its id
async fn create_round_robin(app: &axum::Router, tokens: &TokenVerifier) -> i64 {
    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/tournaments",
            Some(&bearer(tokens, ORGANIZER)),
            json!({"name": "Club RR", "format": "round_robin", "playerIds": [1, 2, 3, 4]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    body_json(response).await["id"].as_i64().unwrap()
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server().await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert!(body["database"].is_null());
    assert_eq!(body["rooms"]["active_count"], 0);
}

// ============================================================================
// Tournament Creation Tests
// ============================================================================

#[tokio::test]
async fn test_create_requires_token() {
    let (app, _) = create_test_server().await;
    let body = json!({"name": "No token", "format": "swiss"});

    let response = app
        .clone()
        .oneshot(post_json("/api/v1/tournaments", None, body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(post_json("/api/v1/tournaments", Some("Bearer forged"), body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_tournament() {
    let (app, tokens) = create_test_server().await;

    let response = app
        .oneshot(post_json(
            "/api/v1/tournaments",
            Some(&bearer(&tokens, ORGANIZER)),
            json!({"name": "Spring Swiss", "format": "swiss", "totalRounds": 4, "playerIds": [1, 2, 3]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["organizerId"], ORGANIZER);
    assert_eq!(body["status"], "not_started");
    assert_eq!(body["totalRounds"], 4);
    assert_eq!(body["players"].as_array().unwrap().len(), 3);
    assert_eq!(body["players"][0]["nickname"], "member1");
}

#[tokio::test]
async fn test_create_rejects_unknown_player_and_bad_input() {
    let (app, tokens) = create_test_server().await;
    let authorization = bearer(&tokens, ORGANIZER);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/v1/tournaments",
            Some(&authorization),
            json!({"name": "Ghosts", "format": "swiss", "playerIds": [1, 99]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");

    let response = app
        .oneshot(post_json(
            "/api/v1/tournaments",
            Some(&authorization),
            json!({"name": "", "format": "swiss"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "INVALID_TOURNAMENT");
}

// ============================================================================
// Snapshot and Command Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_endpoint() {
    let (app, tokens) = create_test_server().await;
    let id = create_round_robin(&app, &tokens).await;

    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tournaments/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Club RR");

    // Fetching the snapshot started the room
    let response = app
        .clone()
        .oneshot(get(&format!("/api/v1/tournaments/{}/room", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["connections"], 0);

    let response = app.oneshot(get("/api/v1/tournaments/4242")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_endpoint_without_live_room() {
    let (app, tokens) = create_test_server().await;
    let id = create_round_robin(&app, &tokens).await;

    let response = app
        .oneshot(get(&format!("/api/v1/tournaments/{}/room", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "ROOM_NOT_RUNNING");
}

#[tokio::test]
async fn test_commands_over_http() {
    let (app, tokens) = create_test_server().await;
    let id = create_round_robin(&app, &tokens).await;
    let uri = format!("/api/v1/tournaments/{}/commands", id);

    // A signed-in stranger is not the organizer
    let response = app
        .clone()
        .oneshot(post_json(
            &uri,
            Some(&bearer(&tokens, 7)),
            json!({"type": "start_tournament"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "NOT_ORGANIZER");

    let organizer = bearer(&tokens, ORGANIZER);
    let response = app
        .clone()
        .oneshot(post_json(&uri, Some(&organizer), json!({"type": "start_tournament"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(post_json(&uri, Some(&organizer), json!({"type": "advance_round"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "ROUND_INCOMPLETE");

    let response = app
        .clone()
        .oneshot(post_json(
            &uri,
            Some(&organizer),
            json!({"type": "submit_result", "gameId": 1, "result": "unset"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let snapshot = body_json(
        app.oneshot(get(&format!("/api/v1/tournaments/{}", id)))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(snapshot["status"], "ongoing");
    assert_eq!(snapshot["currentRound"], 1);
    assert_eq!(snapshot["games"].as_array().unwrap().len(), 2);
}
