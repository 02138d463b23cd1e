//! REST routes driven through the router without a socket.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use chess_play_server::{GameStore, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

async fn send(
    store: &GameStore,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = router(store.clone())
        .oneshot(request)
        .await
        .expect("Router is infallible");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Body is JSON")
    };
    (status, value)
}

#[tokio::test]
async fn test_create_and_get_user() {
    let store = GameStore::new();
    let (status, body) = send(
        &store,
        Method::POST,
        "/api/users",
        Some(json!({ "username": "alice", "password": "hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 1, "username": "alice", "rating": 1200 }));

    let (status, body) = send(&store, Method::GET, "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_user_is_bad_request() {
    let store = GameStore::new();
    let user = json!({ "username": "bob" });
    send(&store, Method::POST, "/api/users", Some(user.clone())).await;
    let (status, body) = send(&store, Method::POST, "/api/users", Some(user)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Username already exists" }));
}

#[tokio::test]
async fn test_invalid_user_data() {
    let store = GameStore::new();
    let (status, body) =
        send(&store, Method::POST, "/api/users", Some(json!({ "name": 5 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user data");
}

#[tokio::test]
async fn test_user_lookup_errors() {
    let store = GameStore::new();
    let (status, body) = send(&store, Method::GET, "/api/users/12", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");

    let (status, body) = send(&store, Method::GET, "/api/users/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid user ID");
}

#[tokio::test]
async fn test_game_lifecycle() {
    let store = GameStore::new();
    let (status, game) = send(
        &store,
        Method::POST,
        "/api/games",
        Some(json!({ "gameState": "start", "whitePlayerId": 1, "timeControl": 300 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["id"], 1);
    assert_eq!(game["status"], "active");
    assert_eq!(game["whiteTimeRemaining"], 300);
    assert_eq!(game["moves"], "");

    let (status, game) = send(
        &store,
        Method::POST,
        "/api/games/1/move",
        Some(json!({ "move": "e4", "gameState": "after-e4", "timeRemaining": { "white": 295 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["moves"], "e4");
    assert_eq!(game["gameState"], "after-e4");
    assert_eq!(game["whiteTimeRemaining"], 295);
    assert_eq!(game["blackTimeRemaining"], 300);

    send(&store, Method::POST, "/api/games/1/move", Some(json!({ "move": "e5" }))).await;

    let (status, game) = send(
        &store,
        Method::PUT,
        "/api/games/1",
        Some(json!({ "status": "completed", "winner": "draw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["moves"], "e4 e5");
    assert_eq!(game["status"], "completed");
    assert_eq!(game["winner"], "draw");

    let (status, game) = send(&store, Method::GET, "/api/games/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(game["status"], "completed");
}

#[tokio::test]
async fn test_game_errors() {
    let store = GameStore::new();

    let (status, body) =
        send(&store, Method::POST, "/api/games", Some(json!({ "moves": 3 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid game data");

    let (status, body) = send(&store, Method::GET, "/api/games/4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Game not found");

    let (status, body) = send(&store, Method::GET, "/api/games/x", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid game ID");

    let (status, _) =
        send(&store, Method::PUT, "/api/games/4", Some(json!({ "moves": "e4" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        send(&store, Method::PUT, "/api/games/4", Some(json!({ "status": "paused" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid update data");

    let (status, body) = send(&store, Method::POST, "/api/games/4/move", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid move data");

    let (status, _) = send(
        &store,
        Method::POST,
        "/api/games/4/move",
        Some(json!({ "move": "e4" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_games() {
    let store = GameStore::new();
    for (white, black) in [(1, 2), (2, 3), (3, 1)] {
        send(
            &store,
            Method::POST,
            "/api/games",
            Some(json!({ "gameState": "start", "whitePlayerId": white, "blackPlayerId": black })),
        )
        .await;
    }
    send(&store, Method::PUT, "/api/games/2", Some(json!({ "status": "abandoned" }))).await;

    let (status, games) = send(&store, Method::GET, "/api/games", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = games
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|game| game["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let (status, games) = send(&store, Method::GET, "/api/games?userId=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().map(Vec::len), Some(2));

    let (status, games) = send(&store, Method::GET, "/api/games?userId=0", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = games
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|game| game["id"].as_i64())
        .collect();
    assert_eq!(ids, vec![1, 3], "userId=0 falls back to the active games");

    let (status, body) = send(&store, Method::GET, "/api/games?userId=two", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid query parameters");
}
