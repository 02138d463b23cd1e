//! REST routes over the [`GameStore`].

use crate::{
    ApiError, GameRecord, GameStore, GameUpdate, GamesQuery, MoveSubmission, NewGameRecord,
    NewUser, UserSummary,
};
use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower::ServiceBuilder;
use tracing::{debug, info, instrument};

/// Builds the API router around a shared store.
#[instrument(skip(store))]
pub fn router(store: GameStore) -> Router {
    info!("Building REST router");
    Router::new()
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", get(get_user))
        .route("/api/games", post(create_game).get(list_games))
        .route("/api/games/{id}", get(get_game).put(update_game))
        .route("/api/games/{id}/move", post(record_move))
        .layer(ServiceBuilder::new().map_request(log_request))
        .with_state(store)
}

fn log_request(req: Request<Body>) -> Request<Body> {
    info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
    req
}

fn parse_id(raw: &str, message: &str) -> Result<i32, ApiError> {
    raw.trim().parse().map_err(|_| {
        debug!(raw, "Unparseable id");
        ApiError::BadRequest(message.to_string())
    })
}

#[instrument(skip(store, body))]
async fn create_user(
    State(store): State<GameStore>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<UserSummary>, ApiError> {
    let Json(new_user) = body.map_err(|e| {
        debug!(error = %e, "Rejected user body");
        ApiError::BadRequest("Invalid user data".into())
    })?;
    if new_user.username().trim().is_empty() {
        return Err(ApiError::BadRequest("Invalid user data".into()));
    }
    if store.get_user_by_username(new_user.username())?.is_some() {
        return Err(ApiError::BadRequest("Username already exists".into()));
    }
    let user = store.create_user(new_user)?;
    Ok(Json(user.summary()))
}

#[instrument(skip(store))]
async fn get_user(
    State(store): State<GameStore>,
    Path(id): Path<String>,
) -> Result<Json<UserSummary>, ApiError> {
    let id = parse_id(&id, "Invalid user ID")?;
    store
        .get_user(id)?
        .map(|user| Json(user.summary()))
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

#[instrument(skip(store, body))]
async fn create_game(
    State(store): State<GameStore>,
    body: Result<Json<NewGameRecord>, JsonRejection>,
) -> Result<Json<GameRecord>, ApiError> {
    let Json(new_game) = body.map_err(|e| {
        debug!(error = %e, "Rejected game body");
        ApiError::BadRequest("Invalid game data".into())
    })?;
    Ok(Json(store.create_game(new_game)?))
}

#[instrument(skip(store))]
async fn get_game(
    State(store): State<GameStore>,
    Path(id): Path<String>,
) -> Result<Json<GameRecord>, ApiError> {
    let id = parse_id(&id, "Invalid game ID")?;
    store
        .get_game(id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))
}

#[instrument(skip(store, body))]
async fn update_game(
    State(store): State<GameStore>,
    Path(id): Path<String>,
    body: Result<Json<GameUpdate>, JsonRejection>,
) -> Result<Json<GameRecord>, ApiError> {
    let id = parse_id(&id, "Invalid update data")?;
    let Json(update) = body.map_err(|e| {
        debug!(error = %e, "Rejected update body");
        ApiError::BadRequest("Invalid update data".into())
    })?;
    store
        .update_game(id, update)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))
}

#[instrument(skip(store, query))]
async fn list_games(
    State(store): State<GameStore>,
    query: Result<Query<GamesQuery>, QueryRejection>,
) -> Result<Json<Vec<GameRecord>>, ApiError> {
    let Query(query) = query.map_err(|e| {
        debug!(error = %e, "Rejected query");
        ApiError::BadRequest("Invalid query parameters".into())
    })?;
    // A zero id names no user and falls back to the active list.
    let games = match query.user_id.filter(|id| *id != 0) {
        Some(user_id) => store.list_user_games(user_id)?,
        None => store.list_active_games()?,
    };
    Ok(Json(games))
}

#[instrument(skip(store, body))]
async fn record_move(
    State(store): State<GameStore>,
    Path(id): Path<String>,
    body: Result<Json<MoveSubmission>, JsonRejection>,
) -> Result<Json<GameRecord>, ApiError> {
    let id = parse_id(&id, "Invalid move data")?;
    let Json(submission) = body.map_err(|e| {
        debug!(error = %e, "Rejected move body");
        ApiError::BadRequest("Invalid move data".into())
    })?;
    if submission.mv.trim().is_empty() {
        return Err(ApiError::BadRequest("Invalid move data".into()));
    }
    store
        .record_move(id, submission)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Game not found".into()))
}
