use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::{internal_error, AppState};
use crate::api::models::GameResponse;
use crate::services::games::{GameError, GameResult, GameService, NewGame};

/// Caller mistakes become 4xx; anything else is a server error.
fn game_error(e: anyhow::Error) -> Response {
    match e.downcast_ref::<GameError>() {
        Some(GameError::SessionNotFound(_)) => (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        Some(GameError::Invalid(_)) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        None => internal_error(e),
    }
}

pub async fn record_game(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(new_game): Json<NewGame>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let _guard = state.lock_writes();
    let service = GameService::new(&state.config);
    match service.record_game(&mut conn, &session_id, new_game) {
        Ok(game) => (StatusCode::CREATED, Json(GameResponse::from(game))).into_response(),
        Err(e) => game_error(e),
    }
}

pub async fn set_game_result(
    State(state): State<Arc<AppState>>,
    Path((session_id, game_id)): Path<(String, String)>,
    Json(result): Json<GameResult>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let _guard = state.lock_writes();
    let service = GameService::new(&state.config);
    match service.set_result(&mut conn, &session_id, &game_id, result) {
        Ok(Some(game)) => Json(GameResponse::from(game)).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Game not found").into_response(),
        Err(e) => game_error(e),
    }
}

pub async fn delete_game(
    State(state): State<Arc<AppState>>,
    Path((session_id, game_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let _guard = state.lock_writes();
    let service = GameService::new(&state.config);
    match service.delete_game(&mut conn, &session_id, &game_id) {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Game not found").into_response(),
        Err(e) => internal_error(e),
    }
}
