use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{internal_error, AppState};
use crate::api::models::{
    AddPlayerRequest, CreateGroupRequest, GroupPlayerResponse, GroupResponse, LinkPlayerRequest,
};
use crate::database::{self, DbConn};
use crate::services::groups::GroupService;
use crate::services::statistics::StatsService;

fn group_exists(conn: &mut DbConn, group_id: &str) -> anyhow::Result<bool> {
    Ok(database::groups::find_by_id(conn, group_id)?.is_some())
}

pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match group_exists(&mut conn, &group_id) {
        Ok(true) => {}
        Ok(false) => return (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => return internal_error(e),
    }

    let service = StatsService::new(state.config.stats.clone());
    match service.get_leaderboard(&mut conn, &group_id) {
        Ok(entries) => Json(entries).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn get_group_overview(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match group_exists(&mut conn, &group_id) {
        Ok(true) => {}
        Ok(false) => return (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => return internal_error(e),
    }

    let service = StatsService::new(state.config.stats.clone());
    match service.get_group_overview(&mut conn, &group_id) {
        Ok(overview) => Json(overview).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn get_player_stats(
    State(state): State<Arc<AppState>>,
    Path((group_id, player_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let service = StatsService::new(state.config.stats.clone());
    match service.get_player_detailed_stats(&mut conn, &group_id, &player_id) {
        Ok(Some(stats)) => Json(stats).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Player not found").into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    if request.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required").into_response();
    }

    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let service = GroupService::new(state.config.rating.clone());
    match service.create_group(&mut conn, &request.name) {
        Ok(group) => (StatusCode::CREATED, Json(GroupResponse::from(group))).into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn add_player(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    Json(request): Json<AddPlayerRequest>,
) -> impl IntoResponse {
    if request.name.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, "Name is required").into_response();
    }

    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    let service = GroupService::new(state.config.rating.clone());
    match service.add_player(&mut conn, &group_id, &request.name) {
        Ok(Some(player)) => {
            (StatusCode::CREATED, Json(GroupPlayerResponse::from(player))).into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn remove_player(
    State(state): State<Arc<AppState>>,
    Path((group_id, player_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match database::group_players::find_by_id(&mut conn, &player_id) {
        Ok(Some(player)) if player.group_id == group_id => {}
        Ok(_) => return (StatusCode::NOT_FOUND, "Player not found").into_response(),
        Err(e) => return internal_error(e),
    }

    let service = GroupService::new(state.config.rating.clone());
    match service.remove_player(&mut conn, &player_id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => internal_error(e),
    }
}

pub async fn link_player(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<String>,
    Json(request): Json<LinkPlayerRequest>,
) -> impl IntoResponse {
    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match database::players::find_by_id(&mut conn, &player_id) {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Player not found").into_response(),
        Err(e) => return internal_error(e),
    }

    let _guard = state.lock_writes();
    let service = GroupService::new(state.config.rating.clone());
    match service.link_session_player(&mut conn, &player_id, request.group_player_id.as_deref()) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, format!("{:#}", e)).into_response(),
    }
}
