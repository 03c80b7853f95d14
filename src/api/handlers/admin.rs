use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::{internal_error, is_authorized, AppState};
use crate::database;
use crate::services::outcome::OutcomeProcessor;
use crate::services::recalculation::RecalculationService;

pub async fn admin_recalculate(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<String>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if !is_authorized(&headers, &state.config.server.admin_token) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let mut conn = match state.connection() {
        Ok(conn) => conn,
        Err(response) => return response,
    };

    match database::groups::find_by_id(&mut conn, &group_id) {
        Ok(Some(_)) => {}
        Ok(None) => return (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => return internal_error(e),
    }

    log::info!("Admin triggered recalculation of group {}", group_id);
    let _guard = state.lock_writes();
    let service = RecalculationService::new(OutcomeProcessor::new(state.config.rating.clone()));
    match service.recalculate_group(&mut conn, &group_id) {
        Ok(summary) => Json(summary).into_response(),
        Err(e) => internal_error(e),
    }
}
