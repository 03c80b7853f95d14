use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::api::handlers::{
    admin::admin_recalculate,
    games::{delete_game, record_game, set_game_result},
    groups::{
        add_player, create_group, get_group_overview, get_leaderboard, get_player_stats, link_player,
        remove_player,
    },
    AppState,
};

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/groups", post(create_group))
        .route("/api/groups/:id/leaderboard", get(get_leaderboard))
        .route("/api/groups/:id/overview", get(get_group_overview))
        .route("/api/groups/:id/players", post(add_player))
        .route("/api/groups/:id/players/:player_id", delete(remove_player))
        .route("/api/groups/:id/players/:player_id/stats", get(get_player_stats))
        .route("/api/groups/:id/recalculate", post(admin_recalculate))
        .route("/api/sessions/:session_id/games", post(record_game))
        .route("/api/sessions/:session_id/games/:game_id", delete(delete_game))
        .route("/api/sessions/:session_id/games/:game_id/result", put(set_game_result))
        .route("/api/players/:player_id/link", put(link_player))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
