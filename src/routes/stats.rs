use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::stats;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(stats::record_stat))
        .route("/vocabulary", get(stats::get_vocabulary))
        .route("/user/:userId", get(stats::user_stats))
        .route("/user/:userId/compare", get(stats::compare_user_matches))
        .route("/team/:teamName", get(stats::team_stats))
        .route("/team/:teamName/compare", get(stats::compare_team_matches))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
