use axum::{middleware, routing::get, Router};

use crate::handlers::users;
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(users::list_users))
        .route("/me", get(users::get_me))
        .route("/team/:teamName", get(users::get_team_members))
        .route(
            "/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}
