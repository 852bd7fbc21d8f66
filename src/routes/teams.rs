use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::handlers::{matches, teams};
use crate::middleware::auth::require_auth;
use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", get(teams::list_teams).post(teams::create_team))
        .route("/my-team", get(teams::get_my_team))
        .route("/my-team/matches", post(matches::add_my_team_match))
        .route(
            "/my-team/matches/:matchId",
            put(matches::update_my_team_match).delete(matches::delete_my_team_match),
        )
        .route(
            "/:id",
            get(teams::get_team)
                .put(teams::update_team)
                .delete(teams::delete_team),
        )
        .route("/:id/matches", post(matches::add_match))
        .route(
            "/:id/matches/:matchId",
            put(matches::update_match).delete(matches::delete_match),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/public", get(teams::public_teams))
        .merge(protected)
}
