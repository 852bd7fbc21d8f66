use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use mongodb::bson::oid::ObjectId;
use serde::Serialize;

use crate::dtos::team_dtos::{MatchRequest, TeamResponse, UpdateMatchRequest};
use crate::errors::{AppError, Result};
use crate::handlers::parse_id;
use crate::handlers::teams::populate;
use crate::middleware::auth::AuthUser;
use crate::services::matches::MatchManager;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchAdded {
    pub match_id: String,
    pub team: TeamResponse,
}

fn own_team(actor: &AuthUser) -> Result<ObjectId> {
    actor
        .team
        .ok_or_else(|| AppError::not_found("You are not assigned to a team"))
}

async fn add(state: &AppState, actor: &AuthUser, team_id: ObjectId, payload: MatchRequest) -> Result<(StatusCode, Json<MatchAdded>)> {
    let input = payload.validate()?;
    let manager = MatchManager::new(state.store.clone());
    let (team, match_id) = manager.add_match(actor, &team_id, input).await?;

    Ok((
        StatusCode::CREATED,
        Json(MatchAdded {
            match_id: match_id.to_hex(),
            team: populate(state.store.as_ref(), &team).await?,
        }),
    ))
}

async fn edit(
    state: &AppState,
    actor: &AuthUser,
    team_id: ObjectId,
    match_id: &str,
    payload: UpdateMatchRequest,
) -> Result<Json<TeamResponse>> {
    let match_id = parse_id(match_id, "match")?;
    let changes = payload.validate()?;
    let manager = MatchManager::new(state.store.clone());
    let team = manager.edit_match(actor, &team_id, &match_id, changes).await?;

    Ok(Json(populate(state.store.as_ref(), &team).await?))
}

async fn remove(state: &AppState, actor: &AuthUser, team_id: ObjectId, match_id: &str) -> Result<Json<TeamResponse>> {
    let match_id = parse_id(match_id, "match")?;
    let manager = MatchManager::new(state.store.clone());
    let team = manager.delete_match(actor, &team_id, &match_id).await?;

    Ok(Json(populate(state.store.as_ref(), &team).await?))
}

pub async fn add_my_team_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<MatchRequest>,
) -> Result<(StatusCode, Json<MatchAdded>)> {
    let team_id = own_team(&actor)?;
    add(&state, &actor, team_id, payload).await
}

pub async fn update_my_team_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(match_id): Path<String>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<TeamResponse>> {
    let team_id = own_team(&actor)?;
    edit(&state, &actor, team_id, &match_id, payload).await
}

pub async fn delete_my_team_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(match_id): Path<String>,
) -> Result<Json<TeamResponse>> {
    let team_id = own_team(&actor)?;
    remove(&state, &actor, team_id, &match_id).await
}

pub async fn add_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(team_id): Path<String>,
    Json(payload): Json<MatchRequest>,
) -> Result<(StatusCode, Json<MatchAdded>)> {
    let team_id = parse_id(&team_id, "team")?;
    add(&state, &actor, team_id, payload).await
}

pub async fn update_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path((team_id, match_id)): Path<(String, String)>,
    Json(payload): Json<UpdateMatchRequest>,
) -> Result<Json<TeamResponse>> {
    let team_id = parse_id(&team_id, "team")?;
    edit(&state, &actor, team_id, &match_id, payload).await
}

pub async fn delete_match(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path((team_id, match_id)): Path<(String, String)>,
) -> Result<Json<TeamResponse>> {
    let team_id = parse_id(&team_id, "team")?;
    remove(&state, &actor, team_id, &match_id).await
}
