use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Extension,
};
use serde_json::{json, Value};

use crate::database::Store;
use crate::dtos::team_dtos::{CreateTeamRequest, PublicTeam, TeamResponse, UpdateTeamRequest};
use crate::errors::{AppError, Result};
use crate::handlers::{parse_id, parse_ids};
use crate::middleware::auth::AuthUser;
use crate::models::team::Team;
use crate::services::roster::RosterManager;
use crate::state::AppState;

/// Team with its player documents filled in.
pub(crate) async fn populate(store: &dyn Store, team: &Team) -> Result<TeamResponse> {
    let players = store.find_users(&team.players).await?;
    if players.len() != team.players.len() {
        tracing::warn!(
            "team {} lists {} players but only {} exist",
            team.id,
            team.players.len(),
            players.len()
        );
    }
    Ok(TeamResponse::build(team, players))
}

/// Names only; no token required so signup forms can offer a team.
pub async fn public_teams(State(state): State<AppState>) -> Result<Json<Vec<PublicTeam>>> {
    let teams = state.store.list_teams().await?;
    Ok(Json(
        teams
            .into_iter()
            .map(|t| PublicTeam {
                id: t.id.to_hex(),
                name: t.name,
            })
            .collect(),
    ))
}

pub async fn list_teams(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<Vec<TeamResponse>>> {
    actor.require_admin()?;

    let teams = state.store.list_teams().await?;
    let mut populated = Vec::with_capacity(teams.len());
    for team in &teams {
        populated.push(populate(state.store.as_ref(), team).await?);
    }
    Ok(Json(populated))
}

pub async fn get_my_team(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<TeamResponse>> {
    let team_id = actor
        .team
        .ok_or_else(|| AppError::not_found("You are not assigned to a team"))?;
    let team = state
        .store
        .find_team(&team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    Ok(Json(populate(state.store.as_ref(), &team).await?))
}

pub async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TeamResponse>> {
    let team_id = parse_id(&id, "team")?;
    let team = state
        .store
        .find_team(&team_id)
        .await?
        .ok_or_else(|| AppError::not_found("Team not found"))?;

    Ok(Json(populate(state.store.as_ref(), &team).await?))
}

pub async fn create_team(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<CreateTeamRequest>,
) -> Result<(StatusCode, Json<TeamResponse>)> {
    let name = payload.name.unwrap_or_default();
    let players = parse_ids(&payload.players, "player")?;

    let roster = RosterManager::new(state.store.clone());
    let team = roster.create_team(&actor, &name, &players).await?;

    Ok((StatusCode::CREATED, Json(populate(state.store.as_ref(), &team).await?)))
}

pub async fn update_team(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateTeamRequest>,
) -> Result<Json<TeamResponse>> {
    let team_id = parse_id(&id, "team")?;
    let players = match &payload.players {
        Some(raw) => Some(parse_ids(raw, "player")?),
        None => None,
    };

    let roster = RosterManager::new(state.store.clone());
    let team = roster
        .update_team(&actor, &team_id, payload.name.as_deref(), players.as_deref())
        .await?;

    Ok(Json(populate(state.store.as_ref(), &team).await?))
}

pub async fn delete_team(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let team_id = parse_id(&id, "team")?;

    let roster = RosterManager::new(state.store.clone());
    roster.delete_team(&actor, &team_id).await?;

    Ok(Json(json!({ "message": "Team deleted successfully" })))
}
