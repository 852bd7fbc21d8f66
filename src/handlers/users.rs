use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::dtos::auth_dtos::{normalize_email, UserResponse};
use crate::dtos::user_dtos::UpdateUserRequest;
use crate::errors::{AppError, Result};
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::models::user::{Position, ProfilePatch};
use crate::services::roster::RosterManager;
use crate::state::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>> {
    actor.require_admin()?;

    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user = state
        .store
        .find_user(&actor.id)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>> {
    let user_id = parse_id(&id, "user")?;
    let user = state
        .store
        .find_user(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserResponse::from(user)))
}

/// Members of a team, looked up by the team's display name.
pub async fn get_team_members(
    State(state): State<AppState>,
    Path(team_name): Path<String>,
) -> Result<Json<Vec<UserResponse>>> {
    let team = state
        .store
        .find_team_by_name(team_name.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Team '{}' not found", team_name)))?;

    let members = state.store.users_on_team(&team.id).await?;
    Ok(Json(members.into_iter().map(UserResponse::from).collect()))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(mut payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    let user_id = parse_id(&id, "user")?;
    payload.email = payload.email.as_deref().map(normalize_email);
    payload.validate()?;

    let position = match payload.position.as_deref() {
        Some(raw) => Some(
            Position::parse(raw)
                .ok_or_else(|| AppError::invalid_field("position", format!("Unknown position '{}'", raw)))?,
        ),
        None => None,
    };

    let patch = ProfilePatch {
        first_name: payload.first_name.map(|v| v.trim().to_string()),
        last_name: payload.last_name.map(|v| v.trim().to_string()),
        email: payload.email,
        position,
        jersey_number: payload.jersey_number.map(|n| n as i32),
        is_admin: payload.is_admin,
    };

    let team = match payload.team_id {
        Some(Some(raw)) if !raw.trim().is_empty() => Some(Some(parse_id(&raw, "team")?)),
        Some(_) => Some(None),
        None => None,
    };

    let roster = RosterManager::new(state.store.clone());
    let user = roster.update_user(&actor, &user_id, &patch, team).await?;
    Ok(Json(UserResponse::from(user)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user_id = parse_id(&id, "user")?;

    let roster = RosterManager::new(state.store.clone());
    roster.delete_user(&actor, &user_id).await?;

    Ok(Json(json!({ "message": "User deleted successfully" })))
}
