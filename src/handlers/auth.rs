use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use validator::Validate;

use crate::dtos::auth_dtos::{
    normalize_email, AuthResponse, CheckEmailRequest, CheckEmailResponse, LoginRequest, SignupRequest,
    UserResponse,
};
use crate::errors::{AppError, Result};
use crate::handlers::parse_id;
use crate::models::user::{Position, User};
use crate::services::auth::{check_password, hash_password};
use crate::services::roster::RosterManager;
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    Json(mut payload): Json<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    // Surrounding whitespace is not part of the address.
    payload.email = payload.email.as_deref().map(normalize_email);
    payload.validate()?;

    // `validate` guarantees every required field is present.
    let email = payload.email.take().unwrap_or_default();
    let position_raw = payload.position.as_deref().unwrap_or_default();
    let position = Position::parse(position_raw)
        .ok_or_else(|| AppError::invalid_field("position", format!("Unknown position '{}'", position_raw)))?;

    let team_id = match payload.team_id.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "team")?),
        _ => None,
    };

    let roster = RosterManager::new(state.store.clone());
    if let Some(team_id) = &team_id {
        if !roster.team_exists(team_id).await? {
            return Err(AppError::not_found("Team not found"));
        }
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("A user with this email already exists".into()));
    }

    let now = Utc::now();
    let user = User {
        id: ObjectId::new(),
        first_name: payload.first_name.unwrap_or_default().trim().to_string(),
        last_name: payload.last_name.unwrap_or_default().trim().to_string(),
        password_hash: hash_password(payload.password.as_deref().unwrap_or_default())?,
        is_admin: state.config.is_bootstrap_admin(&email),
        email,
        team: None,
        position,
        jersey_number: payload.jersey_number.unwrap_or_default() as i32,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_user(&user).await?;
    tracing::info!("✅ user {} signed up", user.id);

    if let Some(team_id) = &team_id {
        roster.join_on_signup(&user, team_id).await?;
    }

    let token = state.tokens.issue(&user.id)?;
    let user = state
        .store
        .find_user(&user.id)
        .await?
        .ok_or_else(|| AppError::internal("user vanished right after signup"))?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully".into(),
            token,
            user: UserResponse::from(user),
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);

    // Unknown email and wrong password look the same to the caller.
    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;
    check_password(&payload.password, &user)?;

    let token = state.tokens.issue(&user.id)?;
    tracing::info!("user {} logged in", user.id);

    Ok(Json(AuthResponse {
        message: "Logged in successfully".into(),
        token,
        user: UserResponse::from(user),
    }))
}

pub async fn check_email(
    State(state): State<AppState>,
    Json(payload): Json<CheckEmailRequest>,
) -> Result<Json<CheckEmailResponse>> {
    let email = normalize_email(&payload.email);
    if email.is_empty() {
        return Err(AppError::missing_fields(vec!["email".into()]));
    }

    let taken = state.store.find_user_by_email(&email).await?.is_some();
    Ok(Json(CheckEmailResponse { available: !taken }))
}
