use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Extension,
};

use crate::dtos::stat_dtos::{
    CompareResponse, MatchComparison, RecordStatRequest, StatResponse, StatsQuery, StatsResponse,
};
use crate::errors::{AppError, Result};
use crate::handlers::parse_id;
use crate::middleware::auth::AuthUser;
use crate::models::stat::Stat;
use crate::models::vocabulary::{vocabulary, VocabularyView};
use crate::services::aggregation::{compare, summarize, MatchFilter};
use crate::services::stats::StatRecorder;
use crate::state::AppState;

pub async fn record_stat(
    State(state): State<AppState>,
    Extension(actor): Extension<AuthUser>,
    Json(payload): Json<RecordStatRequest>,
) -> Result<(StatusCode, Json<StatResponse>)> {
    let recorder = StatRecorder::new(state.store.clone());
    let stat = recorder.record(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(StatResponse::from(stat))))
}

fn respond(stats: Vec<Stat>, query: &StatsQuery) -> Result<Json<StatsResponse>> {
    let filter = MatchFilter::from_ids(query.match_ids()?);
    let stats = filter.apply(stats);
    // Already narrowed; the fold applies the same filter again as a no-op.
    let summary = summarize(&stats, &filter);

    Ok(Json(StatsResponse {
        stats: stats.into_iter().map(StatResponse::from).collect(),
        summary,
    }))
}

fn comparisons(stats: &[Stat], query: &StatsQuery) -> Result<Json<CompareResponse>> {
    let ids = query
        .match_ids()?
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| AppError::missing_fields(vec!["matches".into()]))?;

    Ok(Json(CompareResponse {
        comparisons: compare(stats, &ids)
            .into_iter()
            .map(|(match_id, summary)| MatchComparison {
                match_id: match_id.to_hex(),
                summary,
            })
            .collect(),
    }))
}

/// Plays outlive the account that made them, so an unknown id is an
/// empty history rather than a 404.
async fn user_records(state: &AppState, user_id: &str) -> Result<Vec<Stat>> {
    let user_id = parse_id(user_id, "user")?;
    Ok(state.store.stats_for_user(&user_id).await?)
}

async fn team_records(state: &AppState, team_name: &str) -> Result<Vec<Stat>> {
    let team = state
        .store
        .find_team_by_name(team_name.trim())
        .await?
        .ok_or_else(|| AppError::not_found(format!("Team '{}' not found", team_name)))?;
    Ok(state.store.stats_for_team(&team.id).await?)
}

pub async fn user_stats(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>> {
    let stats = user_records(&state, &user_id).await?;
    respond(stats, &query)
}

pub async fn team_stats(
    State(state): State<AppState>,
    Path(team_name): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>> {
    let stats = team_records(&state, &team_name).await?;
    respond(stats, &query)
}

pub async fn compare_user_matches(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CompareResponse>> {
    let stats = user_records(&state, &user_id).await?;
    comparisons(&stats, &query)
}

pub async fn compare_team_matches(
    State(state): State<AppState>,
    Path(team_name): Path<String>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<CompareResponse>> {
    let stats = team_records(&state, &team_name).await?;
    comparisons(&stats, &query)
}

pub async fn get_vocabulary() -> Json<VocabularyView> {
    Json(vocabulary())
}
