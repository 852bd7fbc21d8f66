use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::dtos::user_dtos::deserialize_some;
use crate::errors::{AppError, Result};
use crate::models::team::{Match, Score, Team};
use crate::models::user::User;

#[derive(Debug, Deserialize)]
pub struct CreateTeamRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub players: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateTeamRequest {
    pub name: Option<String>,
    /// Full replacement roster. Absent leaves the roster alone.
    pub players: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublicTeam {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
    pub jersey_number: i32,
}

impl From<User> for PlayerSummary {
    fn from(user: User) -> Self {
        PlayerSummary {
            id: user.id.to_hex(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            position: user.position.to_string(),
            jersey_number: user.jersey_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResponse {
    pub id: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub opponent: String,
    pub score: Score,
    pub video_url: Option<String>,
}

impl From<&Match> for MatchResponse {
    fn from(m: &Match) -> Self {
        MatchResponse {
            id: m.id.to_hex(),
            date: m.date,
            location: m.location.clone(),
            opponent: m.opponent.clone(),
            score: m.score,
            video_url: m.video_url.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub id: String,
    pub name: String,
    pub players: Vec<PlayerSummary>,
    pub matches: Vec<MatchResponse>,
    pub wins: u32,
    pub losses: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TeamResponse {
    /// `players` must be the team's player documents, in roster order.
    pub fn build(team: &Team, players: Vec<User>) -> Self {
        // Always derived from the match list, never from the cached counters.
        let record = team.record();
        TeamResponse {
            id: team.id.to_hex(),
            name: team.name.clone(),
            players: players.into_iter().map(PlayerSummary::from).collect(),
            matches: team.matches.iter().map(MatchResponse::from).collect(),
            wins: record.wins,
            losses: record.losses,
            created_at: team.created_at,
            updated_at: team.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ScoreInput {
    pub us: Option<i64>,
    pub them: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub date: Option<String>,
    pub location: Option<String>,
    pub opponent: Option<String>,
    pub score: Option<ScoreInput>,
    pub video_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMatchRequest {
    pub date: Option<String>,
    pub location: Option<String>,
    pub opponent: Option<String>,
    pub score: Option<ScoreInput>,
    /// `null` or an empty string removes the video link.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub video_url: Option<Option<String>>,
}

/// Validated fields for a new match.
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub date: DateTime<Utc>,
    pub location: String,
    pub opponent: String,
    pub score: Score,
    pub video_url: Option<String>,
}

/// Validated edits; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct MatchChanges {
    pub date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub opponent: Option<String>,
    pub us: Option<u32>,
    pub them: Option<u32>,
    pub video_url: Option<Option<String>>,
}

impl MatchChanges {
    pub fn apply(&self, m: &mut Match) {
        if let Some(date) = self.date {
            m.date = date;
        }
        if let Some(location) = &self.location {
            m.location = location.clone();
        }
        if let Some(opponent) = &self.opponent {
            m.opponent = opponent.clone();
        }
        if let Some(us) = self.us {
            m.score.us = us;
        }
        if let Some(them) = self.them {
            m.score.them = them;
        }
        if let Some(video_url) = &self.video_url {
            m.video_url = video_url.clone();
        }
    }
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_match_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AppError::invalid_field("date", format!("Invalid date '{}'", raw)))
}

fn score_part(field: &str, value: i64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| AppError::invalid_field(field, format!("{} must be a non-negative integer", field)))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MatchRequest {
    pub fn validate(self) -> Result<NewMatch> {
        let location = trimmed(self.location);
        let opponent = trimmed(self.opponent);
        let date = trimmed(self.date);
        let score = self.score.unwrap_or_default();

        let mut missing = Vec::new();
        if date.is_none() {
            missing.push("date".to_string());
        }
        if location.is_none() {
            missing.push("location".to_string());
        }
        if opponent.is_none() {
            missing.push("opponent".to_string());
        }
        if score.us.is_none() {
            missing.push("score.us".to_string());
        }
        if score.them.is_none() {
            missing.push("score.them".to_string());
        }

        match (date, location, opponent, score.us, score.them) {
            (Some(date), Some(location), Some(opponent), Some(us), Some(them)) => Ok(NewMatch {
                date: parse_match_date(&date)?,
                location,
                opponent,
                score: Score {
                    us: score_part("score.us", us)?,
                    them: score_part("score.them", them)?,
                },
                video_url: trimmed(self.video_url),
            }),
            _ => Err(AppError::missing_fields(missing)),
        }
    }
}

impl UpdateMatchRequest {
    pub fn validate(self) -> Result<MatchChanges> {
        let blank = |field: &str| AppError::invalid_field(field, format!("{} cannot be empty", field));

        let location = match self.location {
            Some(raw) => Some(trimmed(Some(raw)).ok_or_else(|| blank("location"))?),
            None => None,
        };
        let opponent = match self.opponent {
            Some(raw) => Some(trimmed(Some(raw)).ok_or_else(|| blank("opponent"))?),
            None => None,
        };
        let date = match self.date {
            Some(raw) => Some(parse_match_date(&raw)?),
            None => None,
        };
        let score = self.score.unwrap_or_default();

        Ok(MatchChanges {
            date,
            location,
            opponent,
            us: score.us.map(|v| score_part("score.us", v)).transpose()?,
            them: score.them.map(|v| score_part("score.them", v)).transpose()?,
            video_url: self.video_url.map(trimmed),
        })
    }
}
