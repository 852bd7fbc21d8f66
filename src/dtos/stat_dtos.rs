use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::models::stat::Stat;
use crate::models::vocabulary::Action;
use crate::services::aggregation::StatSummary;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordStatRequest {
    pub user_id: Option<String>,
    pub team_name: Option<String>,
    pub action: Option<String>,
    pub result: Option<String>,
    pub player_name: Option<String>,
    pub match_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatResponse {
    pub id: String,
    pub user_id: String,
    pub team_id: String,
    pub team_name: String,
    pub player_name: String,
    pub action: Action,
    pub result: String,
    pub match_id: String,
    pub timestamp: DateTime<Utc>,
}

impl From<Stat> for StatResponse {
    fn from(stat: Stat) -> Self {
        StatResponse {
            id: stat.id.to_hex(),
            user_id: stat.user_id.to_hex(),
            team_id: stat.team_id.to_hex(),
            team_name: stat.team_name,
            player_name: stat.player_name,
            action: stat.action,
            result: stat.result,
            match_id: stat.match_id.to_hex(),
            timestamp: stat.timestamp,
        }
    }
}

/// `?matches=<id>,<id>` narrows the records before they are folded.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub matches: Option<String>,
}

impl StatsQuery {
    pub fn match_ids(&self) -> Result<Option<Vec<ObjectId>>> {
        let raw = match self.matches.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Ok(None),
        };

        raw.split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| {
                ObjectId::parse_str(id)
                    .map_err(|_| AppError::invalid_field("matches", format!("Invalid match id '{}'", id)))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub stats: Vec<StatResponse>,
    pub summary: StatSummary,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchComparison {
    pub match_id: String,
    pub summary: StatSummary,
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub comparisons: Vec<MatchComparison>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_filter_parses_comma_list() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        let query = StatsQuery {
            matches: Some(format!("{}, {},", a.to_hex(), b.to_hex())),
        };
        assert_eq!(query.match_ids().unwrap(), Some(vec![a, b]));
    }

    #[test]
    fn empty_match_filter_means_everything() {
        assert_eq!(StatsQuery::default().match_ids().unwrap(), None);
        let blank = StatsQuery { matches: Some("  ".into()) };
        assert_eq!(blank.match_ids().unwrap(), None);
    }

    #[test]
    fn bad_match_ids_are_rejected() {
        let query = StatsQuery { matches: Some("nope".into()) };
        assert!(query.match_ids().is_err());
    }
}
