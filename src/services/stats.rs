use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::database::Store;
use crate::dtos::stat_dtos::RecordStatRequest;
use crate::errors::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stat::Stat;
use crate::models::team::Team;
use crate::models::vocabulary::Action;

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_field_id(field: &str, raw: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| AppError::invalid_field(field, format!("{} is not a valid id", field)))
}

/// A play that passed field validation but whose references have not
/// been resolved yet.
#[derive(Debug)]
pub struct PlayInput {
    pub user_id: ObjectId,
    pub team_name: String,
    pub action: Action,
    pub result: &'static str,
    pub player_name: String,
    pub match_id: ObjectId,
}

impl PlayInput {
    /// Every missing field is reported in one error.
    pub fn parse(request: RecordStatRequest) -> Result<Self> {
        let fields = [
            ("userId", present(request.user_id)),
            ("teamName", present(request.team_name)),
            ("action", present(request.action)),
            ("result", present(request.result)),
            ("playerName", present(request.player_name)),
            ("matchId", present(request.match_id)),
        ];

        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::missing_fields(missing));
        }

        let [user_id, team_name, action, result, player_name, match_id] =
            fields.map(|(_, value)| value.unwrap_or_default());

        let action = Action::parse(&action)
            .ok_or_else(|| AppError::invalid_field("action", format!("Unknown action '{}'", action)))?;
        let result = action.canonical_result(&result).ok_or_else(|| {
            AppError::invalid_field(
                "result",
                format!(
                    "'{}' is not a result for {}; expected one of: {}",
                    result,
                    action,
                    action.results().join(", ")
                ),
            )
        })?;

        Ok(PlayInput {
            user_id: parse_field_id("userId", &user_id)?,
            team_name,
            action,
            result,
            player_name,
            match_id: parse_field_id("matchId", &match_id)?,
        })
    }
}

pub struct StatRecorder {
    store: Arc<dyn Store>,
}

impl StatRecorder {
    pub fn new(store: Arc<dyn Store>) -> Self {
        StatRecorder { store }
    }

    pub async fn record(&self, actor: &AuthUser, request: RecordStatRequest) -> Result<Stat> {
        let play = PlayInput::parse(request)?;

        let team: Team = self
            .store
            .find_team_by_name(&play.team_name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Team '{}' not found", play.team_name)))?;
        actor.require_member_or_admin(&team.id)?;

        if team.find_match(&play.match_id).is_none() {
            return Err(AppError::MatchNotInTeam(play.match_id.to_hex()));
        }

        if self.store.find_user(&play.user_id).await?.is_none() {
            return Err(AppError::not_found("User not found"));
        }

        let stat = Stat {
            id: ObjectId::new(),
            user_id: play.user_id,
            team_id: team.id,
            team_name: team.name,
            player_name: play.player_name,
            action: play.action,
            result: play.result.to_string(),
            match_id: play.match_id,
            timestamp: Utc::now(),
        };
        self.store.insert_stat(&stat).await?;

        tracing::info!(
            "✅ recorded {} / {} for {} in match {}",
            stat.action,
            stat.result,
            stat.player_name,
            stat.match_id
        );
        Ok(stat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> RecordStatRequest {
        RecordStatRequest {
            user_id: Some(ObjectId::new().to_hex()),
            team_name: Some("Aces".into()),
            action: Some("serve".into()),
            result: Some("ace".into()),
            player_name: Some("Ana Lima".into()),
            match_id: Some(ObjectId::new().to_hex()),
        }
    }

    #[test]
    fn every_missing_field_is_named() {
        let request = RecordStatRequest {
            team_name: Some("Aces".into()),
            action: Some("  ".into()),
            player_name: Some("Ana Lima".into()),
            ..Default::default()
        };

        match PlayInput::parse(request) {
            Err(AppError::Validation { fields, .. }) => {
                assert_eq!(fields, vec!["userId", "action", "result", "matchId"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn action_and_result_are_canonicalised() {
        let play = PlayInput::parse(full_request()).unwrap();
        assert_eq!(play.action, Action::Serve);
        assert_eq!(play.result, "Ace");
    }

    #[test]
    fn result_must_belong_to_action() {
        let request = RecordStatRequest {
            result: Some("Kill".into()),
            ..full_request()
        };
        match PlayInput::parse(request) {
            Err(AppError::Validation { fields, .. }) => assert_eq!(fields, vec!["result"]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_actions_are_rejected() {
        let request = RecordStatRequest {
            action: Some("Tip".into()),
            ..full_request()
        };
        assert!(PlayInput::parse(request).is_err());
    }
}
