use mongodb::bson::oid::ObjectId;
use std::sync::Arc;

use crate::database::Store;
use crate::dtos::team_dtos::{MatchChanges, NewMatch};
use crate::errors::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::team::{Match, Outcome, Score, Team};

/// Ties have no place in the win/loss record, so they are refused at input.
pub fn reject_tie(score: &Score) -> Result<()> {
    if score.outcome() == Outcome::Tie {
        return Err(AppError::invalid_field(
            "score",
            format!("Tied scores ({}-{}) cannot be recorded", score.us, score.them),
        ));
    }
    Ok(())
}

/// Appends, edits and removes the matches embedded in a team, and keeps
/// the team's cached wins/losses equal to a recount of its match list.
pub struct MatchManager {
    store: Arc<dyn Store>,
}

impl MatchManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        MatchManager { store }
    }

    async fn load_team(&self, team_id: &ObjectId) -> Result<Team> {
        self.store
            .find_team(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team not found"))
    }

    /// Recount wins/losses from the stored match list and write them back.
    async fn sync_record(&self, team_id: &ObjectId, completed: &str) -> Result<Team> {
        let mut team = self.load_team(team_id).await?;
        let record = team.record();

        if record.wins != team.wins || record.losses != team.losses {
            if let Err(e) = self.store.set_record(team_id, record.wins, record.losses).await {
                tracing::error!("win/loss refresh for team {} failed: {}", team_id, e);
                return Err(AppError::partial(completed, "refreshing the win/loss record"));
            }
            team.wins = record.wins;
            team.losses = record.losses;
        }

        Ok(team)
    }

    pub async fn add_match(&self, actor: &AuthUser, team_id: &ObjectId, input: NewMatch) -> Result<(Team, ObjectId)> {
        actor.require_member_or_admin(team_id)?;
        reject_tie(&input.score)?;
        self.load_team(team_id).await?;

        let m = Match {
            id: ObjectId::new(),
            date: input.date,
            location: input.location,
            opponent: input.opponent,
            score: input.score,
            video_url: input.video_url,
        };

        if !self.store.push_match(team_id, &m).await? {
            return Err(AppError::not_found("Team not found"));
        }

        tracing::info!(
            "✅ match vs {} ({}-{}) added to team {}",
            m.opponent,
            m.score.us,
            m.score.them,
            team_id
        );
        let team = self.sync_record(team_id, "match added").await?;
        Ok((team, m.id))
    }

    pub async fn edit_match(
        &self,
        actor: &AuthUser,
        team_id: &ObjectId,
        match_id: &ObjectId,
        changes: MatchChanges,
    ) -> Result<Team> {
        actor.require_member_or_admin(team_id)?;
        let team = self.load_team(team_id).await?;

        let mut m = team
            .find_match(match_id)
            .cloned()
            .ok_or_else(|| AppError::not_found("Match not found"))?;
        changes.apply(&mut m);
        reject_tie(&m.score)?;

        if !self.store.replace_match(team_id, &m).await? {
            return Err(AppError::not_found("Match not found"));
        }

        tracing::info!("✅ match {} of team {} updated", match_id, team_id);
        self.sync_record(team_id, "match updated").await
    }

    /// Stats recorded against the match are kept as history.
    pub async fn delete_match(&self, actor: &AuthUser, team_id: &ObjectId, match_id: &ObjectId) -> Result<Team> {
        actor.require_member_or_admin(team_id)?;
        self.load_team(team_id).await?;

        if !self.store.pull_match(team_id, match_id).await? {
            return Err(AppError::not_found("Match not found"));
        }

        tracing::info!("🗑️ match {} removed from team {}", match_id, team_id);
        self.sync_record(team_id, "match deleted").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_are_refused() {
        assert!(reject_tie(&Score { us: 25, them: 25 }).is_err());
        assert!(reject_tie(&Score { us: 0, them: 0 }).is_err());
        assert!(reject_tie(&Score { us: 25, them: 23 }).is_ok());
        assert!(reject_tie(&Score { us: 3, them: 25 }).is_ok());
    }
}
