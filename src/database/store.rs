//! Document operations the managers rely on.
//!
//! Every player-array edit is a set operation (add-to-set / pull), so a
//! step that is retried after a partial failure converges instead of
//! duplicating entries.

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::models::stat::Stat;
use crate::models::team::{Match, Team};
use crate::models::user::{ProfilePatch, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique field (email, team name) already holds this value.
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("{0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // ----- users -----
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>>;
    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Users whose team reference points at `team_id`.
    async fn users_on_team(&self, team_id: &ObjectId) -> StoreResult<Vec<User>>;
    async fn update_profile(&self, id: &ObjectId, patch: &ProfilePatch) -> StoreResult<Option<User>>;
    async fn set_user_team(&self, id: &ObjectId, team: Option<&ObjectId>) -> StoreResult<bool>;
    /// Unset the team reference of `id` only if it still points at `team_id`.
    async fn release_user(&self, id: &ObjectId, team_id: &ObjectId) -> StoreResult<bool>;
    /// Unset the team reference of every user pointing at `team_id`.
    async fn release_team_members(&self, team_id: &ObjectId) -> StoreResult<u64>;
    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool>;

    // ----- teams -----
    async fn insert_team(&self, team: &Team) -> StoreResult<()>;
    async fn find_team(&self, id: &ObjectId) -> StoreResult<Option<Team>>;
    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>>;
    async fn list_teams(&self) -> StoreResult<Vec<Team>>;
    /// Set only the name; the player list is edited through add/pull.
    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<bool>;
    async fn add_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool>;
    async fn pull_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool>;
    /// Pull `user_id` out of every team's player list.
    async fn pull_player_everywhere(&self, user_id: &ObjectId) -> StoreResult<u64>;
    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool>;

    // ----- embedded matches -----
    async fn push_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool>;
    async fn replace_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool>;
    async fn pull_match(&self, team_id: &ObjectId, match_id: &ObjectId) -> StoreResult<bool>;
    async fn set_record(&self, team_id: &ObjectId, wins: u32, losses: u32) -> StoreResult<bool>;

    // ----- stats -----
    async fn insert_stat(&self, stat: &Stat) -> StoreResult<()>;
    /// Newest first.
    async fn stats_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Stat>>;
    /// Newest first.
    async fn stats_for_team(&self, team_id: &ObjectId) -> StoreResult<Vec<Stat>>;
}
