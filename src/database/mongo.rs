use async_trait::async_trait;
use chrono::Utc;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::database::store::{Store, StoreError, StoreResult};
use crate::models::stat::Stat;
use crate::models::team::{Match, Team};
use crate::models::user::{ProfilePatch, User};

const USERS: &str = "users";
const TEAMS: &str = "teams";
const STATS: &str = "stats";

const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(err: bson::ser::Error) -> Self {
        StoreError::Backend(format!("bson encoding failed: {}", err))
    }
}

/// Unique-index violations arrive as write errors from insert/update and
/// as command errors from findAndModify.
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY,
        _ => false,
    }
}

/// Classify a write error, reporting unique-index violations on `field`.
fn write_error(err: mongodb::error::Error, field: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::Duplicate(field.to_string())
    } else {
        StoreError::from(err)
    }
}

fn now() -> Bson {
    Bson::DateTime(bson::DateTime::from_chrono(Utc::now()))
}

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub fn new(db: Database) -> Self {
        MongoStore { db }
    }

    fn users(&self) -> Collection<User> {
        self.db.collection(USERS)
    }

    fn teams(&self) -> Collection<Team> {
        self.db.collection(TEAMS)
    }

    fn stats(&self) -> Collection<Stat> {
        self.db.collection(STATS)
    }

    /// Unique indexes backing the Conflict errors, plus lookup indexes
    /// for the by-reference queries.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let unique = || IndexOptions::builder().unique(true).build();

        self.users()
            .create_index(IndexModel::builder().keys(doc! { "email": 1 }).options(unique()).build())
            .await?;
        self.users()
            .create_index(IndexModel::builder().keys(doc! { "team": 1 }).build())
            .await?;
        self.teams()
            .create_index(IndexModel::builder().keys(doc! { "name": 1 }).options(unique()).build())
            .await?;
        self.stats()
            .create_index(IndexModel::builder().keys(doc! { "user_id": 1, "timestamp": -1 }).build())
            .await?;
        self.stats()
            .create_index(IndexModel::builder().keys(doc! { "team_id": 1, "timestamp": -1 }).build())
            .await?;

        tracing::info!("indexes ensured on {}, {}, {}", USERS, TEAMS, STATS);
        Ok(())
    }
}

fn profile_update(patch: &ProfilePatch) -> StoreResult<Document> {
    let mut set = doc! { "updated_at": now() };
    if let Some(first_name) = &patch.first_name {
        set.insert("first_name", first_name);
    }
    if let Some(last_name) = &patch.last_name {
        set.insert("last_name", last_name);
    }
    if let Some(email) = &patch.email {
        set.insert("email", email);
    }
    if let Some(position) = &patch.position {
        set.insert("position", bson::to_bson(position)?);
    }
    if let Some(jersey_number) = patch.jersey_number {
        set.insert("jersey_number", jersey_number);
    }
    if let Some(is_admin) = patch.is_admin {
        set.insert("is_admin", is_admin);
    }
    Ok(doc! { "$set": set })
}

fn team_ref(team: Option<&ObjectId>) -> Bson {
    match team {
        Some(id) => Bson::ObjectId(*id),
        None => Bson::Null,
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        self.users()
            .insert_one(user)
            .await
            .map_err(|e| write_error(e, "email"))?;
        Ok(())
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let cursor = self.users().find(doc! { "_id": { "$in": ids.to_vec() } }).await?;
        let found: Vec<User> = cursor.try_collect().await?;
        // Keep the caller's order.
        Ok(ids
            .iter()
            .filter_map(|id| found.iter().find(|u| &u.id == id).cloned())
            .collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let cursor = self.users().find(doc! {}).sort(doc! { "created_at": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn users_on_team(&self, team_id: &ObjectId) -> StoreResult<Vec<User>> {
        let cursor = self
            .users()
            .find(doc! { "team": team_id })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn update_profile(&self, id: &ObjectId, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        self.users()
            .find_one_and_update(doc! { "_id": id }, profile_update(patch)?)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| write_error(e, "email"))
    }

    async fn set_user_team(&self, id: &ObjectId, team: Option<&ObjectId>) -> StoreResult<bool> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "team": team_ref(team), "updated_at": now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn release_user(&self, id: &ObjectId, team_id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": id, "team": team_id },
                doc! { "$set": { "team": Bson::Null, "updated_at": now() } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn release_team_members(&self, team_id: &ObjectId) -> StoreResult<u64> {
        let result = self
            .users()
            .update_many(
                doc! { "team": team_id },
                doc! { "$set": { "team": Bson::Null, "updated_at": now() } },
            )
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self.users().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_team(&self, team: &Team) -> StoreResult<()> {
        self.teams()
            .insert_one(team)
            .await
            .map_err(|e| write_error(e, "team name"))?;
        Ok(())
    }

    async fn find_team(&self, id: &ObjectId) -> StoreResult<Option<Team>> {
        Ok(self.teams().find_one(doc! { "_id": id }).await?)
    }

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        Ok(self.teams().find_one(doc! { "name": name }).await?)
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let cursor = self.teams().find(doc! {}).sort(doc! { "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": { "name": name, "updated_at": now() } },
            )
            .await
            .map_err(|e| write_error(e, "team name"))?;
        Ok(result.matched_count > 0)
    }

    async fn add_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(doc! { "_id": team_id }, doc! { "$addToSet": { "players": user_id } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(doc! { "_id": team_id }, doc! { "$pull": { "players": user_id } })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_player_everywhere(&self, user_id: &ObjectId) -> StoreResult<u64> {
        let result = self
            .teams()
            .update_many(doc! { "players": user_id }, doc! { "$pull": { "players": user_id } })
            .await?;
        Ok(result.modified_count)
    }

    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool> {
        let result = self.teams().delete_one(doc! { "_id": id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn push_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": team_id },
                doc! { "$push": { "matches": bson::to_bson(m)? }, "$set": { "updated_at": now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn replace_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": team_id, "matches._id": m.id },
                doc! { "$set": { "matches.$": bson::to_bson(m)?, "updated_at": now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn pull_match(&self, team_id: &ObjectId, match_id: &ObjectId) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": team_id },
                doc! { "$pull": { "matches": { "_id": match_id } }, "$set": { "updated_at": now() } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }

    async fn set_record(&self, team_id: &ObjectId, wins: u32, losses: u32) -> StoreResult<bool> {
        let result = self
            .teams()
            .update_one(
                doc! { "_id": team_id },
                doc! { "$set": { "wins": wins as i64, "losses": losses as i64 } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn insert_stat(&self, stat: &Stat) -> StoreResult<()> {
        self.stats().insert_one(stat).await?;
        Ok(())
    }

    async fn stats_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Stat>> {
        let cursor = self
            .stats()
            .find(doc! { "user_id": user_id })
            .sort(doc! { "timestamp": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn stats_for_team(&self, team_id: &ObjectId) -> StoreResult<Vec<Stat>> {
        let cursor = self
            .stats()
            .find(doc! { "team_id": team_id })
            .sort(doc! { "timestamp": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::error::{CommandError, WriteError};

    fn command_error(code: i32) -> mongodb::error::Error {
        let raw: CommandError = bson::from_document(doc! {
            "code": code,
            "codeName": "DuplicateKey",
            "errmsg": "E11000 duplicate key error collection: volleytrack.users index: email_1",
        })
        .unwrap();
        mongodb::error::Error::from(ErrorKind::Command(raw))
    }

    fn write_failure(code: i32) -> mongodb::error::Error {
        let raw: WriteError = bson::from_document(doc! {
            "code": code,
            "errmsg": "E11000 duplicate key error collection: volleytrack.teams index: name_1",
        })
        .unwrap();
        mongodb::error::Error::from(ErrorKind::Write(WriteFailure::WriteError(raw)))
    }

    #[test]
    fn find_and_modify_duplicates_are_conflicts() {
        assert!(matches!(
            write_error(command_error(DUPLICATE_KEY), "email"),
            StoreError::Duplicate(field) if field == "email"
        ));
    }

    #[test]
    fn insert_duplicates_are_conflicts() {
        assert!(matches!(
            write_error(write_failure(DUPLICATE_KEY), "team name"),
            StoreError::Duplicate(field) if field == "team name"
        ));
    }

    #[test]
    fn other_failures_stay_backend_errors() {
        assert!(matches!(write_error(command_error(2), "email"), StoreError::Backend(_)));
        assert!(matches!(write_error(write_failure(121), "email"), StoreError::Backend(_)));
    }
}
