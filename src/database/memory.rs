use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::database::store::{Store, StoreError, StoreResult};
use crate::models::stat::Stat;
use crate::models::team::{Match, Team};
use crate::models::user::{ProfilePatch, User};

/// In-process store with the same uniqueness rules as the MongoDB
/// collections. Selected with `DATABASE_URL=memory://`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

#[derive(Default)]
struct Collections {
    users: HashMap<ObjectId, User>,
    teams: HashMap<ObjectId, Team>,
    stats: Vec<Stat>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first(mut stats: Vec<Stat>) -> Vec<Stat> {
    stats.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    stats
}

fn by_creation(mut users: Vec<User>) -> Vec<User> {
    users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    users
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email".into()));
        }
        db.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &ObjectId) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_users(&self, ids: &[ObjectId]) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(ids.iter().filter_map(|id| db.users.get(id).cloned()).collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        Ok(by_creation(db.users.values().cloned().collect()))
    }

    async fn users_on_team(&self, team_id: &ObjectId) -> StoreResult<Vec<User>> {
        let db = self.inner.read().await;
        let members = db
            .users
            .values()
            .filter(|u| u.team.as_ref() == Some(team_id))
            .cloned()
            .collect();
        Ok(by_creation(members))
    }

    async fn update_profile(&self, id: &ObjectId, patch: &ProfilePatch) -> StoreResult<Option<User>> {
        let mut db = self.inner.write().await;
        if let Some(email) = &patch.email {
            if db.users.values().any(|u| &u.email == email && &u.id != id) {
                return Err(StoreError::Duplicate("email".into()));
            }
        }
        Ok(db.users.get_mut(id).map(|user| {
            patch.apply(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn set_user_team(&self, id: &ObjectId, team: Option<&ObjectId>) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.users.get_mut(id) {
            Some(user) => {
                user.team = team.copied();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn release_user(&self, id: &ObjectId, team_id: &ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.users.get_mut(id) {
            Some(user) if user.team.as_ref() == Some(team_id) => {
                user.team = None;
                user.updated_at = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn release_team_members(&self, team_id: &ObjectId) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let mut released = 0;
        for user in db.users.values_mut() {
            if user.team.as_ref() == Some(team_id) {
                user.team = None;
                user.updated_at = Utc::now();
                released += 1;
            }
        }
        Ok(released)
    }

    async fn delete_user(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.inner.write().await.users.remove(id).is_some())
    }

    async fn insert_team(&self, team: &Team) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.teams.values().any(|t| t.name == team.name) {
            return Err(StoreError::Duplicate("team name".into()));
        }
        db.teams.insert(team.id, team.clone());
        Ok(())
    }

    async fn find_team(&self, id: &ObjectId) -> StoreResult<Option<Team>> {
        Ok(self.inner.read().await.teams.get(id).cloned())
    }

    async fn find_team_by_name(&self, name: &str) -> StoreResult<Option<Team>> {
        let db = self.inner.read().await;
        Ok(db.teams.values().find(|t| t.name == name).cloned())
    }

    async fn list_teams(&self) -> StoreResult<Vec<Team>> {
        let db = self.inner.read().await;
        let mut teams: Vec<Team> = db.teams.values().cloned().collect();
        teams.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(teams)
    }

    async fn rename_team(&self, id: &ObjectId, name: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        if db.teams.values().any(|t| t.name == name && &t.id != id) {
            return Err(StoreError::Duplicate("team name".into()));
        }
        Ok(match db.teams.get_mut(id) {
            Some(team) => {
                team.name = name.to_string();
                team.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn add_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.teams.get_mut(team_id) {
            Some(team) => {
                if !team.players.contains(user_id) {
                    team.players.push(*user_id);
                }
                true
            }
            None => false,
        })
    }

    async fn pull_player(&self, team_id: &ObjectId, user_id: &ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.teams.get_mut(team_id) {
            Some(team) => {
                team.players.retain(|p| p != user_id);
                true
            }
            None => false,
        })
    }

    async fn pull_player_everywhere(&self, user_id: &ObjectId) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        let mut touched = 0;
        for team in db.teams.values_mut() {
            if team.players.contains(user_id) {
                team.players.retain(|p| p != user_id);
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete_team(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.inner.write().await.teams.remove(id).is_some())
    }

    async fn push_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.teams.get_mut(team_id) {
            Some(team) => {
                team.matches.push(m.clone());
                true
            }
            None => false,
        })
    }

    async fn replace_match(&self, team_id: &ObjectId, m: &Match) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        let slot = db
            .teams
            .get_mut(team_id)
            .and_then(|team| team.matches.iter_mut().find(|existing| existing.id == m.id));
        Ok(match slot {
            Some(existing) => {
                *existing = m.clone();
                true
            }
            None => false,
        })
    }

    async fn pull_match(&self, team_id: &ObjectId, match_id: &ObjectId) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.teams.get_mut(team_id) {
            Some(team) => {
                let before = team.matches.len();
                team.matches.retain(|m| &m.id != match_id);
                team.matches.len() != before
            }
            None => false,
        })
    }

    async fn set_record(&self, team_id: &ObjectId, wins: u32, losses: u32) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(match db.teams.get_mut(team_id) {
            Some(team) => {
                team.wins = wins;
                team.losses = losses;
                true
            }
            None => false,
        })
    }

    async fn insert_stat(&self, stat: &Stat) -> StoreResult<()> {
        self.inner.write().await.stats.push(stat.clone());
        Ok(())
    }

    async fn stats_for_user(&self, user_id: &ObjectId) -> StoreResult<Vec<Stat>> {
        let db = self.inner.read().await;
        Ok(newest_first(
            db.stats.iter().filter(|s| &s.user_id == user_id).cloned().collect(),
        ))
    }

    async fn stats_for_team(&self, team_id: &ObjectId) -> StoreResult<Vec<Stat>> {
        let db = self.inner.read().await;
        Ok(newest_first(
            db.stats.iter().filter(|s| &s.team_id == team_id).cloned().collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Position;

    fn user(email: &str, team: Option<ObjectId>) -> User {
        let now = Utc::now();
        User {
            id: ObjectId::new(),
            first_name: "Ana".into(),
            last_name: "Lee".into(),
            email: email.into(),
            password_hash: "x".into(),
            team,
            position: Position::Libero,
            jersey_number: 7,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn emails_and_team_names_are_unique() {
        let store = MemoryStore::new();
        store.insert_user(&user("ana@example.com", None)).await.unwrap();
        assert!(matches!(
            store.insert_user(&user("ana@example.com", None)).await,
            Err(StoreError::Duplicate(_))
        ));

        store.insert_team(&Team::new("Aces".into(), vec![])).await.unwrap();
        assert!(matches!(
            store.insert_team(&Team::new("Aces".into(), vec![])).await,
            Err(StoreError::Duplicate(_))
        ));
    }

    #[tokio::test]
    async fn release_leaves_reassigned_users_alone() {
        let store = MemoryStore::new();
        let (old_team, new_team) = (ObjectId::new(), ObjectId::new());
        let moved = user("ana@example.com", Some(new_team));
        store.insert_user(&moved).await.unwrap();

        assert!(!store.release_user(&moved.id, &old_team).await.unwrap());
        let stored = store.find_user(&moved.id).await.unwrap().unwrap();
        assert_eq!(stored.team, Some(new_team));

        assert!(store.release_user(&moved.id, &new_team).await.unwrap());
        let stored = store.find_user(&moved.id).await.unwrap().unwrap();
        assert_eq!(stored.team, None);
    }

    #[tokio::test]
    async fn add_player_is_a_set_insert() {
        let store = MemoryStore::new();
        let team = Team::new("Aces".into(), vec![]);
        store.insert_team(&team).await.unwrap();
        let player = ObjectId::new();

        store.add_player(&team.id, &player).await.unwrap();
        store.add_player(&team.id, &player).await.unwrap();
        assert_eq!(store.find_team(&team.id).await.unwrap().unwrap().players, vec![player]);

        assert_eq!(store.pull_player_everywhere(&player).await.unwrap(), 1);
        assert!(store.find_team(&team.id).await.unwrap().unwrap().players.is_empty());
    }
}
