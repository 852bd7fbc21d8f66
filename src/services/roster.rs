//! Keeps `User.team` and `Team.players` pointing at each other.
//!
//! The store has no multi-document transactions. Each step below is a
//! set operation that can be replayed, and a failure after the first
//! write is reported as `AppError::PartialFailure` naming what landed
//! and what did not.

use mongodb::bson::oid::ObjectId;
use std::collections::HashSet;
use std::sync::Arc;

use crate::database::{Store, StoreError, StoreResult};
use crate::errors::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::team::Team;
use crate::models::user::{ProfilePatch, User};

/// Membership change between the stored roster and a requested one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterDiff {
    /// In the current roster but not the requested one, in current order.
    pub removed: Vec<ObjectId>,
    /// In the requested roster but not the current one, in requested order.
    pub added: Vec<ObjectId>,
}

impl RosterDiff {
    pub fn between(current: &[ObjectId], requested: &[ObjectId]) -> Self {
        let roster = dedup(requested);
        let wanted: HashSet<&ObjectId> = roster.iter().collect();
        let present: HashSet<&ObjectId> = current.iter().collect();

        RosterDiff {
            removed: current.iter().filter(|id| !wanted.contains(id)).copied().collect(),
            added: roster.iter().filter(|id| !present.contains(id)).copied().collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }
}

fn dedup(ids: &[ObjectId]) -> Vec<ObjectId> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(**id)).copied().collect()
}

pub fn validate_team_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::missing_fields(vec!["name".into()]));
    }
    Ok(name.to_string())
}

fn partial(completed: String, failed: String, err: StoreError) -> AppError {
    tracing::error!("roster update stopped: {}; failed while {}: {}", completed, failed, err);
    AppError::partial(completed, failed)
}

/// How a `move_user` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Moved {
    Done,
    /// The user record no longer exists; no roster gained them.
    UserGone,
    /// The target team no longer exists; the user's reference was reset.
    TeamGone,
}

/// What a roster update had written before it stopped.
fn progress(renamed: bool, changes: usize) -> String {
    if renamed {
        format!("team renamed; {} roster changes applied", changes)
    } else {
        format!("{} roster changes applied", changes)
    }
}

pub struct RosterManager {
    store: Arc<dyn Store>,
}

impl RosterManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        RosterManager { store }
    }

    /// Move one user from `from` to `to`. Pull, set, add-to-set: running
    /// it again with the same arguments changes nothing.
    async fn move_user(&self, user_id: &ObjectId, from: Option<&ObjectId>, to: Option<&ObjectId>) -> StoreResult<Moved> {
        if let Some(old) = from {
            if Some(old) != to {
                self.store.pull_player(old, user_id).await?;
            }
        }
        if !self.store.set_user_team(user_id, to).await? {
            return Ok(Moved::UserGone);
        }
        if let Some(new) = to {
            if !self.store.add_player(new, user_id).await? {
                // The team was deleted after it was looked up. Never leave
                // the user pointing at it.
                self.store.release_user(user_id, new).await?;
                return Ok(Moved::TeamGone);
            }
        }
        Ok(Moved::Done)
    }

    async fn load_team(&self, team_id: &ObjectId) -> Result<Team> {
        self.store
            .find_team(team_id)
            .await?
            .ok_or_else(|| AppError::not_found("Team not found"))
    }

    async fn load_user(&self, user_id: &ObjectId) -> Result<User> {
        self.store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))
    }

    /// Fetch every listed user, failing with the ids that do not exist.
    async fn load_users(&self, ids: &[ObjectId]) -> Result<Vec<User>> {
        let users = self.store.find_users(ids).await?;
        if users.len() != ids.len() {
            let found: HashSet<ObjectId> = users.iter().map(|u| u.id).collect();
            let missing: Vec<String> = ids
                .iter()
                .filter(|id| !found.contains(id))
                .map(|id| id.to_hex())
                .collect();
            return Err(AppError::not_found(format!("Users not found: {}", missing.join(", "))));
        }
        Ok(users)
    }

    async fn ensure_name_free(&self, name: &str, except: Option<&ObjectId>) -> Result<()> {
        if let Some(existing) = self.store.find_team_by_name(name).await? {
            if Some(&existing.id) != except {
                return Err(AppError::Conflict(format!("Team name '{}' is already taken", name)));
            }
        }
        Ok(())
    }

    pub async fn create_team(&self, actor: &AuthUser, name: &str, players: &[ObjectId]) -> Result<Team> {
        actor.require_admin()?;
        let name = validate_team_name(name)?;
        let players = dedup(players);
        let users = self.load_users(&players).await?;
        self.ensure_name_free(&name, None).await?;

        let team = Team::new(name, players);
        self.store.insert_team(&team).await?;

        for (done, user) in users.iter().enumerate() {
            let step = format!("assigning player {}", user.id);
            let completed = || format!("team '{}' created; {} of {} players assigned", team.name, done, users.len());
            match self.move_user(&user.id, user.team.as_ref(), Some(&team.id)).await {
                Ok(Moved::Done) => {}
                Ok(Moved::UserGone) => {
                    tracing::warn!("player {} was deleted while team '{}' was created", user.id, team.name);
                    if let Err(e) = self.store.pull_player(&team.id, &user.id).await {
                        return Err(partial(completed(), step, e));
                    }
                }
                Ok(Moved::TeamGone) => return Err(AppError::not_found("Team not found")),
                Err(e) => return Err(partial(completed(), step, e)),
            }
        }

        tracing::info!("✅ team '{}' created with {} players", team.name, users.len());
        self.load_team(&team.id).await
    }

    pub async fn update_team(
        &self,
        actor: &AuthUser,
        team_id: &ObjectId,
        name: Option<&str>,
        players: Option<&[ObjectId]>,
    ) -> Result<Team> {
        actor.require_admin()?;
        let team = self.load_team(team_id).await?;

        let name = match name {
            Some(raw) => validate_team_name(raw)?,
            None => team.name.clone(),
        };
        let renamed = name != team.name;
        if renamed {
            self.ensure_name_free(&name, Some(team_id)).await?;
        }

        // Absent `players` leaves the roster untouched.
        let diff = match players {
            Some(requested) => RosterDiff::between(&team.players, requested),
            None => RosterDiff::default(),
        };
        let added = self.load_users(&diff.added).await?;

        if renamed {
            match self.store.rename_team(team_id, &name).await {
                Ok(true) => {}
                Ok(false) => return Err(AppError::not_found("Team not found")),
                Err(StoreError::Duplicate(_)) => {
                    return Err(AppError::Conflict(format!("Team name '{}' is already taken", name)));
                }
                Err(e) => return Err(e.into()),
            }
        }

        // Membership is edited one player at a time with pull and
        // add-to-set, so players who joined or left through another
        // request since `team` was read keep their place.
        let mut touched = 0;
        for user_id in &diff.removed {
            // Only clear users still pointing here; anyone reassigned
            // elsewhere in the meantime keeps their new team.
            let released = match self.store.release_user(user_id, team_id).await {
                Ok(_) => self.store.pull_player(team_id, user_id).await,
                Err(e) => Err(e),
            };
            if let Err(e) = released {
                return Err(partial(progress(renamed, touched), format!("removing player {}", user_id), e));
            }
            touched += 1;
        }
        for user in &added {
            match self.move_user(&user.id, user.team.as_ref(), Some(team_id)).await {
                Ok(Moved::Done) => touched += 1,
                Ok(Moved::UserGone) => {
                    tracing::warn!("player {} was deleted before joining team {}", user.id, team_id);
                }
                Ok(Moved::TeamGone) => return Err(AppError::not_found("Team not found")),
                Err(e) => {
                    return Err(partial(progress(renamed, touched), format!("adding player {}", user.id), e));
                }
            }
        }

        tracing::info!(
            "✅ team {} updated: {} added, {} removed",
            team_id,
            diff.added.len(),
            diff.removed.len()
        );
        self.load_team(team_id).await
    }

    pub async fn delete_team(&self, actor: &AuthUser, team_id: &ObjectId) -> Result<()> {
        actor.require_admin()?;
        let team = self.load_team(team_id).await?;

        // By reference rather than by `team.players`, so one-sided
        // references are cleared too.
        let released = self.store.release_team_members(team_id).await?;

        match self.store.delete_team(team_id).await {
            Ok(_) => {}
            Err(e) => {
                return Err(partial(
                    format!("{} members of '{}' unassigned", released, team.name),
                    format!("deleting team {}", team_id),
                    e,
                ));
            }
        }

        tracing::info!("🗑️ team '{}' deleted, {} members unassigned", team.name, released);
        Ok(())
    }

    pub async fn delete_user(&self, actor: &AuthUser, user_id: &ObjectId) -> Result<()> {
        actor.require_admin()?;
        let user = self.load_user(user_id).await?;

        let pulled = self.store.pull_player_everywhere(user_id).await?;
        if user.team.is_some() && pulled == 0 {
            tracing::warn!("user {} pointed at a team that did not list them", user_id);
        }

        if let Err(e) = self.store.delete_user(user_id).await {
            return Err(partial(
                format!("user {} removed from {} rosters", user_id, pulled),
                "deleting the user record".to_string(),
                e,
            ));
        }

        tracing::info!("🗑️ user {} deleted", user_id);
        Ok(())
    }

    /// Profile edit, with an optional team change (`Some(None)` leaves the team).
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        user_id: &ObjectId,
        patch: &ProfilePatch,
        team: Option<Option<ObjectId>>,
    ) -> Result<User> {
        if !actor.is_self_or_admin(user_id) {
            return Err(AppError::forbidden("Access denied: you can only edit your own profile"));
        }
        if patch.is_admin.is_some() && !actor.is_admin {
            return Err(AppError::forbidden("Access denied: only an admin can change admin rights"));
        }

        let user = self.load_user(user_id).await?;
        if let Some(Some(team_id)) = &team {
            self.load_team(team_id).await?;
        }
        if let Some(email) = &patch.email {
            if let Some(holder) = self.store.find_user_by_email(email).await? {
                if &holder.id != user_id {
                    return Err(AppError::Conflict("A user with this email already exists".into()));
                }
            }
        }

        let user = if patch.is_empty() {
            user
        } else {
            self.store
                .update_profile(user_id, patch)
                .await?
                .ok_or_else(|| AppError::not_found("User not found"))?
        };

        if let Some(target) = team {
            match self.move_user(user_id, user.team.as_ref(), target.as_ref()).await {
                Ok(Moved::Done) => {}
                Ok(Moved::UserGone) => return Err(AppError::not_found("User not found")),
                Ok(Moved::TeamGone) => return Err(AppError::not_found("Team not found")),
                Err(e) => {
                    let completed = if patch.is_empty() {
                        "nothing".to_string()
                    } else {
                        format!("profile of user {} saved", user_id)
                    };
                    return Err(partial(completed, format!("moving user {} to a new team", user_id), e));
                }
            }
        }

        self.load_user(user_id).await
    }

    /// Attach a freshly created account to the team it signed up for.
    pub async fn join_on_signup(&self, user: &User, team_id: &ObjectId) -> Result<()> {
        match self.move_user(&user.id, None, Some(team_id)).await {
            Ok(Moved::Done) => Ok(()),
            Ok(Moved::TeamGone) => Err(AppError::not_found(format!(
                "Team not found; account {} was created without a team",
                user.id
            ))),
            Ok(Moved::UserGone) => Err(AppError::internal(format!("account {} vanished during signup", user.id))),
            Err(e) => Err(partial(
                format!("account {} created", user.id),
                format!("joining team {}", team_id),
                e,
            )),
        }
    }

    pub async fn team_exists(&self, team_id: &ObjectId) -> Result<bool> {
        Ok(self.store.find_team(team_id).await?.is_some())
    }
}
