use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,

    /// Team membership. `None` is the "no team" state; the owning
    /// team's `players` array must list this user exactly when set.
    #[serde(default)]
    pub team: Option<ObjectId>,

    pub position: Position,
    pub jersey_number: i32,

    #[serde(default)]
    pub is_admin: bool,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Outside Hitter")]
    OutsideHitter,
    #[serde(rename = "Middle Blocker")]
    MiddleBlocker,
    #[serde(rename = "Setter")]
    Setter,
    #[serde(rename = "Opposite")]
    Opposite,
    #[serde(rename = "Libero")]
    Libero,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::OutsideHitter,
        Position::MiddleBlocker,
        Position::Setter,
        Position::Opposite,
        Position::Libero,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::OutsideHitter => "Outside Hitter",
            Position::MiddleBlocker => "Middle Blocker",
            Position::Setter => "Setter",
            Position::Opposite => "Opposite",
            Position::Libero => "Libero",
        }
    }

    /// Case-insensitive lookup by label.
    pub fn parse(raw: &str) -> Option<Position> {
        let raw = raw.trim();
        Position::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(raw))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Profile fields a user (or an admin) may overwrite. `None` leaves
/// the stored value alone. Team membership is not here; it moves
/// through the roster manager.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub position: Option<Position>,
    pub jersey_number: Option<i32>,
    pub is_admin: Option<bool>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.position.is_none()
            && self.jersey_number.is_none()
            && self.is_admin.is_none()
    }

    pub fn apply(&self, user: &mut User) {
        if let Some(first_name) = &self.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            user.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        if let Some(position) = self.position {
            user.position = position;
        }
        if let Some(jersey_number) = self.jersey_number {
            user.jersey_number = jersey_number;
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}
