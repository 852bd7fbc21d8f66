pub mod auth;
pub mod matches;
pub mod stats;
pub mod teams;
pub mod users;

use mongodb::bson::oid::ObjectId;

use crate::errors::{AppError, Result};

/// Parse a path or body id, naming what it was meant to identify.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<ObjectId> {
    ObjectId::parse_str(raw.trim()).map_err(|_| AppError::InvalidObjectId(format!("{} '{}'", what, raw)))
}

pub(crate) fn parse_ids(raw: &[String], what: &str) -> Result<Vec<ObjectId>> {
    raw.iter().map(|id| parse_id(id, what)).collect()
}
