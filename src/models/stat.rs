use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::models::vocabulary::Action;

/// One recorded play. Written once, never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stat {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub user_id: ObjectId,
    pub team_id: ObjectId,
    // Display copies taken at record time.
    pub team_name: String,
    pub player_name: String,
    pub action: Action,
    pub result: String,
    pub match_id: ObjectId,

    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
}
