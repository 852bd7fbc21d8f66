use serde::{Deserialize, Deserializer};
use validator::Validate;

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "First name cannot be empty"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, message = "Last name cannot be empty"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Email is not valid"))]
    pub email: Option<String>,

    pub position: Option<String>,

    #[validate(range(min = 0, max = 99, message = "Jersey number must be 0-99"))]
    pub jersey_number: Option<i64>,

    /// Team id to join, `null` to leave the current team, absent to keep it.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub team_id: Option<Option<String>>,

    pub is_admin: Option<bool>,
}
