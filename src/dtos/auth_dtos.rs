use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::User;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(required, length(min = 1, message = "First name is required"))]
    pub first_name: Option<String>,

    #[validate(required, length(min = 1, message = "Last name is required"))]
    pub last_name: Option<String>,

    #[validate(required, email(message = "Email is not valid"))]
    pub email: Option<String>,

    #[validate(required, length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    #[validate(required)]
    pub position: Option<String>,

    #[validate(required, range(min = 0, max = 99, message = "Jersey number must be 0-99"))]
    pub jersey_number: Option<i64>,

    /// Optional team to join right away.
    pub team_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CheckEmailRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CheckEmailResponse {
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub team: Option<String>,
    pub position: String,
    pub jersey_number: i32,
    pub is_admin: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_hex(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            team: user.team.map(|t| t.to_hex()),
            position: user.position.to_string(),
            jersey_number: user.jersey_number,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserResponse,
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
