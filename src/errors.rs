// src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::database::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation { message: String, fields: Vec<String> },

    #[error("Invalid ID: {0}")]
    InvalidObjectId(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Match {0} not found in team")]
    MatchNotInTeam(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("{0}")]
    Forbidden(String),

    /// A multi-document update stopped halfway. `completed` names the
    /// writes that landed, `failed` the step that did not.
    #[error("Partially applied: {completed}; failed while {failed}")]
    PartialFailure { completed: String, failed: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        AppError::Validation {
            message: msg.into(),
            fields: Vec::new(),
        }
    }

    pub fn invalid_field(field: &str, msg: impl Into<String>) -> Self {
        AppError::Validation {
            message: msg.into(),
            fields: vec![field.to_string()],
        }
    }

    pub fn missing_fields(fields: Vec<String>) -> Self {
        AppError::Validation {
            message: format!("Missing required fields: {}", fields.join(", ")),
            fields,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    pub fn partial(completed: impl Into<String>, failed: impl Into<String>) -> Self {
        AppError::PartialFailure {
            completed: completed.into(),
            failed: failed.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::InvalidObjectId(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::MatchNotInTeam(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::PartialFailure { .. }
            | AppError::Database(_)
            | AppError::Configuration(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "Validation failed",
            AppError::InvalidObjectId(_) => "Invalid ID format",
            AppError::NotFound(_) => "Not found",
            AppError::MatchNotInTeam(_) => "Match not found in team",
            AppError::Conflict(_) => "Conflict",
            AppError::Unauthorized => "Authentication failed",
            AppError::Forbidden(_) => "Access denied",
            AppError::PartialFailure { .. } => "Partial update",
            AppError::Database(_) => "Database error",
            AppError::Configuration(_) => "Configuration error",
            AppError::Internal(_) => "Internal error",
        }
    }

    /// Message safe to hand to a client. Storage and internal details
    /// stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                self.label().to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let mut body = json!({
            "error": self.label(),
            "message": self.public_message(),
            "success": false,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let AppError::Validation { fields, .. } = &self {
            if !fields.is_empty() {
                body["fields"] = json!(fields);
            }
        }

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AppError::Conflict(format!("{} already in use", field)),
            StoreError::Backend(msg) => AppError::Database(msg),
        }
    }
}

impl From<mongodb::bson::oid::Error> for AppError {
    fn from(err: mongodb::bson::oid::Error) -> Self {
        AppError::InvalidObjectId(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errs
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();

        AppError::Validation {
            message: format!("Invalid fields: {}", fields.join(", ")),
            fields,
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("password hashing failed: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_hide_backend_text() {
        let err = AppError::from(StoreError::Backend("connection reset by 10.0.0.3".into()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Database error");
    }

    #[test]
    fn duplicates_become_conflicts() {
        let err = AppError::from(StoreError::Duplicate("email".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.public_message(), "email already in use");
    }

    #[test]
    fn missing_fields_lists_every_field() {
        let err = AppError::missing_fields(vec!["action".into(), "matchId".into()]);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing required fields: action, matchId");
    }

    #[test]
    fn partial_failure_names_both_halves() {
        let err = AppError::partial("team created", "assigning player 42");
        assert_eq!(
            err.public_message(),
            "Partially applied: team created; failed while assigning player 42"
        );
    }
}
