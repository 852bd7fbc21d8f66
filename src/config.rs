// config.rs
use std::env;
use std::time::Duration;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    /// Signing up with this email grants the admin flag. Lets a fresh
    /// deployment get its first administrator.
    pub bootstrap_admin_email: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::Configuration("JWT_SECRET must be set".into()))?;
        if jwt_secret.trim().is_empty() {
            return Err(AppError::Configuration("JWT_SECRET must not be empty".into()));
        }

        Ok(AppConfig {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            database_name: env::var("DATABASE_NAME").unwrap_or_else(|_| "volleytrack".to_string()),
            jwt_secret,
            token_ttl_hours: parse_var("TOKEN_TTL_HOURS", 24)?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 5000)?,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", 30)?,
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL")
                .ok()
                .map(|email| email.trim().to_lowercase())
                .filter(|email| !email.is_empty()),
        })
    }

    /// Settings for tests and local experiments: in-memory store, fixed secret.
    pub fn in_memory(jwt_secret: &str) -> Self {
        AppConfig {
            database_url: crate::database::connection::MEMORY_URL.to_string(),
            database_name: "volleytrack".to_string(),
            jwt_secret: jwt_secret.to_string(),
            token_ttl_hours: 24,
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            bootstrap_admin_email: None,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.bootstrap_admin_email.as_deref() == Some(email)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_admin_matches_exact_email() {
        let mut config = AppConfig::in_memory("secret");
        assert!(!config.is_bootstrap_admin("coach@club.test"));

        config.bootstrap_admin_email = Some("coach@club.test".into());
        assert!(config.is_bootstrap_admin("coach@club.test"));
        assert!(!config.is_bootstrap_admin("player@club.test"));
    }

    #[test]
    fn bind_addr_joins_host_and_port() {
        let mut config = AppConfig::in_memory("secret");
        config.port = 5000;
        assert_eq!(config.bind_addr(), "127.0.0.1:5000");
    }
}
