use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;

use crate::errors::{AppError, Result};
use crate::models::user::{Claims, User};

/// Issues and checks the bearer tokens handed out at signup and login.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        TokenService {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    pub fn issue(&self, user_id: &ObjectId) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_hex(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("token signing failed: {}", e)))
    }

    /// Resolve a token to the user id it was issued for. Every failure
    /// (bad signature, expiry, garbage) is the same `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<ObjectId> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map_err(|e| {
                tracing::debug!("token rejected: {}", e);
                AppError::Unauthorized
            })?;

        ObjectId::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    Ok(hash(password, DEFAULT_COST)?)
}

pub fn check_password(password: &str, user: &User) -> Result<()> {
    match verify(password, &user.password_hash) {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::Unauthorized),
        Err(e) => {
            tracing::warn!("stored hash for user {} is unreadable: {}", user.id, e);
            Err(AppError::Unauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_tokens_verify_to_the_same_user() {
        let tokens = TokenService::new("test-secret", 1);
        let user_id = ObjectId::new();

        let token = tokens.issue(&user_id).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let ours = TokenService::new("test-secret", 1);
        let theirs = TokenService::new("other-secret", 1);

        let token = theirs.issue(&ObjectId::new()).unwrap();
        assert!(matches!(ours.verify(&token), Err(AppError::Unauthorized)));
        assert!(matches!(ours.verify("not-a-jwt"), Err(AppError::Unauthorized)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = TokenService::new("test-secret", -2);
        let token = tokens.issue(&ObjectId::new()).unwrap();
        assert!(matches!(tokens.verify(&token), Err(AppError::Unauthorized)));
    }
}
