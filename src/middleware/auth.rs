use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use mongodb::bson::oid::ObjectId;

use crate::errors::{AppError, Result};
use crate::state::AppState;

/// Identity of the caller, resolved from the bearer token and threaded
/// into every manager call.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: ObjectId,
    pub is_admin: bool,
    pub team: Option<ObjectId>,
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied: admin only"))
        }
    }

    pub fn is_self_or_admin(&self, user_id: &ObjectId) -> bool {
        self.is_admin || &self.id == user_id
    }

    pub fn belongs_to(&self, team_id: &ObjectId) -> bool {
        self.team.as_ref() == Some(team_id)
    }

    /// Members act on their own team; admins act on any team.
    pub fn require_member_or_admin(&self, team_id: &ObjectId) -> Result<()> {
        if self.is_admin || self.belongs_to(team_id) {
            Ok(())
        } else {
            Err(AppError::forbidden("Access denied: not a member of this team"))
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let user_id = state.tokens.verify(token)?;

    // The account may have been deleted or demoted since the token was issued.
    let user = state
        .store
        .find_user(&user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(AuthUser {
        id: user.id,
        is_admin: user.is_admin,
        team: user.team,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn members_and_admins() {
        let team = ObjectId::new();
        let member = AuthUser { id: ObjectId::new(), is_admin: false, team: Some(team) };
        let outsider = AuthUser { id: ObjectId::new(), is_admin: false, team: None };
        let admin = AuthUser { id: ObjectId::new(), is_admin: true, team: None };

        assert!(member.require_member_or_admin(&team).is_ok());
        assert!(outsider.require_member_or_admin(&team).is_err());
        assert!(admin.require_member_or_admin(&team).is_ok());
        assert!(member.require_admin().is_err());
        assert!(member.is_self_or_admin(&member.id));
        assert!(!member.is_self_or_admin(&outsider.id));
    }
}
