#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt; // For `oneshot`

use volleytrack::build_router;
use volleytrack::config::AppConfig;
use volleytrack::database::memory::MemoryStore;
use volleytrack::state::AppState;

pub const ADMIN_EMAIL: &str = "coach@example.com";

pub struct TestApp {
    router: Router,
}

impl TestApp {
    /// Fresh router over an empty in-memory store. Signing up with
    /// `ADMIN_EMAIL` yields an administrator.
    pub fn new() -> Self {
        let mut config = AppConfig::in_memory("test-secret");
        config.bootstrap_admin_email = Some(ADMIN_EMAIL.to_string());
        let state = AppState::new(Arc::new(MemoryStore::new()), config);
        TestApp {
            router: build_router(state),
        }
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, Some(token), None).await
    }

    /// Create an account and return `(token, user id)`.
    pub async fn signup(&self, first_name: &str, email: &str, position: &str, jersey: i64, team_id: Option<&str>) -> (String, String) {
        let mut body = json!({
            "firstName": first_name,
            "lastName": "Tester",
            "email": email,
            "password": "secret123",
            "position": position,
            "jerseyNumber": jersey,
        });
        if let Some(team_id) = team_id {
            body["teamId"] = json!(team_id);
        }

        let (status, value) = self.send(Method::POST, "/api/auth/signup", None, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "signup failed: {}", value);
        (
            value["token"].as_str().unwrap().to_string(),
            value["user"]["id"].as_str().unwrap().to_string(),
        )
    }

    pub async fn admin(&self) -> String {
        self.signup("Coach", ADMIN_EMAIL, "Setter", 1, None).await.0
    }

    /// Admin-created team; returns its id.
    pub async fn create_team(&self, admin: &str, name: &str, players: &[&str]) -> String {
        let (status, value) = self
            .post("/api/teams", admin, json!({ "name": name, "players": players }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "team creation failed: {}", value);
        value["id"].as_str().unwrap().to_string()
    }

    pub async fn add_match(&self, token: &str, team_id: &str, us: i64, them: i64) -> String {
        let (status, value) = self
            .post(
                &format!("/api/teams/{}/matches", team_id),
                token,
                json!({
                    "date": "2024-03-01",
                    "location": "Main Gym",
                    "opponent": "Blockers",
                    "score": { "us": us, "them": them },
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "adding match failed: {}", value);
        value["matchId"].as_str().unwrap().to_string()
    }
}

pub fn player_ids(team: &Value) -> Vec<String> {
    team["players"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap().to_string())
        .collect()
}
