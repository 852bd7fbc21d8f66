//! Team membership stays two-sided through every write path.

mod common;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use common::{player_ids, TestApp};

#[tokio::test]
async fn creating_a_team_assigns_its_players() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, None).await;
    let (_, ben_id) = app.signup("Ben", "ben@example.com", "Opposite", 11, None).await;

    let team_id = app.create_team(&admin, "Aces", &[ana_id.as_str(), ben_id.as_str(), ana_id.as_str()]).await;

    let (_, team) = app.get(&format!("/api/teams/{}", team_id), &admin).await;
    assert_eq!(player_ids(&team), vec![ana_id.clone(), ben_id.clone()]);

    let (_, me) = app.get("/api/users/me", &ana).await;
    assert_eq!(me["team"], team_id.as_str());
}

#[tokio::test]
async fn team_names_are_unique() {
    let app = TestApp::new();
    let admin = app.admin().await;
    app.create_team(&admin, "Aces", &[]).await;

    let (status, _) = app.post("/api/teams", &admin, json!({ "name": "Aces" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app.post("/api/teams", &admin, json!({ "name": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fields"], json!(["name"]));
}

#[tokio::test]
async fn unknown_players_block_team_creation() {
    let app = TestApp::new();
    let admin = app.admin().await;

    let (status, _) = app
        .post(
            "/api/teams",
            &admin,
            json!({ "name": "Aces", "players": ["000000000000000000000000"] }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, public) = app.send(axum::http::Method::GET, "/api/teams/public", None, None).await;
    assert_eq!(public, json!([]));
}

#[tokio::test]
async fn roster_update_releases_and_claims_players() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, None).await;
    let (ben, ben_id) = app.signup("Ben", "ben@example.com", "Opposite", 11, None).await;
    let team_id = app.create_team(&admin, "Aces", &[ana_id.as_str()]).await;

    let (status, team) = app
        .put(
            &format!("/api/teams/{}", team_id),
            &admin,
            json!({ "players": [ben_id] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(player_ids(&team), vec![ben_id.clone()]);

    let (_, ana_me) = app.get("/api/users/me", &ana).await;
    assert_eq!(ana_me["team"], serde_json::Value::Null);
    let (_, ben_me) = app.get("/api/users/me", &ben).await;
    assert_eq!(ben_me["team"], team_id.as_str());
}

#[tokio::test]
async fn repeating_a_roster_update_changes_nothing() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (_, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, None).await;
    let (_, ben_id) = app.signup("Ben", "ben@example.com", "Opposite", 11, None).await;
    let team_id = app.create_team(&admin, "Aces", &[]).await;

    let body = json!({ "name": "Aces", "players": [ana_id, ben_id] });
    let (_, first) = app.put(&format!("/api/teams/{}", team_id), &admin, body.clone()).await;
    let (status, second) = app.put(&format!("/api/teams/{}", team_id), &admin, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(player_ids(&first), player_ids(&second));
    assert_eq!(player_ids(&second), vec![ana_id, ben_id]);
}

#[tokio::test]
async fn moving_a_player_leaves_the_old_roster() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let aces = app.create_team(&admin, "Aces", &[]).await;
    let diggers = app.create_team(&admin, "Diggers", &[]).await;
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, Some(aces.as_str())).await;

    let (status, me) = app
        .put(&format!("/api/users/{}", ana_id), &ana, json!({ "teamId": diggers }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["team"], diggers.as_str());

    let (_, old) = app.get(&format!("/api/teams/{}", aces), &admin).await;
    assert_eq!(player_ids(&old), Vec::<String>::new());
    let (_, new) = app.get(&format!("/api/teams/{}", diggers), &admin).await;
    assert_eq!(player_ids(&new), vec![ana_id.clone()]);

    let (status, me) = app
        .put(&format!("/api/users/{}", ana_id), &ana, json!({ "teamId": null }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["team"], serde_json::Value::Null);
    let (_, new) = app.get(&format!("/api/teams/{}", diggers), &admin).await;
    assert_eq!(player_ids(&new), Vec::<String>::new());
}

#[tokio::test]
async fn players_edit_only_themselves_and_never_admin_rights() {
    let app = TestApp::new();
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, None).await;
    let (_, ben_id) = app.signup("Ben", "ben@example.com", "Opposite", 11, None).await;

    let (status, _) = app
        .put(&format!("/api/users/{}", ben_id), &ana, json!({ "firstName": "Benny" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .put(&format!("/api/users/{}", ana_id), &ana, json!({ "isAdmin": true }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, me) = app
        .put(
            &format!("/api/users/{}", ana_id),
            &ana,
            json!({ "firstName": "Anna", "jerseyNumber": 12, "position": "outside hitter" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["firstName"], "Anna");
    assert_eq!(me["jerseyNumber"], 12);
    assert_eq!(me["position"], "Outside Hitter");
}

#[tokio::test]
async fn admins_can_grant_admin_rights() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, None).await;

    let (status, user) = app
        .put(&format!("/api/users/{}", ana_id), &admin, json!({ "isAdmin": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["isAdmin"], true);

    // Existing tokens pick up the new flag on the next request.
    let (status, _) = app.get("/api/users", &ana).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_team_unassigns_its_members() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let team_id = app.create_team(&admin, "Aces", &[]).await;
    let (ana, _) = app.signup("Ana", "ana@example.com", "Libero", 7, Some(team_id.as_str())).await;

    let (status, body) = app.delete(&format!("/api/teams/{}", team_id), &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Team deleted successfully");

    let (_, me) = app.get("/api/users/me", &ana).await;
    assert_eq!(me["team"], serde_json::Value::Null);

    let (status, _) = app.get(&format!("/api/teams/{}", team_id), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_user_removes_them_from_the_roster() {
    let app = TestApp::new();
    let admin = app.admin().await;
    let team_id = app.create_team(&admin, "Aces", &[]).await;
    let (ana, ana_id) = app.signup("Ana", "ana@example.com", "Libero", 7, Some(team_id.as_str())).await;
    let (_, ben_id) = app.signup("Ben", "ben@example.com", "Opposite", 11, Some(team_id.as_str())).await;

    let (status, _) = app.delete(&format!("/api/users/{}", ana_id), &ana).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(&format!("/api/users/{}", ana_id), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (_, team) = app.get(&format!("/api/teams/{}", team_id), &admin).await;
    assert_eq!(player_ids(&team), vec![ben_id]);

    // The deleted account's token no longer resolves.
    let (status, _) = app.get("/api/users/me", &ana).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
