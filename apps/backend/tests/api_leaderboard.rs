//! Leaderboard API tests.
//!
//! These tests require a running PostgreSQL database.
//! Set DATABASE_URL environment variable before running.

mod common;

use axum::http::{header::AUTHORIZATION, StatusCode};
use axum_test::TestServer;

use common::TestContext;

/// Test leaderboard requires authentication.
#[tokio::test]
#[ignore = "requires database"]
async fn test_leaderboard_requires_auth() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server.get("/api/leaderboard").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Test a top user is listed, titled, and flagged as the caller.
#[tokio::test]
#[ignore = "requires database"]
async fn test_leaderboard_marks_current_user() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (user_id, token) = ctx.create_test_user().await;
    let xp = 9_000_000_000 + (uuid::Uuid::new_v4().as_u128() % 1_000_000) as i64;
    ctx.set_user_xp(user_id, xp).await;

    let response = server
        .get("/api/leaderboard")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let users = body["users"].as_array().unwrap();
    assert!(users.len() <= 50);

    let me = users
        .iter()
        .find(|u| u["user_id"] == user_id.to_string())
        .expect("caller on leaderboard");
    assert_eq!(me["is_current_user"], true);
    assert_eq!(me["title"], "PRO_LOGICIST");
    assert_eq!(
        users.iter().filter(|u| u["is_current_user"] == true).count(),
        1
    );

    let stats = &body["user_stats"];
    assert_eq!(stats["rank"], me["rank"]);
    assert!(stats["total_users"].as_u64().unwrap() >= 1);
    assert!(stats["percentile"].as_str().unwrap().ends_with('%'));

    let xps: Vec<i64> = users.iter().map(|u| u["xp"].as_i64().unwrap()).collect();
    assert!(xps.windows(2).all(|w| w[0] >= w[1]));

    ctx.cleanup(&[user_id]).await;
}

/// Test a user without XP gets a rank past everyone with XP.
#[tokio::test]
#[ignore = "requires database"]
async fn test_leaderboard_standing_for_new_user() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();
    let (leader_id, _) = ctx.create_test_user().await;
    ctx.set_user_xp(leader_id, 500).await;
    let (user_id, token) = ctx.create_test_user().await;

    let response = server
        .get("/api/leaderboard")
        .add_header(AUTHORIZATION, TestContext::auth_header_value(&token))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let stats = &body["user_stats"];
    assert!(stats["rank"].as_u64().unwrap() >= 2);
    assert!(stats["rank"].as_u64().unwrap() <= stats["total_users"].as_u64().unwrap());

    ctx.cleanup(&[leader_id, user_id]).await;
}
