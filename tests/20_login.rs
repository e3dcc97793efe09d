mod common;

use std::sync::Arc;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::{json, Value};

use common::{ADMIN_EMAIL, ADMIN_PASSWORD};
use sogrub::config::FailMode;
use sogrub::testing::{test_config, TestApp, UnreachableWindowStore};

async fn login(client: &reqwest::Client, url: &str, ip: &str, password: &str) -> Result<reqwest::Response> {
    Ok(client
        .post(url)
        .header("x-forwarded-for", ip)
        .header(header::USER_AGENT, "integration-tests")
        .json(&json!({ "email": ADMIN_EMAIL, "password": password }))
        .send()
        .await?)
}

#[tokio::test]
async fn successful_login_sets_session_cookie() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = login(&client, &server.url("/auth/login"), "203.0.113.1", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(cookie.starts_with("sogrub-session="), "cookie: {}", cookie);
    assert!(cookie.contains("HttpOnly"));
    assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
    assert_eq!(res.headers()["clear-site-data"], "\"cache\"");

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["redirect"], "/admin");
    assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);

    // The issued token opens the admin API
    let token = body["data"]["access_token"].as_str().unwrap();
    let res = client
        .get(server.url("/api/auth/whoami"))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_generic_401() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = login(&client, &server.url("/auth/login"), "203.0.113.2", "not-the-password").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid credentials. Please try again.");

    let res = client
        .post(server.url("/auth/login"))
        .header("x-forwarded-for", "203.0.113.2")
        .json(&json!({ "email": "not-an-email", "password": "x" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<Value>().await?;
    assert_eq!(body["message"], "Invalid credentials. Please try again.");
    Ok(())
}

#[tokio::test]
async fn sixth_attempt_is_rate_limited() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let url = server.url("/auth/login");

    for attempt in 1..=5 {
        let res = login(&client, &url, "198.51.100.7", "wrong-password").await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "attempt {}", attempt);
    }
    assert_eq!(server.auth.sign_in_calls(), 5);

    // Correct credentials do not help once the window is exhausted
    let res = login(&client, &url, "198.51.100.7", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(res.headers().contains_key(header::RETRY_AFTER));
    let body = res.json::<Value>().await?;
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Too many attempts. Please try again in "), "{}", message);
    assert_eq!(server.auth.sign_in_calls(), 5);

    // A different client still gets through
    let res = login(&client, &url, "198.51.100.8", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn logout_clears_cookie() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/api/auth/logout"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let cookie = res.headers()[header::SET_COOKIE].to_str()?.to_string();
    assert!(cookie.contains("Max-Age=0"));
    assert_eq!(server.auth.sign_out_calls(), 1);

    let res = client.post(server.url("/api/auth/logout")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn attempt_budget_follows_configuration() -> Result<()> {
    let mut config = test_config();
    config.rate_limit.attempts = 2;
    let server = common::spawn_server_with_config(config).await?;
    let client = reqwest::Client::new();
    let url = server.url("/auth/login");

    for _ in 0..2 {
        let res = login(&client, &url, "192.0.2.10", "wrong-password").await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    let res = login(&client, &url, "192.0.2.10", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(server.auth.sign_in_calls(), 2);
    Ok(())
}

#[tokio::test]
async fn limiter_outage_fails_closed_with_503() -> Result<()> {
    let store = Arc::new(UnreachableWindowStore::new());
    let server = common::spawn_app(TestApp::with_window_store(test_config(), store.clone())).await?;
    let client = reqwest::Client::new();

    let res = login(&client, &server.url("/auth/login"), "192.0.2.20", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");

    assert_eq!(store.calls(), 1);
    assert_eq!(server.auth.sign_in_calls(), 0);
    Ok(())
}

#[tokio::test]
async fn limiter_outage_fails_open_when_configured() -> Result<()> {
    let mut config = test_config();
    config.rate_limit.fail_mode = FailMode::Open;
    let store = Arc::new(UnreachableWindowStore::new());
    let server = common::spawn_app(TestApp::with_window_store(config, store.clone())).await?;
    let client = reqwest::Client::new();
    let url = server.url("/auth/login");

    let res = login(&client, &url, "192.0.2.21", "wrong-password").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = login(&client, &url, "192.0.2.21", ADMIN_PASSWORD).await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(server.auth.sign_in_calls(), 2);
    Ok(())
}
