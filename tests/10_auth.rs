mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn root_is_public() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(&server.base_url).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn content_routes_require_token() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    // No Authorization header at all
    let res = client
        .get(format!("{}/menus/", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "UNAUTHENTICATED");

    // A token nobody issued
    let res = client
        .get(format!("{}/skills/", server.base_url))
        .bearer_auth("deadbeefdeadbeefdeadbeefdeadbeef")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn registration_provisions_a_stable_token() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/users/", server.base_url))
        .json(&json!({ "username": "dara", "password": "hunter2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await?;
    assert_eq!(body["username"], "dara");
    assert!(body["id"].is_i64());

    // Exchanging credentials twice yields the same token, never a new one
    let first = client
        .post(format!("{}/get-token/", server.base_url))
        .json(&json!({ "username": "dara", "password": "hunter2" }))
        .send()
        .await?
        .json::<Value>()
        .await?;
    let second = client
        .post(format!("{}/get-token/", server.base_url))
        .json(&json!({ "username": "dara", "password": "hunter2" }))
        .send()
        .await?
        .json::<Value>()
        .await?;

    let token = first["token"].as_str().unwrap();
    assert_eq!(token, second["token"].as_str().unwrap());
    assert_eq!(token.len(), 32);

    // And the token actually opens the content API
    let res = client
        .get(format!("{}/menus/", server.base_url))
        .bearer_auth(token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    common::register_and_token(&client, &server.base_url, "dara", "hunter2").await?;

    let res = client
        .post(format!("{}/get-token/", server.base_url))
        .json(&json!({ "username": "dara", "password": "wrong" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Unknown username gets the same answer
    let res = client
        .post(format!("{}/get-token/", server.base_url))
        .json(&json!({ "username": "nobody", "password": "hunter2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    common::register_and_token(&client, &server.base_url, "dara", "hunter2").await?;

    let res = client
        .post(format!("{}/users/", server.base_url))
        .json(&json!({ "username": "dara", "password": "other" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    Ok(())
}

#[tokio::test]
async fn blank_credentials_are_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/users/", server.base_url))
        .json(&json!({ "username": "  ", "password": "hunter2" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = client
        .post(format!("{}/users/", server.base_url))
        .json(&json!({ "username": "dara", "password": "" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
