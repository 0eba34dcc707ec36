mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn skill_payload(name: &str, order: i64, categories: &[i64]) -> Value {
    json!({
        "name": name,
        "order": order,
        "category": categories,
        "logo": format!("/logos/{}.svg", name.to_lowercase()),
        "skill_level": 80,
        "months_worked": 24,
        "last_project": "portfolio",
        "website": "https://example.com",
        "documentation": "https://docs.example.com",
        "github": "https://github.com/example",
        "why": "daily driver",
        "preferred": true
    })
}

async fn create_category(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
    url: &str,
) -> Result<i64> {
    let res = client
        .post(format!("{}/skill-categories/", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "url": url }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "category create failed: {}",
        res.status()
    );
    let body: Value = res.json().await?;
    Ok(body["id"].as_i64().unwrap())
}

#[tokio::test]
async fn listing_is_alphabetical() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    for (name, order) in [("Rust", 1), ("Axum", 2), ("Postgres", 3)] {
        let res = client
            .post(format!("{}/skills/", server.base_url))
            .bearer_auth(&token)
            .json(&skill_payload(name, order, &[]))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let listed: Value = client
        .get(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let names: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Axum", "Postgres", "Rust"]);
    Ok(())
}

#[tokio::test]
async fn search_filters_by_category_url_in_display_order() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let backend =
        create_category(&client, &server.base_url, &token, "Backend", "backend").await?;
    let frontend =
        create_category(&client, &server.base_url, &token, "Frontend", "frontend").await?;

    for (name, order, cats) in [
        ("Zig", 5, vec![backend]),
        ("Rust", 1, vec![backend, frontend]),
        ("CSS", 2, vec![frontend]),
    ] {
        let res = client
            .post(format!("{}/skills/", server.base_url))
            .bearer_auth(&token)
            .json(&skill_payload(name, order, &cats))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let found: Value = client
        .get(format!("{}/skills/search/backend/", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    let names: Vec<&str> = found
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    // Filtered to the backend category, ordered by the display order field
    assert_eq!(names, vec!["Rust", "Zig"]);

    // Unknown category url is an empty result, not an error
    let empty: Value = client
        .get(format!("{}/skills/search/devops/", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(empty, json!([]));
    Ok(())
}

#[tokio::test]
async fn skill_embeds_chart_and_category_ids() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let chart: Value = client
        .post(format!("{}/skill-charts/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "rust-radar",
            "title1": "Syntax", "points1": 9,
            "title2": "Async", "points2": 7,
            "title3": "Macros", "points3": 6,
            "title4": "Unsafe", "points4": 4,
            "title5": "Tooling", "points5": 8
        }))
        .send()
        .await?
        .json()
        .await?;
    let chart_id = chart["id"].as_i64().unwrap();

    let backend =
        create_category(&client, &server.base_url, &token, "Backend", "backend").await?;

    let mut payload = skill_payload("Rust", 1, &[backend]);
    payload["skill_chart"] = json!(chart_id);
    let skill: Value = client
        .post(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(skill["category"], json!([backend]));
    assert_eq!(skill["skill_chart"]["id"], chart_id);
    assert_eq!(skill["skill_chart"]["name"], "rust-radar");
    assert_eq!(skill["skill_chart"]["points1"], 9);
    Ok(())
}

#[tokio::test]
async fn duplicate_skill_name_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let res = client
        .post(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .json(&skill_payload("Rust", 1, &[]))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .json(&skill_payload("Rust", 2, &[]))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn dangling_chart_reference_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let mut payload = skill_payload("Rust", 1, &[]);
    payload["skill_chart"] = json!(9999);
    let res = client
        .post(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    Ok(())
}

#[tokio::test]
async fn patch_can_replace_category_set() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let backend =
        create_category(&client, &server.base_url, &token, "Backend", "backend").await?;
    let frontend =
        create_category(&client, &server.base_url, &token, "Frontend", "frontend").await?;

    let skill: Value = client
        .post(format!("{}/skills/", server.base_url))
        .bearer_auth(&token)
        .json(&skill_payload("Rust", 1, &[backend]))
        .send()
        .await?
        .json()
        .await?;
    let id = skill["id"].as_i64().unwrap();

    let patched: Value = client
        .patch(format!("{}/skills/{}/", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "category": [frontend] }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(patched["category"], json!([frontend]));
    assert_eq!(patched["name"], "Rust");
    Ok(())
}
