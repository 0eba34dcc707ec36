mod common;

use anyhow::Result;
use portfolio_api::handlers::{menu_items, menus};
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn create_menu(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> Result<Value> {
    let res = client
        .post(format!("{}/menus/", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "menu create failed: {}",
        res.status()
    );
    Ok(res.json().await?)
}

#[tokio::test]
async fn create_assigns_caller_as_owner() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    // Claiming someone else as owner is silently ignored
    let res = client
        .post(format!("{}/menus/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "main", "owner": "intruder" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let menu: Value = res.json().await?;
    assert_eq!(menu["owner"], "dara");
    assert_eq!(menu["name"], "main");
    assert_eq!(menu["menu_items"], json!([]));
    assert!(menu["created_at"].is_string());
    assert!(menu["modified_at"].is_string());
    Ok(())
}

#[tokio::test]
async fn duplicate_menu_name_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;
    create_menu(&client, &server.base_url, &token, "main").await?;

    let res = client
        .post(format!("{}/menus/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "main" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_FAILED");
    Ok(())
}

#[tokio::test]
async fn unknown_payload_field_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    // Timestamps are server-managed and not writable
    let res = client
        .post(format!("{}/menus/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "main", "created_at": "2020-01-01T00:00:00Z" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn non_owner_cannot_mutate_but_can_read() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let owner = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;
    let other = common::register_and_token(&client, &server.base_url, "sam", "pw").await?;

    let menu = create_menu(&client, &server.base_url, &owner, "main").await?;
    let id = menu["id"].as_i64().unwrap();
    let url = format!("{}/menus/{}/", server.base_url, id);

    // Any authenticated identity may read
    let res = client.get(&url).bearer_auth(&other).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    // Only the owner may write or delete
    let res = client
        .put(&url)
        .bearer_auth(&other)
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "FORBIDDEN");

    let res = client.delete(&url).bearer_auth(&other).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The record is untouched
    let after: Value = client
        .get(&url)
        .bearer_auth(&owner)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["name"], "main");
    Ok(())
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let menu = create_menu(&client, &server.base_url, &token, "main").await?;
    let url = format!("{}/menus/{}/", server.base_url, menu["id"].as_i64().unwrap());

    let res = client.delete(&url).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client.get(&url).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_id_reads_as_not_found() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let res = client
        .get(format!("{}/menus/abc/", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn items_attach_explicitly_and_nest_in_menu() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let menu = create_menu(&client, &server.base_url, &token, "main").await?;
    let menu_id = menu["id"].as_i64().unwrap();

    let item: Value = client
        .post(format!("{}/menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "About", "url": "/about", "order": 1 }))
        .send()
        .await?
        .json()
        .await?;
    let item_id = item["id"].as_i64().unwrap();
    assert_eq!(item["action"], "push");
    assert_eq!(item["sub_menu_items"], json!([]));

    // Creation alone does not put the item on any menu
    let before: Value = client
        .get(format!("{}/menus/{}/", server.base_url, menu_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(before["menu_items"], json!([]));

    menus::attach_menu_item(&server.pool, menu_id, item_id).await?;

    let after: Value = client
        .get(format!("{}/menus/{}/", server.base_url, menu_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(after["menu_items"][0]["id"], item_id);
    assert_eq!(after["menu_items"][0]["title"], "About");
    Ok(())
}

#[tokio::test]
async fn sub_menu_items_nest_two_levels_deep() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let menu = create_menu(&client, &server.base_url, &token, "main").await?;
    let menu_id = menu["id"].as_i64().unwrap();

    let item: Value = client
        .post(format!("{}/menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "Work", "url": "/work" }))
        .send()
        .await?
        .json()
        .await?;
    let item_id = item["id"].as_i64().unwrap();

    let sub: Value = client
        .post(format!("{}/sub-menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "Case studies", "url": "/work/case-studies", "order": 1 }))
        .send()
        .await?
        .json()
        .await?;
    let sub_id = sub["id"].as_i64().unwrap();

    menus::attach_menu_item(&server.pool, menu_id, item_id).await?;
    menu_items::attach_sub_menu_item(&server.pool, item_id, sub_id).await?;

    let tree: Value = client
        .get(format!("{}/menus/{}/", server.base_url, menu_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(tree["menu_items"][0]["sub_menu_items"][0]["id"], sub_id);
    assert_eq!(
        tree["menu_items"][0]["sub_menu_items"][0]["title"],
        "Case studies"
    );
    Ok(())
}

#[tokio::test]
async fn deleting_a_menu_orphans_its_items() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let menu = create_menu(&client, &server.base_url, &token, "main").await?;
    let menu_id = menu["id"].as_i64().unwrap();

    let item: Value = client
        .post(format!("{}/menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "About", "url": "/about" }))
        .send()
        .await?
        .json()
        .await?;
    let item_id = item["id"].as_i64().unwrap();
    menus::attach_menu_item(&server.pool, menu_id, item_id).await?;

    let res = client
        .delete(format!("{}/menus/{}/", server.base_url, menu_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    // The item survives the menu, detached
    let res = client
        .get(format!("{}/menu-items/{}/", server.base_url, item_id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn duplicate_sub_menu_item_url_is_rejected() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let res = client
        .post(format!("{}/sub-menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "One", "url": "/dup" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .post(format!("{}/sub-menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "Two", "url": "/dup" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn json_format_suffix_is_accepted() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;
    let menu = create_menu(&client, &server.base_url, &token, "main").await?;
    let id = menu["id"].as_i64().unwrap();

    let res = client
        .get(format!("{}/menus.json", server.base_url))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/menus/{}.json", server.base_url, id))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["id"], id);
    Ok(())
}

#[tokio::test]
async fn patch_updates_only_named_fields() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();
    let token = common::register_and_token(&client, &server.base_url, "dara", "pw").await?;

    let item: Value = client
        .post(format!("{}/menu-items/", server.base_url))
        .bearer_auth(&token)
        .json(&json!({ "title": "About", "url": "/about", "order": 3, "action": "replace" }))
        .send()
        .await?
        .json()
        .await?;
    let id = item["id"].as_i64().unwrap();

    let patched: Value = client
        .patch(format!("{}/menu-items/{}/", server.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "title": "About me" }))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(patched["title"], "About me");
    assert_eq!(patched["url"], "/about");
    assert_eq!(patched["order"], 3);
    assert_eq!(patched["action"], "replace");
    Ok(())
}
