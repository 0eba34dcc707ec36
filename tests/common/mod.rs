use anyhow::{ensure, Context, Result};
use sqlx::SqlitePool;

use portfolio_api::database::pool;
use portfolio_api::state::AppState;

pub struct TestServer {
    pub base_url: String,
    pub pool: SqlitePool,
}

/// Boot the app in-process against a private in-memory database.
///
/// The pool is capped at one connection so the in-memory database stays alive
/// for the whole test. Each call gets a fresh database and a fresh port.
pub async fn spawn_server() -> Result<TestServer> {
    let db_pool = pool::connect("sqlite::memory:", 1)
        .await
        .context("failed to open in-memory database")?;

    let app = portfolio_api::app(AppState {
        pool: db_pool.clone(),
    });

    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    Ok(TestServer {
        base_url,
        pool: db_pool,
    })
}

/// Register an identity and return its API token.
#[allow(dead_code)]
pub async fn register_and_token(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let res = client
        .post(format!("{}/users/", base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    ensure!(
        res.status() == reqwest::StatusCode::CREATED,
        "registration failed: {}",
        res.status()
    );

    let res = client
        .post(format!("{}/get-token/", base_url))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await?;
    ensure!(
        res.status() == reqwest::StatusCode::OK,
        "token request failed: {}",
        res.status()
    );

    let body: serde_json::Value = res.json().await?;
    body["token"]
        .as_str()
        .map(str::to_string)
        .context("token missing from response")
}
