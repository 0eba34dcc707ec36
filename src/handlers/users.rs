use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth;
use crate::database::models::{Token, User};
use crate::error::ApiError;
use crate::state::AppState;

use super::parse_payload;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// POST /users/ - register a new identity.
///
/// The identity and its single credential are created in one transaction:
/// after registration every identity has exactly one token, and no normal
/// flow ever regenerates it.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: Credentials = parse_payload(body)?;
    if payload.username.trim().is_empty() {
        return Err(ApiError::validation("username must not be blank"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("password must not be blank"));
    }

    let now = Utc::now();
    let mut tx = state.pool.begin().await?;

    let result = sqlx::query("INSERT INTO users (username, password, created_at) VALUES (?, ?, ?)")
        .bind(&payload.username)
        .bind(auth::hash_password(&payload.password))
        .bind(now)
        .execute(&mut *tx)
        .await?;
    let user_id = result.last_insert_rowid();

    sqlx::query("INSERT INTO tokens (key, user_id, created_at) VALUES (?, ?, ?)")
        .bind(auth::generate_token_key())
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!("registered user {}", payload.username);

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": user_id, "username": payload.username })),
    ))
}

/// POST /get-token/ - exchange username + password for the identity's token.
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let payload: Credentials = parse_payload(body)?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE username = ?")
        .bind(&payload.username)
        .fetch_optional(&state.pool)
        .await?;

    let user = user.ok_or_else(|| ApiError::unauthenticated("Invalid credentials"))?;
    if !auth::verify_password(&payload.password, &user.password) {
        return Err(ApiError::unauthenticated("Invalid credentials"));
    }

    let token: Token = sqlx::query_as("SELECT * FROM tokens WHERE user_id = ?")
        .bind(user.id)
        .fetch_one(&state.pool)
        .await?;

    Ok(Json(json!({ "token": token.key })))
}
