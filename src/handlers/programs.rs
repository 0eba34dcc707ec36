use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{ensure_owner, Owned};
use crate::state::AppState;

use super::{parse_id, parse_payload};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Program {
    pub id: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    // Category stays an id reference in the external shape
    #[serde(rename = "program_category")]
    pub program_category_id: Option<i64>,
    pub name: String,
    pub logo: String,
    pub summary: String,
    pub website: String,
}

impl Owned for Program {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    #[serde(default)]
    pub program_category: Option<i64>,
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub summary: String,
    pub website: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub program_category: Option<i64>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub summary: Option<String>,
    pub website: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT p.*, u.username AS owner FROM programs p JOIN users u ON u.id = p.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<Program, ApiError> {
    sqlx::query_as::<_, Program>(&format!("{} WHERE p.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /programs/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Program>>, ApiError> {
    let sql = format!("{} ORDER BY p.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, Program>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// GET /programs/search/:url/ - programs whose category has this exact url
pub async fn search(
    State(state): State<AppState>,
    Path(url): Path<String>,
) -> Result<Json<Vec<Program>>, ApiError> {
    let sql = format!(
        "{} WHERE p.program_category_id IN (SELECT id FROM program_categories WHERE url = ?) \
         ORDER BY p.id",
        BASE_SELECT
    );
    let rows = sqlx::query_as::<_, Program>(&sql)
        .bind(&url)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /programs/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: ProgramPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO programs (owner_id, program_category_id, name, logo, summary, website) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.program_category)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(&payload.summary)
    .bind(&payload.website)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /programs/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Program>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /programs/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Program>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ProgramPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE programs SET program_category_id = ?, name = ?, logo = ?, summary = ?, website = ? \
         WHERE id = ?",
    )
    .bind(payload.program_category)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(&payload.summary)
    .bind(&payload.website)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /programs/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Program>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ProgramPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE programs SET \
         program_category_id = COALESCE(?, program_category_id), name = COALESCE(?, name), \
         logo = COALESCE(?, logo), summary = COALESCE(?, summary), website = COALESCE(?, website) \
         WHERE id = ?",
    )
    .bind(payload.program_category)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(&payload.summary)
    .bind(&payload.website)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /programs/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM programs WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
