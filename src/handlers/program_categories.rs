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
pub struct ProgramCategory {
    pub id: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub name: String,
    pub url: String,
}

impl Owned for ProgramCategory {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramCategoryPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramCategoryPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: Option<String>,
    pub url: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT c.*, u.username AS owner FROM program_categories c JOIN users u ON u.id = c.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<ProgramCategory, ApiError> {
    sqlx::query_as::<_, ProgramCategory>(&format!("{} WHERE c.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /program-categories/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProgramCategory>>, ApiError> {
    let sql = format!("{} ORDER BY c.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, ProgramCategory>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /program-categories/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: ProgramCategoryPayload = parse_payload(body)?;

    let result = sqlx::query("INSERT INTO program_categories (owner_id, name, url) VALUES (?, ?, ?)")
        .bind(user.id)
        .bind(&payload.name)
        .bind(&payload.url)
        .execute(&state.pool)
        .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /program-categories/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<ProgramCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /program-categories/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ProgramCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ProgramCategoryPayload = parse_payload(body)?;

    sqlx::query("UPDATE program_categories SET name = ?, url = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.url)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /program-categories/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<ProgramCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ProgramCategoryPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE program_categories SET name = COALESCE(?, name), url = COALESCE(?, url) WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.url)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /program-categories/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM program_categories WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
