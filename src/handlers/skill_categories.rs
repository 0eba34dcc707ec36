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
pub struct SkillCategory {
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub name: String,
    pub url: String,
    pub message: String,
}

impl Owned for SkillCategory {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillCategoryPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillCategoryPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub message: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT c.*, u.username AS owner FROM skill_categories c JOIN users u ON u.id = c.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<SkillCategory, ApiError> {
    sqlx::query_as::<_, SkillCategory>(&format!("{} WHERE c.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /skill-categories/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SkillCategory>>, ApiError> {
    let sql = format!("{} ORDER BY c.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, SkillCategory>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /skill-categories/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: SkillCategoryPayload = parse_payload(body)?;

    let result =
        sqlx::query("INSERT INTO skill_categories (owner_id, name, url, message) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&payload.name)
            .bind(&payload.url)
            .bind(&payload.message)
            .execute(&state.pool)
            .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /skill-categories/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<SkillCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /skill-categories/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SkillCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillCategoryPayload = parse_payload(body)?;

    sqlx::query("UPDATE skill_categories SET name = ?, url = ?, message = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(&payload.url)
        .bind(&payload.message)
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /skill-categories/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SkillCategory>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillCategoryPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE skill_categories SET name = COALESCE(?, name), url = COALESCE(?, url), \
         message = COALESCE(?, message) WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.url)
    .bind(&payload.message)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /skill-categories/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM skill_categories WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
