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
pub struct Testimony {
    pub order: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub person: String,
    pub job: String,
    pub testimony: String,
    pub avatar: String,
    pub linkedin: String,
}

impl Owned for Testimony {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestimonyPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: i64,
    pub person: String,
    pub job: String,
    pub testimony: String,
    pub avatar: String,
    pub linkedin: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestimonyPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub person: Option<String>,
    pub job: Option<String>,
    pub testimony: Option<String>,
    pub avatar: Option<String>,
    pub linkedin: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT t.*, u.username AS owner FROM testimonies t JOIN users u ON u.id = t.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<Testimony, ApiError> {
    sqlx::query_as::<_, Testimony>(&format!("{} WHERE t.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /testimonies/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Testimony>>, ApiError> {
    let sql = format!("{} ORDER BY t.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, Testimony>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /testimonies/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: TestimonyPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO testimonies (owner_id, \"order\", person, job, testimony, avatar, linkedin) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.person)
    .bind(&payload.job)
    .bind(&payload.testimony)
    .bind(&payload.avatar)
    .bind(&payload.linkedin)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /testimonies/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Testimony>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /testimonies/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Testimony>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: TestimonyPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE testimonies SET \"order\" = ?, person = ?, job = ?, testimony = ?, avatar = ?, \
         linkedin = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.person)
    .bind(&payload.job)
    .bind(&payload.testimony)
    .bind(&payload.avatar)
    .bind(&payload.linkedin)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /testimonies/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Testimony>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: TestimonyPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE testimonies SET \
         \"order\" = COALESCE(?, \"order\"), person = COALESCE(?, person), job = COALESCE(?, job), \
         testimony = COALESCE(?, testimony), avatar = COALESCE(?, avatar), \
         linkedin = COALESCE(?, linkedin) WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.person)
    .bind(&payload.job)
    .bind(&payload.testimony)
    .bind(&payload.avatar)
    .bind(&payload.linkedin)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /testimonies/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM testimonies WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
