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
pub struct Experience {
    pub order: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub job_title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub place: String,
    pub summary: String,
}

impl Owned for Experience {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperiencePayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: i64,
    pub job_title: String,
    pub company: String,
    pub start_date: String,
    pub end_date: String,
    pub place: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExperiencePatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub job_title: Option<String>,
    pub company: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub place: Option<String>,
    pub summary: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT e.*, u.username AS owner FROM experiences e JOIN users u ON u.id = e.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<Experience, ApiError> {
    sqlx::query_as::<_, Experience>(&format!("{} WHERE e.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /experiences/ - ordered by display order
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Experience>>, ApiError> {
    let sql = format!("{} ORDER BY e.\"order\", e.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, Experience>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /experiences/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: ExperiencePayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO experiences (owner_id, \"order\", job_title, company, start_date, end_date, place, summary) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.job_title)
    .bind(&payload.company)
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(&payload.place)
    .bind(&payload.summary)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /experiences/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Experience>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /experiences/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Experience>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ExperiencePayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE experiences SET \"order\" = ?, job_title = ?, company = ?, start_date = ?, \
         end_date = ?, place = ?, summary = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.job_title)
    .bind(&payload.company)
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(&payload.place)
    .bind(&payload.summary)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /experiences/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Experience>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ExperiencePatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE experiences SET \
         \"order\" = COALESCE(?, \"order\"), job_title = COALESCE(?, job_title), \
         company = COALESCE(?, company), start_date = COALESCE(?, start_date), \
         end_date = COALESCE(?, end_date), place = COALESCE(?, place), \
         summary = COALESCE(?, summary) WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.job_title)
    .bind(&payload.company)
    .bind(&payload.start_date)
    .bind(&payload.end_date)
    .bind(&payload.place)
    .bind(&payload.summary)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /experiences/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM experiences WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
