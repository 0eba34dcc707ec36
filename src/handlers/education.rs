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
pub struct Education {
    pub order: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub place: String,
    pub place_logo: String,
    pub description: String,
    pub website: String,
}

impl Owned for Education {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EducationPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: i64,
    pub place: String,
    pub place_logo: String,
    pub description: String,
    pub website: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EducationPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub place: Option<String>,
    pub place_logo: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT e.*, u.username AS owner FROM education e JOIN users u ON u.id = e.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<Education, ApiError> {
    sqlx::query_as::<_, Education>(&format!("{} WHERE e.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /education/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Education>>, ApiError> {
    let sql = format!("{} ORDER BY e.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, Education>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /education/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: EducationPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO education (owner_id, \"order\", place, place_logo, description, website) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.place)
    .bind(&payload.place_logo)
    .bind(&payload.description)
    .bind(&payload.website)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /education/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Education>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /education/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Education>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: EducationPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE education SET \"order\" = ?, place = ?, place_logo = ?, description = ?, website = ? \
         WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.place)
    .bind(&payload.place_logo)
    .bind(&payload.description)
    .bind(&payload.website)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /education/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Education>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: EducationPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE education SET \
         \"order\" = COALESCE(?, \"order\"), place = COALESCE(?, place), \
         place_logo = COALESCE(?, place_logo), description = COALESCE(?, description), \
         website = COALESCE(?, website) WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.place)
    .bind(&payload.place_logo)
    .bind(&payload.description)
    .bind(&payload.website)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /education/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM education WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
