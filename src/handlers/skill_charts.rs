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

/// A radar-chart dataset shared by skills; five fixed axes.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SkillChart {
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub name: String,
    pub title1: String,
    pub points1: i64,
    pub title2: String,
    pub points2: i64,
    pub title3: String,
    pub points3: i64,
    pub title4: String,
    pub points4: i64,
    pub title5: String,
    pub points5: i64,
}

impl Owned for SkillChart {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillChartPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: String,
    pub title1: String,
    #[serde(default)]
    pub points1: i64,
    pub title2: String,
    #[serde(default)]
    pub points2: i64,
    pub title3: String,
    #[serde(default)]
    pub points3: i64,
    pub title4: String,
    #[serde(default)]
    pub points4: i64,
    pub title5: String,
    #[serde(default)]
    pub points5: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillChartPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: Option<String>,
    pub title1: Option<String>,
    pub points1: Option<i64>,
    pub title2: Option<String>,
    pub points2: Option<i64>,
    pub title3: Option<String>,
    pub points3: Option<i64>,
    pub title4: Option<String>,
    pub points4: Option<i64>,
    pub title5: Option<String>,
    pub points5: Option<i64>,
}

const BASE_SELECT: &str =
    "SELECT c.*, u.username AS owner FROM skill_charts c JOIN users u ON u.id = c.owner_id";

pub(super) async fn fetch(pool: &SqlitePool, id: i64) -> Result<SkillChart, ApiError> {
    sqlx::query_as::<_, SkillChart>(&format!("{} WHERE c.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /skill-charts/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SkillChart>>, ApiError> {
    let sql = format!("{} ORDER BY c.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, SkillChart>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /skill-charts/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: SkillChartPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO skill_charts (owner_id, name, title1, points1, title2, points2, title3, points3, title4, points4, title5, points5) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&payload.name)
    .bind(&payload.title1)
    .bind(payload.points1)
    .bind(&payload.title2)
    .bind(payload.points2)
    .bind(&payload.title3)
    .bind(payload.points3)
    .bind(&payload.title4)
    .bind(payload.points4)
    .bind(&payload.title5)
    .bind(payload.points5)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /skill-charts/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<SkillChart>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /skill-charts/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SkillChart>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillChartPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE skill_charts SET name = ?, title1 = ?, points1 = ?, title2 = ?, points2 = ?, \
         title3 = ?, points3 = ?, title4 = ?, points4 = ?, title5 = ?, points5 = ? WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.title1)
    .bind(payload.points1)
    .bind(&payload.title2)
    .bind(payload.points2)
    .bind(&payload.title3)
    .bind(payload.points3)
    .bind(&payload.title4)
    .bind(payload.points4)
    .bind(&payload.title5)
    .bind(payload.points5)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /skill-charts/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SkillChart>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillChartPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE skill_charts SET \
         name = COALESCE(?, name), \
         title1 = COALESCE(?, title1), points1 = COALESCE(?, points1), \
         title2 = COALESCE(?, title2), points2 = COALESCE(?, points2), \
         title3 = COALESCE(?, title3), points3 = COALESCE(?, points3), \
         title4 = COALESCE(?, title4), points4 = COALESCE(?, points4), \
         title5 = COALESCE(?, title5), points5 = COALESCE(?, points5) \
         WHERE id = ?",
    )
    .bind(&payload.name)
    .bind(&payload.title1)
    .bind(payload.points1)
    .bind(&payload.title2)
    .bind(payload.points2)
    .bind(&payload.title3)
    .bind(payload.points3)
    .bind(&payload.title4)
    .bind(payload.points4)
    .bind(&payload.title5)
    .bind(payload.points5)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /skill-charts/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM skill_charts WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
