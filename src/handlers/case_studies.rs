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
pub struct CaseStudy {
    pub order: i64,
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    pub cta: String,
    pub url: String,
    pub tags: String,
    pub coming_soon: bool,
}

impl Owned for CaseStudy {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseStudyPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: i64,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    #[serde(default = "default_cta")]
    pub cta: String,
    pub url: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub coming_soon: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CaseStudyPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    pub cta: Option<String>,
    pub url: Option<String>,
    pub tags: Option<String>,
    pub coming_soon: Option<bool>,
}

fn default_cta() -> String {
    "View More".to_string()
}

const BASE_SELECT: &str =
    "SELECT c.*, u.username AS owner FROM case_studies c JOIN users u ON u.id = c.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<CaseStudy, ApiError> {
    sqlx::query_as::<_, CaseStudy>(&format!("{} WHERE c.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// GET /case-studies/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<CaseStudy>>, ApiError> {
    let sql = format!("{} ORDER BY c.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, CaseStudy>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /case-studies/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: CaseStudyPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO case_studies (owner_id, \"order\", title, subtitle, summary, cta, url, tags, coming_soon) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.subtitle)
    .bind(&payload.summary)
    .bind(&payload.cta)
    .bind(&payload.url)
    .bind(&payload.tags)
    .bind(payload.coming_soon)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /case-studies/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<CaseStudy>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /case-studies/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<CaseStudy>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: CaseStudyPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE case_studies SET \"order\" = ?, title = ?, subtitle = ?, summary = ?, cta = ?, \
         url = ?, tags = ?, coming_soon = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.subtitle)
    .bind(&payload.summary)
    .bind(&payload.cta)
    .bind(&payload.url)
    .bind(&payload.tags)
    .bind(payload.coming_soon)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /case-studies/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<CaseStudy>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: CaseStudyPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE case_studies SET \
         \"order\" = COALESCE(?, \"order\"), title = COALESCE(?, title), \
         subtitle = COALESCE(?, subtitle), summary = COALESCE(?, summary), cta = COALESCE(?, cta), \
         url = COALESCE(?, url), tags = COALESCE(?, tags), \
         coming_soon = COALESCE(?, coming_soon) WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.subtitle)
    .bind(&payload.summary)
    .bind(&payload.cta)
    .bind(&payload.url)
    .bind(&payload.tags)
    .bind(payload.coming_soon)
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /case-studies/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM case_studies WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
