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

use super::skill_charts::{self, SkillChart};
use super::{parse_id, parse_payload};

#[derive(Debug, Clone, FromRow)]
pub struct SkillRow {
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub order: i64,
    pub name: String,
    pub logo: String,
    pub skill_level: i64,
    pub months_worked: i64,
    pub last_project: String,
    pub skill_chart_id: Option<i64>,
    pub website: String,
    pub documentation: String,
    pub github: String,
    pub why: String,
    pub preferred: bool,
}

impl Owned for SkillRow {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// External shape: categories stay id references, the chart is embedded in
/// full.
#[derive(Debug, Serialize)]
pub struct Skill {
    pub owner: String,
    pub id: i64,
    pub order: i64,
    pub category: Vec<i64>,
    pub name: String,
    pub logo: String,
    pub skill_level: i64,
    pub months_worked: i64,
    pub last_project: String,
    pub skill_chart: Option<SkillChart>,
    pub website: String,
    pub documentation: String,
    pub github: String,
    pub why: String,
    pub preferred: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub category: Vec<i64>,
    pub name: String,
    pub logo: String,
    #[serde(default)]
    pub skill_level: i64,
    #[serde(default)]
    pub months_worked: i64,
    pub last_project: String,
    #[serde(default)]
    pub skill_chart: Option<i64>,
    pub website: String,
    pub documentation: String,
    pub github: String,
    pub why: String,
    #[serde(default)]
    pub preferred: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkillPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub category: Option<Vec<i64>>,
    pub name: Option<String>,
    pub logo: Option<String>,
    pub skill_level: Option<i64>,
    pub months_worked: Option<i64>,
    pub last_project: Option<String>,
    pub skill_chart: Option<i64>,
    pub website: Option<String>,
    pub documentation: Option<String>,
    pub github: Option<String>,
    pub why: Option<String>,
    pub preferred: Option<bool>,
}

const BASE_SELECT: &str =
    "SELECT s.*, u.username AS owner FROM skills s JOIN users u ON u.id = s.owner_id";

async fn fetch_row(pool: &SqlitePool, id: i64) -> Result<SkillRow, ApiError> {
    sqlx::query_as::<_, SkillRow>(&format!("{} WHERE s.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

async fn assemble(pool: &SqlitePool, row: SkillRow) -> Result<Skill, ApiError> {
    let category: Vec<i64> = sqlx::query_scalar(
        "SELECT category_id FROM skill_skill_categories WHERE skill_id = ? ORDER BY category_id",
    )
    .bind(row.id)
    .fetch_all(pool)
    .await?;

    let skill_chart = match row.skill_chart_id {
        Some(chart_id) => Some(skill_charts::fetch(pool, chart_id).await?),
        None => None,
    };

    Ok(Skill {
        owner: row.owner,
        id: row.id,
        order: row.order,
        category,
        name: row.name,
        logo: row.logo,
        skill_level: row.skill_level,
        months_worked: row.months_worked,
        last_project: row.last_project,
        skill_chart,
        website: row.website,
        documentation: row.documentation,
        github: row.github,
        why: row.why,
        preferred: row.preferred,
    })
}

async fn assemble_all(pool: &SqlitePool, rows: Vec<SkillRow>) -> Result<Vec<Skill>, ApiError> {
    let mut skills = Vec::with_capacity(rows.len());
    for row in rows {
        skills.push(assemble(pool, row).await?);
    }
    Ok(skills)
}

async fn replace_categories(
    pool: &SqlitePool,
    skill_id: i64,
    category_ids: &[i64],
) -> Result<(), ApiError> {
    sqlx::query("DELETE FROM skill_skill_categories WHERE skill_id = ?")
        .bind(skill_id)
        .execute(pool)
        .await?;
    for category_id in category_ids {
        sqlx::query("INSERT INTO skill_skill_categories (skill_id, category_id) VALUES (?, ?)")
            .bind(skill_id)
            .bind(category_id)
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// GET /skills/ - alphabetical listing
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Skill>>, ApiError> {
    let sql = format!("{} ORDER BY s.name, s.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, SkillRow>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(assemble_all(&state.pool, rows).await?))
}

/// GET /skills/search/:url/ - skills whose category set contains a category
/// with this exact url, in display order.
pub async fn search(
    State(state): State<AppState>,
    Path(url): Path<String>,
) -> Result<Json<Vec<Skill>>, ApiError> {
    let sql = format!(
        "{} WHERE s.id IN (SELECT j.skill_id FROM skill_skill_categories j \
         JOIN skill_categories c ON c.id = j.category_id WHERE c.url = ?) \
         ORDER BY s.\"order\", s.id",
        BASE_SELECT
    );
    let rows = sqlx::query_as::<_, SkillRow>(&sql)
        .bind(&url)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(assemble_all(&state.pool, rows).await?))
}

/// POST /skills/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: SkillPayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO skills (owner_id, \"order\", name, logo, skill_level, months_worked, last_project, \
         skill_chart_id, website, documentation, github, why, preferred) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(payload.skill_level)
    .bind(payload.months_worked)
    .bind(&payload.last_project)
    .bind(payload.skill_chart)
    .bind(&payload.website)
    .bind(&payload.documentation)
    .bind(&payload.github)
    .bind(&payload.why)
    .bind(payload.preferred)
    .execute(&state.pool)
    .await?;

    let id = result.last_insert_rowid();
    replace_categories(&state.pool, id, &payload.category).await?;

    let row = fetch_row(&state.pool, id).await?;
    let created = assemble(&state.pool, row).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /skills/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Skill>, ApiError> {
    let id = parse_id(&raw_id)?;
    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PUT /skills/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Skill>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE skills SET \"order\" = ?, name = ?, logo = ?, skill_level = ?, months_worked = ?, \
         last_project = ?, skill_chart_id = ?, website = ?, documentation = ?, github = ?, why = ?, \
         preferred = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(payload.skill_level)
    .bind(payload.months_worked)
    .bind(&payload.last_project)
    .bind(payload.skill_chart)
    .bind(&payload.website)
    .bind(&payload.documentation)
    .bind(&payload.github)
    .bind(&payload.why)
    .bind(payload.preferred)
    .bind(id)
    .execute(&state.pool)
    .await?;

    replace_categories(&state.pool, id, &payload.category).await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PATCH /skills/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Skill>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SkillPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE skills SET \
         \"order\" = COALESCE(?, \"order\"), name = COALESCE(?, name), logo = COALESCE(?, logo), \
         skill_level = COALESCE(?, skill_level), months_worked = COALESCE(?, months_worked), \
         last_project = COALESCE(?, last_project), skill_chart_id = COALESCE(?, skill_chart_id), \
         website = COALESCE(?, website), documentation = COALESCE(?, documentation), \
         github = COALESCE(?, github), why = COALESCE(?, why), preferred = COALESCE(?, preferred) \
         WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.name)
    .bind(&payload.logo)
    .bind(payload.skill_level)
    .bind(payload.months_worked)
    .bind(&payload.last_project)
    .bind(payload.skill_chart)
    .bind(&payload.website)
    .bind(&payload.documentation)
    .bind(&payload.github)
    .bind(&payload.why)
    .bind(payload.preferred)
    .bind(id)
    .execute(&state.pool)
    .await?;

    if let Some(category_ids) = &payload.category {
        replace_categories(&state.pool, id, category_ids).await?;
    }

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// DELETE /skills/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM skills WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
