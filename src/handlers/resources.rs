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

use super::resource_categories::{self, ResourceCategory};
use super::{parse_id, parse_payload};

#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub id: i64,
    pub owner_id: i64,
    pub owner: String,
    pub resource_category_id: Option<i64>,
    pub reference: String,
    pub description: String,
    pub price: f64,
    pub link: String,
}

impl Owned for ResourceRow {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// External shape: the category is embedded in full.
#[derive(Debug, Serialize)]
pub struct Resource {
    pub id: i64,
    pub owner: String,
    pub resource_category: Option<ResourceCategory>,
    pub reference: String,
    pub description: String,
    pub price: f64,
    pub link: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    #[serde(default)]
    pub resource_category: Option<i64>,
    pub reference: String,
    pub description: String,
    pub price: f64,
    pub link: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourcePatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub resource_category: Option<i64>,
    pub reference: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub link: Option<String>,
}

const BASE_SELECT: &str =
    "SELECT r.*, u.username AS owner FROM resources r JOIN users u ON u.id = r.owner_id";

async fn fetch_row(pool: &SqlitePool, id: i64) -> Result<ResourceRow, ApiError> {
    sqlx::query_as::<_, ResourceRow>(&format!("{} WHERE r.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

async fn assemble(pool: &SqlitePool, row: ResourceRow) -> Result<Resource, ApiError> {
    let resource_category = match row.resource_category_id {
        Some(category_id) => Some(resource_categories::fetch(pool, category_id).await?),
        None => None,
    };
    Ok(Resource {
        id: row.id,
        owner: row.owner,
        resource_category,
        reference: row.reference,
        description: row.description,
        price: row.price,
        link: row.link,
    })
}

/// GET /resources/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Resource>>, ApiError> {
    let sql = format!("{} ORDER BY r.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, ResourceRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let mut resources = Vec::with_capacity(rows.len());
    for row in rows {
        resources.push(assemble(&state.pool, row).await?);
    }
    Ok(Json(resources))
}

/// POST /resources/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: ResourcePayload = parse_payload(body)?;

    let result = sqlx::query(
        "INSERT INTO resources (owner_id, resource_category_id, reference, description, price, link) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.resource_category)
    .bind(&payload.reference)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.link)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, result.last_insert_rowid()).await?;
    let created = assemble(&state.pool, row).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /resources/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    let id = parse_id(&raw_id)?;
    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PUT /resources/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Resource>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ResourcePayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE resources SET resource_category_id = ?, reference = ?, description = ?, price = ?, \
         link = ? WHERE id = ?",
    )
    .bind(payload.resource_category)
    .bind(&payload.reference)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.link)
    .bind(id)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PATCH /resources/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Resource>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: ResourcePatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE resources SET \
         resource_category_id = COALESCE(?, resource_category_id), \
         reference = COALESCE(?, reference), description = COALESCE(?, description), \
         price = COALESCE(?, price), link = COALESCE(?, link) WHERE id = ?",
    )
    .bind(payload.resource_category)
    .bind(&payload.reference)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.link)
    .bind(id)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// DELETE /resources/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM resources WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
