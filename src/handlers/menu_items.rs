use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, SqlitePool};

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::policy::{ensure_owner, Owned};
use crate::state::AppState;

use super::sub_menu_items::{self, SubMenuItem};
use super::{parse_id, parse_payload};

#[derive(Debug, Clone, FromRow)]
pub struct MenuItemRow {
    pub owner_id: i64,
    pub owner: String,
    pub order: i64,
    pub id: i64,
    pub title: String,
    pub url: String,
    pub action: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Owned for MenuItemRow {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// External shape: the row plus its embedded sub-menu items.
#[derive(Debug, Serialize)]
pub struct MenuItem {
    pub owner: String,
    pub order: i64,
    pub id: i64,
    pub title: String,
    pub url: String,
    pub action: String,
    pub sub_menu_items: Vec<SubMenuItem>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItemPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    #[serde(default)]
    pub order: i64,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_action")]
    pub action: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItemPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub action: Option<String>,
}

fn default_action() -> String {
    "push".to_string()
}

const BASE_SELECT: &str =
    "SELECT m.*, u.username AS owner FROM menu_items m JOIN users u ON u.id = m.owner_id";

async fn fetch_row(pool: &SqlitePool, id: i64) -> Result<MenuItemRow, ApiError> {
    sqlx::query_as::<_, MenuItemRow>(&format!("{} WHERE m.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

async fn assemble(pool: &SqlitePool, row: MenuItemRow) -> Result<MenuItem, ApiError> {
    let sub_menu_items = sub_menu_items::load_for_menu_item(pool, row.id).await?;
    Ok(MenuItem {
        owner: row.owner,
        order: row.order,
        id: row.id,
        title: row.title,
        url: row.url,
        action: row.action,
        sub_menu_items,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}

/// Menu items embedded under one menu, each with its own sub-menu items.
pub async fn load_for_menu(pool: &SqlitePool, menu_id: i64) -> Result<Vec<MenuItem>, ApiError> {
    let sql = format!(
        "{} JOIN menu_menu_items j ON j.menu_item_id = m.id WHERE j.menu_id = ? ORDER BY m.id",
        BASE_SELECT
    );
    let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
        .bind(menu_id)
        .fetch_all(pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(assemble(pool, row).await?);
    }
    Ok(items)
}

/// Association step: membership is never implied by creation.
pub async fn attach_sub_menu_item(
    pool: &SqlitePool,
    menu_item_id: i64,
    sub_menu_item_id: i64,
) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO menu_item_sub_menu_items (menu_item_id, sub_menu_item_id) VALUES (?, ?)")
        .bind(menu_item_id)
        .bind(sub_menu_item_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// GET /menu-items/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<MenuItem>>, ApiError> {
    let sql = format!("{} ORDER BY m.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(assemble(&state.pool, row).await?);
    }
    Ok(Json(items))
}

/// POST /menu-items/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: MenuItemPayload = parse_payload(body)?;
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO menu_items (owner_id, \"order\", title, url, action, created_at, modified_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, result.last_insert_rowid()).await?;
    let created = assemble(&state.pool, row).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /menu-items/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<MenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PUT /menu-items/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: MenuItemPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE menu_items SET \"order\" = ?, title = ?, url = ?, action = ?, modified_at = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PATCH /menu-items/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: MenuItemPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE menu_items SET \
         \"order\" = COALESCE(?, \"order\"), title = COALESCE(?, title), \
         url = COALESCE(?, url), action = COALESCE(?, action), modified_at = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// DELETE /menu-items/:id/
///
/// Removes the item and its association rows; sub-menu items themselves
/// survive (aggregation, not ownership).
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM menu_items WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
