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

use super::menu_items::{self, MenuItem};
use super::{parse_id, parse_payload};

#[derive(Debug, Clone, FromRow)]
pub struct MenuRow {
    pub owner_id: i64,
    pub owner: String,
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Owned for MenuRow {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

/// External shape: menu embeds its items, which embed their sub-items.
#[derive(Debug, Serialize)]
pub struct Menu {
    pub owner: String,
    pub id: i64,
    pub name: String,
    pub menu_items: Vec<MenuItem>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuPayload {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub name: String,
}

const BASE_SELECT: &str =
    "SELECT m.*, u.username AS owner FROM menus m JOIN users u ON u.id = m.owner_id";

async fn fetch_row(pool: &SqlitePool, id: i64) -> Result<MenuRow, ApiError> {
    sqlx::query_as::<_, MenuRow>(&format!("{} WHERE m.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

async fn assemble(pool: &SqlitePool, row: MenuRow) -> Result<Menu, ApiError> {
    let menu_items = menu_items::load_for_menu(pool, row.id).await?;
    Ok(Menu {
        owner: row.owner,
        id: row.id,
        name: row.name,
        menu_items,
        created_at: row.created_at,
        modified_at: row.modified_at,
    })
}

/// Association step: a freshly created menu item belongs to no menu until it
/// is attached here.
pub async fn attach_menu_item(
    pool: &SqlitePool,
    menu_id: i64,
    menu_item_id: i64,
) -> Result<(), ApiError> {
    sqlx::query("INSERT INTO menu_menu_items (menu_id, menu_item_id) VALUES (?, ?)")
        .bind(menu_id)
        .bind(menu_item_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// GET /menus/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Menu>>, ApiError> {
    let sql = format!("{} ORDER BY m.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, MenuRow>(&sql)
        .fetch_all(&state.pool)
        .await?;

    let mut menus = Vec::with_capacity(rows.len());
    for row in rows {
        menus.push(assemble(&state.pool, row).await?);
    }
    Ok(Json(menus))
}

/// POST /menus/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: MenuPayload = parse_payload(body)?;
    let now = Utc::now();

    let result =
        sqlx::query("INSERT INTO menus (owner_id, name, created_at, modified_at) VALUES (?, ?, ?, ?)")
            .bind(user.id)
            .bind(&payload.name)
            .bind(now)
            .bind(now)
            .execute(&state.pool)
            .await?;

    let row = fetch_row(&state.pool, result.last_insert_rowid()).await?;
    let created = assemble(&state.pool, row).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /menus/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Menu>, ApiError> {
    let id = parse_id(&raw_id)?;
    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PUT /menus/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Menu>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: MenuPayload = parse_payload(body)?;

    sqlx::query("UPDATE menus SET name = ?, modified_at = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// PATCH /menus/:id/
///
/// The menu has a single writable field, so partial update accepts the same
/// payload with the field optional.
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Menu>, ApiError> {
    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct MenuPatch {
        #[serde(default, rename = "owner")]
        _owner: Option<Value>,
        name: Option<String>,
    }

    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: MenuPatch = parse_payload(body)?;

    sqlx::query("UPDATE menus SET name = COALESCE(?, name), modified_at = ? WHERE id = ?")
        .bind(&payload.name)
        .bind(Utc::now())
        .bind(id)
        .execute(&state.pool)
        .await?;

    let row = fetch_row(&state.pool, id).await?;
    Ok(Json(assemble(&state.pool, row).await?))
}

/// DELETE /menus/:id/
///
/// Hard delete. Association rows go with the menu; the menu items themselves
/// survive and stay retrievable by id.
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch_row(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM menus WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
