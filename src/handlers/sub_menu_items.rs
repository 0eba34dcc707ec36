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

use super::{parse_id, parse_payload};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubMenuItem {
    #[serde(skip_serializing)]
    pub owner_id: i64,
    pub owner: String,
    pub order: i64,
    pub id: i64,
    pub title: String,
    pub url: String,
    pub action: String,
    pub subtitle: String,
    pub icon: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl Owned for SubMenuItem {
    fn owner_id(&self) -> i64 {
        self.owner_id
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubMenuItemPayload {
    // Client-supplied owner is accepted and ignored; the caller is the owner.
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    #[serde(default)]
    pub order: i64,
    pub title: String,
    pub url: String,
    #[serde(default = "default_action")]
    pub action: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub icon: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubMenuItemPatch {
    #[serde(default, rename = "owner")]
    pub _owner: Option<Value>,
    pub order: Option<i64>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub action: Option<String>,
    pub subtitle: Option<String>,
    pub icon: Option<String>,
}

fn default_action() -> String {
    "push".to_string()
}

const BASE_SELECT: &str =
    "SELECT s.*, u.username AS owner FROM sub_menu_items s JOIN users u ON u.id = s.owner_id";

async fn fetch(pool: &SqlitePool, id: i64) -> Result<SubMenuItem, ApiError> {
    sqlx::query_as::<_, SubMenuItem>(&format!("{} WHERE s.id = ?", BASE_SELECT))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Record not found"))
}

/// Sub-menu items embedded under one menu item, in display order.
pub async fn load_for_menu_item(
    pool: &SqlitePool,
    menu_item_id: i64,
) -> Result<Vec<SubMenuItem>, ApiError> {
    let sql = format!(
        "{} JOIN menu_item_sub_menu_items j ON j.sub_menu_item_id = s.id \
         WHERE j.menu_item_id = ? ORDER BY s.\"order\", s.id",
        BASE_SELECT
    );
    Ok(sqlx::query_as::<_, SubMenuItem>(&sql)
        .bind(menu_item_id)
        .fetch_all(pool)
        .await?)
}

/// GET /sub-menu-items/
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<SubMenuItem>>, ApiError> {
    // Model-level default ordering: display order, insertion order tie-break
    let sql = format!("{} ORDER BY s.\"order\", s.id", BASE_SELECT);
    let rows = sqlx::query_as::<_, SubMenuItem>(&sql)
        .fetch_all(&state.pool)
        .await?;
    Ok(Json(rows))
}

/// POST /sub-menu-items/
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let payload: SubMenuItemPayload = parse_payload(body)?;
    let now = Utc::now();

    let result = sqlx::query(
        "INSERT INTO sub_menu_items (owner_id, \"order\", title, url, action, subtitle, icon, created_at, modified_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(&payload.subtitle)
    .bind(&payload.icon)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let created = fetch(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /sub-menu-items/:id/
pub async fn retrieve(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<SubMenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    Ok(Json(fetch(&state.pool, id).await?))
}

/// PUT /sub-menu-items/:id/
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SubMenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SubMenuItemPayload = parse_payload(body)?;

    sqlx::query(
        "UPDATE sub_menu_items SET \"order\" = ?, title = ?, url = ?, action = ?, subtitle = ?, icon = ?, modified_at = ? \
         WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(&payload.subtitle)
    .bind(&payload.icon)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// PATCH /sub-menu-items/:id/
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<SubMenuItem>, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;
    let payload: SubMenuItemPatch = parse_payload(body)?;

    sqlx::query(
        "UPDATE sub_menu_items SET \
         \"order\" = COALESCE(?, \"order\"), title = COALESCE(?, title), url = COALESCE(?, url), \
         action = COALESCE(?, action), subtitle = COALESCE(?, subtitle), icon = COALESCE(?, icon), \
         modified_at = ? WHERE id = ?",
    )
    .bind(payload.order)
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.action)
    .bind(&payload.subtitle)
    .bind(&payload.icon)
    .bind(Utc::now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    Ok(Json(fetch(&state.pool, id).await?))
}

/// DELETE /sub-menu-items/:id/
pub async fn destroy(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(raw_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&raw_id)?;
    let existing = fetch(&state.pool, id).await?;
    ensure_owner(&user, &existing)?;

    sqlx::query("DELETE FROM sub_menu_items WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
