use sqlx::SqlitePool;

/// Shared application state handed to every handler through the router.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
}
