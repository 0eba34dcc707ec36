use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Errors from store construction and maintenance
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Open the connection pool and make sure the schema exists.
///
/// Schema setup runs as a sequence of idempotent CREATE statements; there is
/// no migration tooling in this system.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|_| StoreError::InvalidDatabaseUrl(url.to_string()))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!("store ready at {}", url);
    Ok(pool)
}

/// Pings the pool to ensure connectivity
pub async fn health_check(pool: &SqlitePool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

async fn init_schema(pool: &SqlitePool) -> Result<(), StoreError> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

// Every content table carries owner_id; association tables cascade with both
// sides so deleting a parent orphans children instead of deleting them.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tokens (
        key TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS sub_menu_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL DEFAULT 0,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        action TEXT NOT NULL DEFAULT 'push',
        subtitle TEXT NOT NULL DEFAULT '',
        icon TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS menu_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL DEFAULT 0,
        title TEXT NOT NULL,
        url TEXT NOT NULL DEFAULT '',
        action TEXT NOT NULL DEFAULT 'push',
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS menus (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL,
        modified_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS menu_menu_items (
        menu_id INTEGER NOT NULL REFERENCES menus(id) ON DELETE CASCADE,
        menu_item_id INTEGER NOT NULL REFERENCES menu_items(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS menu_item_sub_menu_items (
        menu_item_id INTEGER NOT NULL REFERENCES menu_items(id) ON DELETE CASCADE,
        sub_menu_item_id INTEGER NOT NULL REFERENCES sub_menu_items(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS skill_charts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        title1 TEXT NOT NULL,
        points1 INTEGER NOT NULL DEFAULT 0,
        title2 TEXT NOT NULL,
        points2 INTEGER NOT NULL DEFAULT 0,
        title3 TEXT NOT NULL,
        points3 INTEGER NOT NULL DEFAULT 0,
        title4 TEXT NOT NULL,
        points4 INTEGER NOT NULL DEFAULT 0,
        title5 TEXT NOT NULL,
        points5 INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS skill_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL UNIQUE,
        url TEXT NOT NULL DEFAULT '',
        message TEXT NOT NULL DEFAULT ''
    )",
    "CREATE TABLE IF NOT EXISTS skills (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL DEFAULT 0,
        name TEXT NOT NULL UNIQUE,
        logo TEXT NOT NULL,
        skill_level INTEGER NOT NULL DEFAULT 0,
        months_worked INTEGER NOT NULL DEFAULT 0,
        last_project TEXT NOT NULL,
        skill_chart_id INTEGER REFERENCES skill_charts(id) ON DELETE CASCADE,
        website TEXT NOT NULL,
        documentation TEXT NOT NULL,
        github TEXT NOT NULL,
        why TEXT NOT NULL,
        preferred INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS skill_skill_categories (
        skill_id INTEGER NOT NULL REFERENCES skills(id) ON DELETE CASCADE,
        category_id INTEGER NOT NULL REFERENCES skill_categories(id) ON DELETE CASCADE
    )",
    "CREATE TABLE IF NOT EXISTS experiences (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL,
        job_title TEXT NOT NULL,
        company TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        place TEXT NOT NULL,
        summary TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS program_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        url TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS programs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        program_category_id INTEGER REFERENCES program_categories(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        logo TEXT NOT NULL,
        summary TEXT NOT NULL DEFAULT '',
        website TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS education (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL,
        place TEXT NOT NULL,
        place_logo TEXT NOT NULL,
        description TEXT NOT NULL,
        website TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS courses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL,
        place TEXT NOT NULL,
        place_logo TEXT NOT NULL,
        course_title TEXT NOT NULL,
        description TEXT NOT NULL,
        main_focus TEXT NOT NULL,
        website TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS testimonies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL,
        person TEXT NOT NULL,
        job TEXT NOT NULL,
        testimony TEXT NOT NULL,
        avatar TEXT NOT NULL,
        linkedin TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS case_studies (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        \"order\" INTEGER NOT NULL,
        title TEXT NOT NULL,
        subtitle TEXT NOT NULL,
        summary TEXT NOT NULL,
        cta TEXT NOT NULL DEFAULT 'View More',
        url TEXT NOT NULL,
        tags TEXT NOT NULL DEFAULT '',
        coming_soon INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS resource_categories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        url TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS resources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        resource_category_id INTEGER REFERENCES resource_categories(id) ON DELETE CASCADE,
        reference TEXT NOT NULL,
        description TEXT NOT NULL,
        price REAL NOT NULL,
        link TEXT NOT NULL
    )",
];
