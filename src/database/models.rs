use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// One credential per identity, provisioned at registration and never
/// regenerated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Token {
    pub key: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
