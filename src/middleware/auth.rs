use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context resolved from the bearer token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Token authentication middleware.
///
/// Resolves `Authorization: Bearer <key>` to exactly one identity before any
/// other processing; requests without a valid credential never reach a
/// handler.
pub async fn require_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let key = extract_token_from_headers(&headers).map_err(ApiError::unauthenticated)?;

    let row: Option<(i64, String)> = sqlx::query_as(
        "SELECT u.id, u.username FROM tokens t JOIN users u ON u.id = t.user_id WHERE t.key = ?",
    )
    .bind(&key)
    .fetch_optional(&state.pool)
    .await?;

    let (id, username) = row.ok_or_else(|| ApiError::unauthenticated("Invalid token"))?;

    request.extensions_mut().insert(AuthUser { id, username });
    Ok(next.run(request).await)
}

/// Extract the bearer token from the Authorization header
fn extract_token_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.trim().to_string())
    } else {
        Err("Authorization header must use Bearer token format".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc123"));
        assert_eq!(extract_token_from_headers(&headers).unwrap(), "abc123");
    }

    #[test]
    fn rejects_missing_header() {
        assert!(extract_token_from_headers(&HeaderMap::new()).is_err());
    }

    #[test]
    fn rejects_non_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Token abc123"));
        assert!(extract_token_from_headers(&headers).is_err());
    }

    #[test]
    fn rejects_empty_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert!(extract_token_from_headers(&headers).is_err());
    }
}
