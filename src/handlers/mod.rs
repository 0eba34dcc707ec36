pub mod case_studies;
pub mod courses;
pub mod education;
pub mod experiences;
pub mod menu_items;
pub mod menus;
pub mod program_categories;
pub mod programs;
pub mod resource_categories;
pub mod resources;
pub mod skill_categories;
pub mod skill_charts;
pub mod skills;
pub mod sub_menu_items;
pub mod testimonies;
pub mod users;

use crate::error::ApiError;
use serde_json::Value;

/// Parse a member-path identifier. A malformed id is indistinguishable from
/// a missing record to the caller.
pub(crate) fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::not_found("Record not found"))
}

/// Deserialize a request body into a typed payload, mapping missing or
/// unknown fields to `ValidationFailed`.
pub(crate) fn parse_payload<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_id_is_not_found() {
        assert_eq!(parse_id("abc").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(parse_id("1; DROP").unwrap_err().error_code(), "NOT_FOUND");
        assert_eq!(parse_id("42").unwrap(), 42);
    }
}
