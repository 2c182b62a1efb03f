//! Query-string value parsing.

use govapi_settings::loader::parse_bool;

use crate::error::ApiError;

/// Parse an optional boolean query parameter. Absent or empty means `false`.
pub fn flag(name: &str, raw: Option<&str>) -> Result<bool, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some(value) => parse_bool(value).ok_or_else(|| {
            ApiError::BadRequest(format!("{name} must be a boolean (true or false)."))
        }),
    }
}
