pub mod protected;
pub mod public;

use crate::error::ApiError;

/// Parse a numeric path id. Malformed or non-positive ids are a 400,
/// distinct from the 404 of a well-formed id that matches nothing.
pub fn parse_id(raw: &str, what: &str) -> Result<i64, ApiError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::bad_request(format!("invalid {} id: {}", what, raw))),
    }
}
