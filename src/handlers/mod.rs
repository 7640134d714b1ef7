// handlers/mod.rs - three handler tiers
//
// Public (optional auth) -> Protected (any staff role) -> Elevated (admin)
pub mod elevated;
pub mod protected;
pub mod public;

use crate::error::ApiError;

/// School ids arrive as path text; anything that is not a positive integer is a 400.
pub(crate) fn parse_school_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::invalid_field("id", "must be a positive integer")),
    }
}
