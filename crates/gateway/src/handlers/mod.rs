//! API handlers module

pub mod documents;
pub mod graph;
pub mod health;
pub mod query;

use iotrag_common::errors::{AppError, Result};
use validator::Validate;

/// Run derive-based validation, reporting the first failing field
pub fn validate_request<T: Validate>(request: &T) -> Result<()> {
    request.validate().map_err(|errors| {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        AppError::Validation {
            message: errors.to_string(),
            field,
        }
    })
}
