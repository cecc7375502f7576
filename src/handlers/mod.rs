//! HTTP handlers: extract and validate, call the service, shape the response.

pub mod category;
pub mod order;
pub mod package;
pub mod product;
pub mod user;

use crate::error::AppError;

/// Numeric path id; anything else is a 400.
pub(crate) fn parse_id(raw: &str) -> Result<i32, AppError> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("invalid id".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_positive_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("0").is_err());
        assert!(parse_id("-3").is_err());
        assert!(parse_id("dragon-knight").is_err());
    }
}
