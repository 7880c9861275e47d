//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod chat;
pub mod health;
pub mod receipts;
pub mod summaries;

// Re-export all handlers for use in router
pub use chat::*;
pub use health::*;
pub use receipts::*;
pub use summaries::*;

use chrono::NaiveDate;

use crate::AppError;

/// Parse an optional `YYYY-MM-DD` query parameter
pub(crate) fn parse_date_param(
    value: Option<&str>,
    name: &str,
) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| AppError::bad_request(&format!("Invalid {} (expected YYYY-MM-DD): {}", name, v))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_param() {
        assert_eq!(parse_date_param(None, "date").unwrap(), None);
        assert_eq!(parse_date_param(Some(" "), "date").unwrap(), None);
        assert_eq!(
            parse_date_param(Some("2024-03-01"), "date").unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        let err = parse_date_param(Some("01/03/2024"), "date").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
