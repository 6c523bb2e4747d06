//! Request field validation.

use crate::error::AppError;
use regex::Regex;
use std::sync::OnceLock;

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn month_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap())
}

pub fn require_non_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

pub fn validate_email(field: &str, value: &str) -> Result<(), AppError> {
    if !email_re().is_match(value) {
        return Err(AppError::Validation(format!(
            "{} must be a valid email address",
            field
        )));
    }
    Ok(())
}

/// Contribution months are `YYYY-MM` strings, month 01-12.
pub fn validate_month(field: &str, value: &str) -> Result<(), AppError> {
    if !month_re().is_match(value) {
        return Err(AppError::Validation(format!(
            "{} must match YYYY-MM",
            field
        )));
    }
    Ok(())
}

pub fn validate_max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.len() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_format() {
        assert!(validate_month("contributionMonth", "2025-01").is_ok());
        assert!(validate_month("contributionMonth", "2025-12").is_ok());
        assert!(validate_month("contributionMonth", "2025-13").is_err());
        assert!(validate_month("contributionMonth", "2025-00").is_err());
        assert!(validate_month("contributionMonth", "2025-1").is_err());
        assert!(validate_month("contributionMonth", "25-01").is_err());
        assert!(validate_month("contributionMonth", "2025-01-01").is_err());
    }

    #[test]
    fn email_format() {
        assert!(validate_email("email", "a@b.co").is_ok());
        assert!(validate_email("email", "not-an-email").is_err());
        assert!(validate_email("email", "a b@c.co").is_err());
    }

    #[test]
    fn required_fields() {
        assert!(require_non_empty("title", "x").is_ok());
        assert!(require_non_empty("title", "   ").is_err());
        assert!(require_non_empty("title", "").is_err());
    }
}
