//! Internal helpers for input validation and normalization.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation so every operation rejects bad input the same way.

use crate::{EngineError, MoneyCents, ResultEngine};

/// Trim a required text field, rejecting empty values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trim an optional text field, mapping blank values to `None`.
pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Ensure a money amount is strictly positive.
pub(crate) fn ensure_positive_amount(amount_minor: i64, label: &str) -> ResultEngine<()> {
    if amount_minor <= 0 {
        return Err(EngineError::InvalidAmount(format!(
            "{label} must be > 0, got {}",
            MoneyCents::new(amount_minor)
        )));
    }
    Ok(())
}

/// Clamp a page size into `1..=max`, falling back to `default`.
pub(crate) fn page_limit(limit: Option<u64>, default: u64, max: u64) -> u64 {
    limit.filter(|l| *l > 0).unwrap_or(default).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_is_trimmed() {
        assert_eq!(
            normalize_required_text("  Ada ", "name"),
            Ok("Ada".to_string())
        );
        assert_eq!(
            normalize_required_text("   ", "name"),
            Err(EngineError::InvalidInput("name must not be empty".to_string()))
        );
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(normalize_optional_text(Some("  ")), None);
        assert_eq!(normalize_optional_text(None), None);
        assert_eq!(
            normalize_optional_text(Some(" lunch ")),
            Some("lunch".to_string())
        );
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(ensure_positive_amount(1, "amount").is_ok());
        assert_eq!(
            ensure_positive_amount(-250, "amount"),
            Err(EngineError::InvalidAmount(
                "amount must be > 0, got -$2.50".to_string()
            ))
        );
    }

    #[test]
    fn page_limit_clamps() {
        assert_eq!(page_limit(None, 10, 100), 10);
        assert_eq!(page_limit(Some(0), 10, 100), 10);
        assert_eq!(page_limit(Some(500), 10, 100), 100);
        assert_eq!(page_limit(Some(25), 10, 100), 25);
    }
}
