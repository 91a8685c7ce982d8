//! Shared field checks used by the entity constructors and patches.
//!
//! Every check returns `DomainError::Validation` with the field name first so
//! that messages stay uniform across entities.

use serde::{Deserialize, Deserializer};

use crate::error::{DomainError, DomainResult};

/// Trim `value` and require it to be non-empty and at most `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    limit_text(field, trimmed, max)
}

/// Trim `value` and require it to be at most `max` characters (may be empty).
pub fn limit_text(field: &str, value: &str, max: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.chars().count() > max {
        return Err(DomainError::validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Require a finite, non-negative amount.
pub fn non_negative(field: &str, value: f64) -> DomainResult<f64> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!("{field} must be a number")));
    }
    if value < 0.0 {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(value)
}

/// Unwrap an optional input field or fail with a "required" validation error.
pub fn required<T>(field: &str, value: Option<T>) -> DomainResult<T> {
    value.ok_or_else(|| DomainError::validation(format!("{field} is required")))
}

/// Serde helper for patch fields that distinguish "absent" from `null`.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// a missing field stays `None`, `null` becomes `Some(None)`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
