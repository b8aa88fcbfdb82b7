//! Pre-submission checks shared by resource kinds.

use crate::error::{ProviderError, Result};
use crate::ident;

pub const COLORS: &[&str] = &[
    "magenta", "red", "volcano", "orange", "gold", "lime", "green", "cyan", "blue", "geekblue",
    "purple",
];

pub fn range(field: &str, value: i64, min: i64, max: i64) -> Result<()> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ProviderError::validation(
            field,
            format!("expected a value between {} and {}, got {}", min, max, value),
        ))
    }
}

pub fn required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(ProviderError::validation(field, "must not be empty"))
    } else {
        Ok(())
    }
}

/// Optional text that, when given, must contain more than whitespace.
pub fn not_blank(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => required(field, v),
        None => Ok(()),
    }
}

pub fn uuid(field: &str, value: &str) -> Result<()> {
    required(field, value)?;
    ident::require_uuid(field, value)
}

pub fn optional_uuid(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if !v.is_empty() => ident::require_uuid(field, v),
        _ => Ok(()),
    }
}

/// Rule payloads are JSON documents whose top level must be an object.
pub fn json_object(field: &str, value: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(value) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(ProviderError::validation(field, "must be a JSON object")),
        Err(err) => Err(ProviderError::validation(field, format!("invalid JSON: {}", err))),
    }
}

pub fn one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ProviderError::validation(
            field,
            format!("{:?} is not one of {}", value, allowed.join(", ")),
        ))
    }
}

pub fn color(field: &str, value: &str) -> Result<()> {
    one_of(field, value, COLORS)
}

pub fn min_items<T>(field: &str, items: &[T], min: usize) -> Result<()> {
    if items.len() < min {
        Err(ProviderError::validation(
            field,
            format!("expected at least {} item(s), got {}", min, items.len()),
        ))
    } else {
        Ok(())
    }
}

/// Empty strings are how the API spells "unset".
pub fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
