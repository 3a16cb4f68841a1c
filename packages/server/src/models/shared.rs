use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Longest free-text field (descriptions, MOTD, messages) in characters.
pub const MAX_TEXT_LEN: usize = 4000;

/// Most entries a skill or tag list may hold.
pub const MAX_TAGS: usize = 20;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Trim `value` and require 1..=`max` characters. Returns the trimmed string.
pub fn validate_name(field: &str, value: &str, max: usize) -> Result<String, AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(value.to_string())
}

/// Free text may be empty but not longer than [`MAX_TEXT_LEN`].
pub fn validate_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

/// Require an absolute http(s) URL.
pub fn validate_url(field: &str, value: &str) -> Result<(), AppError> {
    let value = value.trim();
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !value.contains(char::is_whitespace) => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{field} must be an http(s) URL"
        ))),
    }
}

/// Trim entries, drop blanks and case-insensitive duplicates, keep order.
pub fn normalize_tags(field: &str, tags: Vec<String>) -> Result<Vec<String>, AppError> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > 64 {
            return Err(AppError::Validation(format!(
                "Each {field} entry must be at most 64 characters"
            )));
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "{field} may list at most {MAX_TAGS} entries"
        )));
    }
    Ok(out)
}
