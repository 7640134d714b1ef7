//! Field sanitizers applied to every payload before it reaches storage.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::phone::normalize_phone;

pub const MAX_STRING_LEN: usize = 1000;
pub const MAX_URL_LEN: usize = 500;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_EMAIL_LEN: usize = 254;

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Strip angle brackets, trim, cap at [`MAX_STRING_LEN`] characters.
pub fn sanitize_string(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();
    let capped = truncate_chars(stripped.trim(), MAX_STRING_LEN);
    capped.trim_end().to_string()
}

/// Only `http://` and `https://` URLs survive; anything else becomes empty.
pub fn sanitize_url(input: &str) -> String {
    let trimmed = input.trim();
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        truncate_chars(trimmed, MAX_URL_LEN)
    } else {
        String::new()
    }
}

/// Canonical `+995 XXX XX XX XX` when recognized, otherwise a character-filtered fallback.
pub fn sanitize_phone(input: &str) -> String {
    if let Some(canonical) = normalize_phone(input) {
        return canonical;
    }
    let kept: String = input
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '+' | ' ' | '-'))
        .collect();
    truncate_chars(kept.trim(), MAX_PHONE_LEN)
}

pub fn sanitize_email(input: &str) -> String {
    truncate_chars(&input.trim().to_lowercase(), MAX_EMAIL_LEN)
}

/// Numbers arrive from HTML forms as either JSON numbers or strings.
/// Empty, null and non-numeric input all mean "absent", never zero.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<f64>().ok().filter(|f| f.is_finite())
            }
        }
        _ => None,
    }
}

/// serde helper: lenient optional float, see [`parse_number`].
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

/// serde helper: lenient optional integer. Fractions are rejected as absent.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(parse_number)
        .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
        .map(|f| f as i32))
}

/// Per-field-class sanitization of a payload, applied after validation.
pub trait Sanitize {
    fn sanitize(&mut self);
}

pub(crate) fn text(field: &mut Option<String>) {
    if let Some(v) = field.as_mut() {
        *v = sanitize_string(v);
    }
}

pub(crate) fn url(field: &mut Option<String>) {
    if let Some(v) = field.as_mut() {
        *v = sanitize_url(v);
    }
}

pub(crate) fn phone(field: &mut Option<String>) {
    if let Some(v) = field.as_mut() {
        *v = sanitize_phone(v);
    }
}

pub(crate) fn email(field: &mut Option<String>) {
    if let Some(v) = field.as_mut() {
        *v = sanitize_email(v);
    }
}

pub(crate) fn text_list(field: &mut Vec<String>) {
    *field = field
        .iter()
        .map(|s| sanitize_string(s))
        .filter(|s| !s.is_empty())
        .collect();
}
