//! Session and seat identity normalization.
//!
//! Client input arrives in every shape the old frontends produced: raw UUID
//! strings, UUIDs wrapped in quotes or invisible characters, objects
//! carrying one of several legacy id fields, numeric funcion ids as strings.
//! These pure functions turn all of that into canonical identifiers, or
//! fail safely. No I/O, no shared state.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

static UUID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("UUID pattern compiles")
});

/// Legacy field names a seat object may carry its id under.
const SEAT_ID_FIELDS: &[&str] = &["seat_id", "seatId", "_id", "id", "sillaId"];

/// Prefix the legacy map editor attached to seat ids.
const LEGACY_SEAT_PREFIX: &str = "silla_";

/// Normalize a caller-supplied session token into a canonical UUID.
///
/// Strips whitespace, zero-width characters, and surrounding quotes; if a
/// UUID pattern appears anywhere inside the cleaned string it is used.
/// Anything else non-empty yields a **fresh** UUID rather than an error,
/// because the session identifier is client-supplied and a malformed one
/// must not strand the buyer. Returns `None` only for effectively-empty
/// input.
pub fn normalize_session_id(raw: &str) -> Option<Uuid> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .collect();
    let cleaned = cleaned.trim_matches(['"', '\'']).trim();

    if cleaned.is_empty() {
        return None;
    }

    if let Some(found) = UUID_PATTERN
        .find(cleaned)
        .and_then(|m| Uuid::parse_str(m.as_str()).ok())
    {
        return Some(found);
    }

    let fresh = Uuid::new_v4();
    warn!(
        input = cleaned,
        session_id = %fresh,
        "session_id is not a UUID; issued a fresh one"
    );
    Some(fresh)
}

/// Normalize a seat identifier from a JSON string, number, or legacy
/// object shape.
pub fn normalize_seat_id(value: &Value) -> Option<String> {
    let raw = match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => SEAT_ID_FIELDS.iter().find_map(|field| {
            map.get(*field).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        }),
        _ => None,
    }?;

    normalize_seat_str(&raw)
}

/// Normalize a seat identifier already in string form.
pub fn normalize_seat_str(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let stripped = trimmed.strip_prefix(LEGACY_SEAT_PREFIX).unwrap_or(trimmed);
    if stripped.is_empty() {
        return None;
    }

    Some(stripped.to_string())
}

/// Normalize a funcion identifier from a JSON number or numeric string.
/// Returns `None` unless the value is a strictly positive integer.
pub fn normalize_funcion_id(value: &Value) -> Option<i32> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;

    if parsed >= 1 && parsed <= i64::from(i32::MAX) {
        Some(parsed as i32)
    } else {
        None
    }
}
