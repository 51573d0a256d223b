//! Normalization primitives shared by the locator, extraction layer, and rules.
//!
//! Both input documents come out of OCR/LLM structuring runs, so keys and
//! categorical values arrive in whatever casing and punctuation a given form
//! revision used. Everything here projects those representations onto a
//! comparable form and never fails: absent or malformed input degrades to a
//! default, not an error.

pub mod address;
pub mod dates;

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(\.\d+)?").expect("decimal pattern"));

static DIAGRAM_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\b(number|no\.?|num)\b|#)[\s:.#]*").expect("filler pattern"));

/// Lowercase, alphanumeric-only projection used for key lookup and
/// categorical comparison. Idempotent.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Render a scalar JSON value as text. Composite values and null render
/// empty so a stray object never leaks into a string comparison.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// True when a located value carries usable content: null, empty strings,
/// and empty composites all count as absent.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) | Value::Bool(_) => true,
    }
}

/// First signed decimal substring of `raw`, if any.
pub fn first_decimal(raw: &str) -> Option<f64> {
    DECIMAL.find(raw).and_then(|m| m.as_str().parse().ok())
}

/// Coerce a located value to a float. Numbers cast directly; strings yield
/// their first signed decimal substring ("12.5 ft" -> 12.5); everything else
/// is 0.0.
pub fn coerce_float(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => first_decimal(s).unwrap_or(0.0),
        Value::Null | Value::Array(_) | Value::Object(_) => 0.0,
    }
}

/// Float coercion over an optional locator hit.
pub fn coerce_float_opt(value: Option<&Value>) -> f64 {
    value.map(coerce_float).unwrap_or(0.0)
}

/// Strip administrative filler from a matched diagram-number value. Form
/// revisions phrase the field as "Number 8", "No. 8", "#8", or plain "8";
/// only the classification itself may survive to the comparison.
pub fn clean_diagram_value(raw: &str) -> String {
    DIAGRAM_FILLER.replace_all(raw, "").trim().to_string()
}

/// Whitespace-collapsed lowercase form used when matching diagram-number key
/// variants, which keep their punctuation (e.g. "A7. Building Diagram Number").
pub fn collapse_key(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
