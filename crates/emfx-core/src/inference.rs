//! Heuristic typing of raw attribute text
//!
//! Documents carry every attribute as text. Without a schema, the parser
//! guesses the kind with a fixed trial order: integer, float, boolean,
//! string. The first trial that accepts the text wins.

use crate::value::Value;

/// Classify raw attribute text into a primitive value
///
/// - integers parse as `I64`, or `U64` above `i64::MAX`; leading zeros are
///   accepted (`"007"` → 7)
/// - floats use `.` as the only decimal separator and accept exponent
///   notation; text without any ASCII digit (`"inf"`, `"NaN"`) and text
///   that overflows to infinity (`"1e400"`) are not floats
/// - `true`/`false` match case-insensitively
/// - anything else is kept verbatim as a string
pub fn infer_value(raw: &str) -> Value {
    if let Ok(v) = raw.parse::<i64>() {
        return Value::I64(v);
    }
    if let Ok(v) = raw.parse::<u64>() {
        return Value::U64(v);
    }
    if raw.bytes().any(|b| b.is_ascii_digit()) {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => return Value::F64(v),
            _ => {}
        }
    }
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(raw.to_string())
}
