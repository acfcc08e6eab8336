//! Lenient value coercion shared by the order model, the date normalizer
//! and the edit form.
//!
//! Records arrive from the order API with loosely typed fields: a price may
//! be `5`, `"5"` or `"5.00"`, a date component may be `3` or `"03"`. The
//! helpers here apply one set of coercion rules everywhere so the table,
//! the search index and the form agree on what a value means:
//!   - blank text is `0`
//!   - `Infinity`, `0x..`, `0o..` and `0b..` literals are accepted
//!   - anything else that does not parse is `None`
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

/// Coerce free text to a number. Returns `None` for text that is not a number.
pub fn number_from_text(text: &str) -> Option<f64> {
    let s = text.trim();
    if s.is_empty() {
        return Some(0.0);
    }

    match s {
        "Infinity" | "+Infinity" => return Some(f64::INFINITY),
        "-Infinity" => return Some(f64::NEG_INFINITY),
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = s.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix).ok().map(|n| n as f64);
        }
    }

    // Rust accepts spellings like "inf" and "nan" that are not numbers here.
    if s.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return None;
    }

    s.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Coerce a JSON scalar to a number.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => number_from_text(s),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whether a JSON value counts as "set": not null, false, zero or empty text.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a number the way it reads in a table cell: `3` rather than `3.0`.
pub fn number_text(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        format!("{n}")
    }
}

/// Render any JSON value as plain text. Containers render as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(number_text).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Left-pad with zeros to at least two characters.
pub fn pad2(text: &str) -> String {
    format!("{text:0>2}")
}

/// Build a JSON number, keeping whole values integral (`3`, not `3.0`).
pub fn json_number(n: f64) -> Number {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Number::from(n as i64)
    } else {
        Number::from_f64(n).unwrap_or_else(|| Number::from(0))
    }
}

/// Deserialize a scalar field that may arrive as text or as a number into text.
pub fn text_from_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => String::new(),
        other => value_text(&other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_from_plain_text() {
        assert_eq!(number_from_text("10"), Some(10.0));
        assert_eq!(number_from_text(" 2.5 "), Some(2.5));
        assert_eq!(number_from_text("1e3"), Some(1000.0));
    }

    #[test]
    fn blank_text_is_zero() {
        assert_eq!(number_from_text(""), Some(0.0));
        assert_eq!(number_from_text("   "), Some(0.0));
    }

    #[test]
    fn rejects_words() {
        assert_eq!(number_from_text("abc"), None);
        assert_eq!(number_from_text("inf"), None);
        assert_eq!(number_from_text("NaN"), None);
        assert_eq!(number_from_text("12abc"), None);
    }

    #[test]
    fn accepts_radix_literals() {
        assert_eq!(number_from_text("0x10"), Some(16.0));
        assert_eq!(number_from_text("0b101"), Some(5.0));
        assert_eq!(number_from_text("0xZZ"), None);
    }

    #[test]
    fn accepts_infinity_spelling() {
        assert_eq!(number_from_text("-Infinity"), Some(f64::NEG_INFINITY));
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(2024)));
        assert!(is_truthy(&json!("3")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[test]
    fn number_text_drops_trailing_zero() {
        assert_eq!(number_text(3.0), "3");
        assert_eq!(number_text(2.5), "2.5");
        assert_eq!(number_text(-0.0), "0");
    }

    #[test]
    fn pad2_pads_single_digits() {
        assert_eq!(pad2("3"), "03");
        assert_eq!(pad2("12"), "12");
        assert_eq!(pad2("123"), "123");
    }

    #[test]
    fn json_number_keeps_integers_integral() {
        assert_eq!(json_number(3.0).to_string(), "3");
        assert_eq!(json_number(2.5).to_string(), "2.5");
    }
}
