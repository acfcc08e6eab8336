use super::{DateParts, OrderDate, epoch_millis, strip_fraction_and_zone};
use super::{HOUR_KEYS, MINUTE_KEYS, SECOND_KEYS};
use crate::util::{is_truthy, number_text, pad2, value_text};
use chrono::DateTime;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render an `orderDate` for a table cell as `YYYY-MM-DD HH:MM:SS`.
///
/// Text is reshaped without being parsed, so a value the calendar would
/// reject is still shown as sent. Numbers are read in UTC.
pub fn to_display_text(value: &OrderDate) -> String {
    match value {
        OrderDate::Absent => String::new(),
        OrderDate::Text(text) => text_display(text),
        OrderDate::Epoch(n) => epoch_display(*n),
        OrderDate::Native(instant) => instant.to_utc().format(DISPLAY_FORMAT).to_string(),
        OrderDate::Parts(parts) => parts.display().unwrap_or_else(|| parts.to_json()),
        OrderDate::Other(value) if !is_truthy(value) => String::new(),
        OrderDate::Other(value) => value_text(value),
    }
}

fn text_display(text: &str) -> String {
    let cleaned = strip_fraction_and_zone(text);
    if cleaned.contains('T') {
        cleaned.replacen('T', " ", 1)
    } else {
        cleaned
    }
}

fn epoch_display(n: f64) -> String {
    if n.is_nan() {
        return String::new();
    }
    epoch_millis(n)
        .and_then(DateTime::from_timestamp_millis)
        .map(|utc| utc.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| number_text(n))
}

impl DateParts {
    /// Render the parts as given, without calendar validation.
    ///
    /// Accepts the same aliases as [`DateParts::to_instant`], so `h` works
    /// for the hour here too, not only `hour`.
    fn display(&self) -> Option<String> {
        let (year, month, day) = self.date()?;
        let time = |aliases: &[&str]| {
            self.component(aliases)
                .map(value_text)
                .unwrap_or_else(|| "0".to_string())
        };
        Some(format!(
            "{}-{}-{} {}:{}:{}",
            value_text(year),
            pad2(&value_text(month)),
            pad2(&value_text(day)),
            pad2(&time(HOUR_KEYS)),
            pad2(&time(MINUTE_KEYS)),
            pad2(&time(SECOND_KEYS)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::Instant;
    use chrono::NaiveDate;
    use serde_json::{Value, json};

    fn display(value: Value) -> String {
        to_display_text(&OrderDate::from(value))
    }

    #[test]
    fn text_is_reshaped_not_parsed() {
        assert_eq!(display(json!("2024-01-01T10:00:00.123Z")), "2024-01-01 10:00:00");
        assert_eq!(display(json!("2024-01-01T10:00:00Z")), "2024-01-01 10:00:00");
        assert_eq!(display(json!("2024-01-01")), "2024-01-01");
        assert_eq!(display(json!("not a date")), "not a date");
    }

    #[test]
    fn blank_values_are_empty() {
        assert_eq!(display(json!("")), "");
        assert_eq!(display(Value::Null), "");
        assert_eq!(display(json!(false)), "");
        assert_eq!(to_display_text(&OrderDate::Epoch(f64::NAN)), "");
    }

    #[test]
    fn numbers_render_in_utc() {
        assert_eq!(display(json!(1_700_000_000)), "2023-11-14 22:13:20");
        assert_eq!(display(json!(1_700_000_000_000_i64)), "2023-11-14 22:13:20");
        assert_eq!(display(json!(0)), "1970-01-01 00:00:00");
    }

    #[test]
    fn out_of_range_numbers_render_as_numbers() {
        assert_eq!(display(json!(1e300)), number_text(1e300));
    }

    #[test]
    fn parts_render_without_validation() {
        assert_eq!(
            display(json!({"year": 2024, "month": 3, "day": 5, "hour": 9})),
            "2024-03-05 09:00:00"
        );
        assert_eq!(
            display(json!({"Y": 2024, "m": 13, "d": 40, "min": 5, "s": 7})),
            "2024-13-40 00:05:07"
        );
        assert_eq!(
            display(json!({"year": 2024, "month": 1, "day": 2, "h": 7})),
            "2024-01-02 07:00:00"
        );
    }

    #[test]
    fn incomplete_parts_render_as_json() {
        assert_eq!(display(json!({"year": 2024})), r#"{"year":2024}"#);
    }

    #[test]
    fn native_instant_renders_in_utc() {
        let utc = NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
            .and_utc();
        let instant = Instant::from_utc(&utc);
        assert_eq!(to_display_text(&OrderDate::Native(instant)), "2024-06-01 12:30:00");
    }

    #[test]
    fn other_values_are_stringified() {
        assert_eq!(display(json!(true)), "true");
        assert_eq!(display(json!([1, 2])), "[1,2]");
    }
}
