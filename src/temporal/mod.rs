//! Order date normalization.
//!
//! The order API is inconsistent about how it sends `orderDate`: ISO-like
//! strings (with or without fractional seconds and a `Z`), Unix timestamps in
//! seconds or milliseconds, or an object of loosely named date parts. Every
//! shape is classified into [`OrderDate`] at deserialization time and reduced
//! to an [`Instant`] before it is compared or reformatted.
//!
//! [`to_instant_at`] never fails: anything it cannot make sense of becomes "now".
//! Table cells use [`display::to_display_text`] instead, which is a plain text
//! transform and never consults a calendar parser.

pub mod display;

pub use display::to_display_text;

use crate::util::{is_truthy, number_from_value};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Format consumed by a `datetime-local` input control.
const EDITABLE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Format the order API expects on create and update.
const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Local wall-clock formats tried on text that carries a `T` separator.
const SEPARATED_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Local wall-clock formats tried on unmodified text.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Timestamps below this are seconds since the epoch, otherwise milliseconds.
const MILLIS_THRESHOLD: f64 = 1e12;

/// Largest representable distance from the epoch, in milliseconds.
const MAX_EPOCH_MILLIS: f64 = 8.64e15;

const YEAR_KEYS: &[&str] = &["year", "Y", "y"];
const MONTH_KEYS: &[&str] = &["month", "m"];
const DAY_KEYS: &[&str] = &["day", "d"];
const HOUR_KEYS: &[&str] = &["hour", "h"];
const MINUTE_KEYS: &[&str] = &["minute", "min"];
const SECOND_KEYS: &[&str] = &["second", "s"];

/// A resolved point in time, in local wall-clock terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(NaiveDateTime);

impl Instant {
    pub fn new(local: NaiveDateTime) -> Self {
        Self(local)
    }

    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    /// Milliseconds since the Unix epoch, viewed in the local time zone.
    pub fn from_epoch_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(|utc| Self::from_utc(&utc))
    }

    fn from_utc(utc: &DateTime<Utc>) -> Self {
        Self(utc.with_timezone(&Local).naive_local())
    }

    pub fn local(&self) -> NaiveDateTime {
        self.0
    }

    /// The same instant in UTC. Wall-clock times skipped by a DST change
    /// are read as UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        Local
            .from_local_datetime(&self.0)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| self.0.and_utc())
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_wire_text(*self))
    }
}

/// Every shape the order API uses for `orderDate`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum OrderDate {
    #[default]
    Absent,
    Text(String),
    Epoch(f64),
    Parts(DateParts),
    Native(Instant),
    /// Booleans, arrays and anything else that is not a date.
    Other(Value),
}

impl From<Value> for OrderDate {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => OrderDate::Absent,
            Value::String(s) => OrderDate::Text(s),
            Value::Number(n) => OrderDate::Epoch(n.as_f64().unwrap_or(f64::NAN)),
            Value::Object(map) => OrderDate::Parts(DateParts(map)),
            other => OrderDate::Other(other),
        }
    }
}

impl<'de> Deserialize<'de> for OrderDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(OrderDate::from)
    }
}

impl Serialize for OrderDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            OrderDate::Absent => serializer.serialize_none(),
            OrderDate::Text(s) => serializer.serialize_str(s),
            OrderDate::Epoch(n) => crate::util::json_number(*n).serialize(serializer),
            OrderDate::Parts(parts) => parts.0.serialize(serializer),
            OrderDate::Native(instant) => serializer.serialize_str(&to_wire_text(*instant)),
            OrderDate::Other(value) => value.serialize(serializer),
        }
    }
}

/// A date given as named parts, e.g. `{"year": 2024, "month": 3, "day": 5}`
/// or `{"Y": 2024, "m": 3, "d": 5}`. Months are 1-based.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DateParts(Map<String, Value>);

impl DateParts {
    /// First alias holding a non-null value.
    fn component(&self, aliases: &[&str]) -> Option<&Value> {
        aliases
            .iter()
            .find_map(|key| self.0.get(*key).filter(|v| !v.is_null()))
    }

    /// Year, month and day, if all three are set.
    fn date(&self) -> Option<(&Value, &Value, &Value)> {
        let year = self.component(YEAR_KEYS).filter(|v| is_truthy(v))?;
        let month = self.component(MONTH_KEYS).filter(|v| is_truthy(v))?;
        let day = self.component(DAY_KEYS).filter(|v| is_truthy(v))?;
        Some((year, month, day))
    }

    /// Hour, minute and second, each defaulting to zero.
    fn time(&self) -> [Option<&Value>; 3] {
        [
            self.component(HOUR_KEYS),
            self.component(MINUTE_KEYS),
            self.component(SECOND_KEYS),
        ]
    }

    fn to_instant(&self) -> Option<Instant> {
        let (year, month, day) = self.date()?;
        let mut numbers = [0.0; 6];
        numbers[0] = number_from_value(year)?;
        numbers[1] = number_from_value(month)?;
        numbers[2] = number_from_value(day)?;
        for (slot, value) in numbers[3..].iter_mut().zip(self.time()) {
            if let Some(value) = value {
                *slot = number_from_value(value)?;
            }
        }
        let [y, mo, d, h, mi, s] = numbers;
        construct_local(y, mo, d, h, mi, s).map(Instant::new)
    }

    fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

/// Build a local date-time from calendar components, letting out-of-range
/// values roll over into the next unit (month 13 is January of next year).
/// Components truncate toward zero; years 0..=99 are read as 1900..=1999.
fn construct_local(year: f64, month: f64, day: f64, hour: f64, minute: f64, second: f64) -> Option<NaiveDateTime> {
    let parts = [year, month, day, hour, minute, second];
    if parts.iter().any(|p| !p.is_finite() || p.abs() > 1e12) {
        return None;
    }
    let [year, month, day, hour, minute, second] = parts.map(|p| p.trunc() as i64);

    let year = if (0..=99).contains(&year) { 1900 + year } else { year };
    let months = year.checked_mul(12)?.checked_add(month - 1)?;
    let start = NaiveDate::from_ymd_opt(
        i32::try_from(months.div_euclid(12)).ok()?,
        u32::try_from(months.rem_euclid(12) + 1).ok()?,
        1,
    )?
    .and_hms_opt(0, 0, 0)?;

    let offset = (day - 1)
        .checked_mul(86_400)?
        .checked_add(hour.checked_mul(3_600)?)?
        .checked_add(minute.checked_mul(60)?)?
        .checked_add(second)?;
    start.checked_add_signed(TimeDelta::try_seconds(offset)?)
}

/// Milliseconds since the epoch for a numeric timestamp, applying the
/// seconds/milliseconds heuristic.
pub(crate) fn epoch_millis(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value < MILLIS_THRESHOLD { value * 1000.0 } else { value };
    if millis.abs() > MAX_EPOCH_MILLIS {
        return None;
    }
    Some(millis.trunc() as i64)
}

/// Drop anything after the first `.` and the first `Z`.
pub(crate) fn strip_fraction_and_zone(text: &str) -> String {
    let head = text.split('.').next().unwrap_or_default();
    head.replacen('Z', "", 1)
}

fn parse_local(text: &str, formats: &[&str]) -> Option<Instant> {
    formats
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(Instant::new)
}

/// Parse unmodified text: RFC 3339 and RFC 2822 honour their offsets, bare
/// dates are midnight UTC, everything else is local wall-clock time.
fn parse_raw(text: &str) -> Option<Instant> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(Instant::from_utc(&dt.with_timezone(&Utc)));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(Instant::from_utc(&dt.with_timezone(&Utc)));
    }
    if let Some(instant) = parse_local(text, LOCAL_FORMATS) {
        return Some(instant);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Instant::from_utc(&midnight.and_utc()))
}

fn parse_text(text: &str) -> Option<Instant> {
    let cleaned = strip_fraction_and_zone(text);
    if cleaned.contains('T') {
        if let Some(instant) = parse_local(&cleaned, SEPARATED_FORMATS) {
            return Some(instant);
        }
    }
    parse_raw(text)
}

/// Normalize any `orderDate` shape to an instant, falling back to `now`.
pub fn to_instant_at(value: &OrderDate, now: Instant) -> Instant {
    let resolved = match value {
        OrderDate::Absent => return now,
        OrderDate::Native(instant) => return *instant,
        OrderDate::Text(text) => parse_text(text),
        OrderDate::Epoch(n) => epoch_millis(*n).and_then(Instant::from_epoch_millis),
        OrderDate::Parts(parts) => parts
            .to_instant()
            .or_else(|| parse_raw(&parts.to_json())),
        OrderDate::Other(_) => None,
    };

    resolved.unwrap_or_else(|| {
        debug!(value = ?value, "Unrecognized order date, using current time");
        now
    })
}

/// `YYYY-MM-DDTHH:MM`, for an editable date/time input.
pub fn to_editable_text(instant: Instant) -> String {
    instant.local().format(EDITABLE_FORMAT).to_string()
}

/// `YYYY-MM-DDTHH:MM:SS`, for create and update requests.
pub fn to_wire_text(instant: Instant) -> String {
    instant.local().format(WIRE_FORMAT).to_string()
}

/// Read back the value of an editable date/time input.
pub fn parse_editable_text(text: &str) -> Option<Instant> {
    let text = text.trim();
    parse_local(text, SEPARATED_FORMATS).or_else(|| parse_raw(text))
}
