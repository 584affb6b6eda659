//! Timestamp parsing for backend date fields.
//!
//! The backend is not consistent about date shapes: lending dates arrive
//! either as full RFC 3339 timestamps or as bare `YYYY-MM-DD` calendar dates.
//! Bare dates and naive timestamps are read as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error for date values that match none of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampError {
    pub value: String,
}

impl Display for TimestampError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid date `{}`; expected RFC 3339 timestamp or YYYY-MM-DD",
            self.value
        )
    }
}

impl Error for TimestampError {}

/// Parses one backend date value into a UTC instant.
///
/// # Errors
/// - Returns [`TimestampError`] when `value` matches no accepted shape.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, TimestampError> {
    let trimmed = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    Err(TimestampError {
        value: trimmed.to_string(),
    })
}

/// Formats an instant the way the backend expects to receive it back.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format_timestamp(value))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

/// Serde adapter for nullable date fields.
///
/// `null`, a missing field and an empty string all read as `None`; the
/// backend uses all three for "not returned yet".
pub mod option {
    use super::{format_timestamp, parse_timestamp};
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(value) => serializer.serialize_str(&format_timestamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => parse_timestamp(value)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
