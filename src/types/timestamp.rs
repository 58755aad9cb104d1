//! Date and timestamp values
//!
//! Values keep the ISO-8601 text the user supplied so that a round trip
//! returns exactly what was inserted; ordering uses the parsed instant.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};

/// Whether the text carried a time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Date,
    DateTime,
}

/// ISO-8601 date or timestamp
#[derive(Debug, Clone)]
pub struct Timestamp {
    text: String,
    precision: Precision,
    /// Nanoseconds since the Unix epoch (naive values are read as UTC)
    nanos: i128,
}

impl Timestamp {
    /// Parse `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.f]`, the `T`-separated form,
    /// or a full RFC 3339 timestamp with offset
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Ok(dt) = OffsetDateTime::parse(text, &Rfc3339) {
            return Some(Self::from_instant(text, Precision::DateTime, dt));
        }

        let naive_formats = [
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
            format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            format_description!("[year]-[month]-[day]T[hour]:[minute]"),
            format_description!("[year]-[month]-[day] [hour]:[minute]"),
        ];
        for format in naive_formats {
            if let Ok(dt) = PrimitiveDateTime::parse(text, format) {
                return Some(Self::from_instant(text, Precision::DateTime, dt.assume_utc()));
            }
        }

        let date = Date::parse(text, format_description!("[year]-[month]-[day]")).ok()?;
        Some(Self::from_instant(text, Precision::Date, date.midnight().assume_utc()))
    }

    /// Current UTC time, used by `DEFAULT NOW()`
    pub fn now() -> Self {
        let now = OffsetDateTime::now_utc();
        // RFC 3339 formatting only fails for years outside 0..=9999
        let text = now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string());
        Self::from_instant(&text, Precision::DateTime, now)
    }

    fn from_instant(text: &str, precision: Precision, instant: OffsetDateTime) -> Self {
        Self {
            text: text.to_string(),
            precision,
            nanos: instant.unix_timestamp_nanos(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn unix_nanos(&self) -> i128 {
        self.nanos
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.nanos == other.nanos
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.nanos.cmp(&other.nanos))
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
