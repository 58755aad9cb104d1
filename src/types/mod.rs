//! Value and schema types for querylab

mod row;
mod table;
mod timestamp;

pub use row::Row;
pub use table::{ColumnDef, ColumnDefault, ForeignKeyRef, TableSchema, TypeTag};
pub use timestamp::{Precision, Timestamp};

use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// Scalar stored in a table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),

    Decimal(f64),

    Text(String),

    Boolean(bool),

    /// ISO-8601 date or timestamp
    DateTime(Timestamp),

    Null,
}

impl Value {
    /// Number literal as typed by the user: integers stay integers
    pub fn from_number_text(text: &str) -> Option<Value> {
        if let Ok(i) = text.parse::<i64>() {
            return Some(Value::Integer(i));
        }
        text.parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Decimal)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Decimal(_))
    }

    /// Numeric view of the value; text holding a number counts
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Decimal(f) => Some(*f),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    /// Exact integer view; decimals outside the `i64` range have none
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            Value::Decimal(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::Null => "null",
        }
    }

    /// Equality as the playground understands it: `age = '25'` matches 25
    ///
    /// NULL never equals anything, including NULL.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        if self.is_null() || other.is_null() {
            return false;
        }
        if self.is_numeric() || other.is_numeric() {
            if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
                return a == b;
            }
        }
        if let Some(ordering) = self.compare_datetime(other) {
            return ordering == Ordering::Equal;
        }
        self.to_string() == other.to_string()
    }

    /// Ordering used by `<`, `>` and ORDER BY
    ///
    /// Numbers compare numerically (text holding a number is coerced), dates
    /// compare chronologically, other text lexicographically. Anything else,
    /// including NULL, is unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        if self.is_null() || other.is_null() {
            return None;
        }
        if self.is_numeric() || other.is_numeric() {
            let (a, b) = (self.as_f64()?, other.as_f64()?);
            return a.partial_cmp(&b);
        }
        if let Some(ordering) = self.compare_datetime(other) {
            return Some(ordering);
        }
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    fn compare_datetime(&self, other: &Value) -> Option<Ordering> {
        let as_ts = |v: &Value| match v {
            Value::DateTime(ts) => Some(ts.clone()),
            Value::Text(s) => Timestamp::parse(s),
            _ => None,
        };
        if !matches!(self, Value::DateTime(_)) && !matches!(other, Value::DateTime(_)) {
            return None;
        }
        as_ts(self)?.partial_cmp(&as_ts(other)?)
    }

    /// Hashable identity for uniqueness checks; NULL has none
    pub fn unique_key(&self) -> Option<UniqueKey> {
        match self {
            Value::Null => None,
            Value::Integer(i) => Some(UniqueKey::Integer(*i)),
            Value::Decimal(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(UniqueKey::Integer(*f as i64))
            }
            Value::Decimal(f) => Some(UniqueKey::Decimal(f.to_bits())),
            Value::Text(s) => Some(UniqueKey::Text(s.clone())),
            Value::Boolean(b) => Some(UniqueKey::Boolean(*b)),
            Value::DateTime(ts) => Some(UniqueKey::Instant(ts.unix_nanos())),
        }
    }
}

/// See [`Value::unique_key`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum UniqueKey {
    Integer(i64),
    Decimal(u64),
    Text(String),
    Boolean(bool),
    Instant(i128),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(ts) => write!(f, "{}", ts),
            Value::Null => f.write_str("null"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Decimal(d) => serializer.serialize_f64(*d),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::DateTime(ts) => ts.serialize(serializer),
            Value::Null => serializer.serialize_none(),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Decimal(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}
