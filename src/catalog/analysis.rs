//! Per-column profile of what a table actually holds
//!
//! The detected type looks only at the first non-null value, the way a quick
//! glance at a result grid would. It can disagree with the declared type.

use crate::types::{ColumnDef, Row, UniqueKey, Value};
use ahash::AHashSet;
use serde::Serialize;

/// Text longer than this is reported as TEXT rather than VARCHAR
const SHORT_TEXT_LIMIT: usize = 100;

/// Number of non-null values echoed back per column
const SAMPLE_VALUES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectedType {
    Integer,
    Decimal,
    Boolean,
    Email,
    Date,
    Varchar,
    Text,
    /// Column holds only NULLs
    Null,
}

impl std::fmt::Display for DetectedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DetectedType::Integer => "INTEGER",
            DetectedType::Decimal => "DECIMAL",
            DetectedType::Boolean => "BOOLEAN",
            DetectedType::Email => "EMAIL",
            DetectedType::Date => "DATE",
            DetectedType::Varchar => "VARCHAR",
            DetectedType::Text => "TEXT",
            DetectedType::Null => "NULL",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAnalysis {
    /// Declared type as written in the schema
    pub schema_type: String,
    pub actual_type: DetectedType,
    pub null_count: usize,
    /// Distinct non-null values
    pub unique_count: usize,
    pub sample_values: Vec<Value>,
}

/// Profile every declared column over `rows`; an empty table yields nothing
pub fn analyze_columns(columns: &[ColumnDef], rows: &[Row]) -> Vec<(String, ColumnAnalysis)> {
    if rows.is_empty() {
        return Vec::new();
    }

    columns
        .iter()
        .map(|col| {
            let values: Vec<&Value> = rows
                .iter()
                .filter_map(|row| row.get(&col.name))
                .filter(|v| !v.is_null())
                .collect();
            let distinct: AHashSet<UniqueKey> = values.iter().filter_map(|v| v.unique_key()).collect();

            let analysis = ColumnAnalysis {
                schema_type: col.declared_type.to_string(),
                actual_type: values.first().map_or(DetectedType::Null, |v| detect_type(v)),
                null_count: rows.len() - values.len(),
                unique_count: distinct.len(),
                sample_values: values.iter().take(SAMPLE_VALUES).map(|v| (*v).clone()).collect(),
            };
            (col.name.clone(), analysis)
        })
        .collect()
}

fn detect_type(value: &Value) -> DetectedType {
    match value {
        Value::Integer(_) => DetectedType::Integer,
        Value::Decimal(f) if f.fract() == 0.0 => DetectedType::Integer,
        Value::Decimal(_) => DetectedType::Decimal,
        Value::Boolean(_) => DetectedType::Boolean,
        Value::DateTime(_) => DetectedType::Date,
        Value::Text(s) if s.contains('@') => DetectedType::Email,
        Value::Text(s) if s.chars().count() > SHORT_TEXT_LIMIT => DetectedType::Text,
        Value::Text(s) if starts_with_date(s) => DetectedType::Date,
        Value::Text(_) => DetectedType::Varchar,
        Value::Null => DetectedType::Null,
    }
}

/// `YYYY-MM-DD` prefix
fn starts_with_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..10].iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}
