//! Error types for the querylab engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("unsupported statement")]
    UnsupportedStatement,

    #[error("missing FROM clause")]
    MissingFrom,

    #[error("column/value count mismatch")]
    ColumnCountMismatch,

    #[error("unsupported predicate: {0}")]
    UnsupportedPredicate(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error("Table already exists: {0}")]
    TableExists(String),

    #[error("Column '{column}' does not exist in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    #[error("Column '{column}' cannot be null")]
    NotNullViolation { column: String },

    #[error("Duplicate value for unique column '{column}': {value}")]
    UniqueViolation { column: String, value: String },

    #[error("Invalid value for column '{column}': {reason}")]
    InvalidValue { column: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error families surfaced to callers next to the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    SyntaxError,
    UnknownTableError,
    DuplicateTableError,
    ColumnMismatchError,
    ConstraintViolation,
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::UnsupportedStatement
            | QueryError::MissingFrom
            | QueryError::UnsupportedPredicate(_)
            | QueryError::Syntax(_)
            | QueryError::Config(_) => ErrorKind::SyntaxError,
            QueryError::TableNotFound(_) => ErrorKind::UnknownTableError,
            QueryError::TableExists(_) => ErrorKind::DuplicateTableError,
            QueryError::ColumnCountMismatch | QueryError::ColumnNotFound { .. } => {
                ErrorKind::ColumnMismatchError
            }
            QueryError::NotNullViolation { .. }
            | QueryError::UniqueViolation { .. }
            | QueryError::InvalidValue { .. } => ErrorKind::ConstraintViolation,
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        QueryError::Config(err.to_string())
    }
}
