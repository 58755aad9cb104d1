//! querylab: in-memory SQL playground engine
//!
//! Free-form statements are classified by their leading keyword, parsed into
//! a tagged `Statement`, and run against an in-memory `TableStore`. Every call
//! returns a uniform `ExecutionResult` envelope instead of an error.
//!
//! ## Architecture
//! - types: closed `Value` sum type, rows, column definitions
//! - catalog: `TableStore` (per-table locking), sample data, relation annotations, column analysis
//! - sql: lexer, parser, predicate evaluator, executor, interpreter
//! - api: playground facade (query / tables / table detail / schema overview / column analysis)
//!
//! ```
//! use querylab::{EngineConfig, StatementInterpreter};
//!
//! let interp = StatementInterpreter::from_config(EngineConfig::empty())?;
//! interp.execute("CREATE TABLE products (id SERIAL PRIMARY KEY, name VARCHAR(100), price DECIMAL)");
//! interp.execute("INSERT INTO products (name, price) VALUES ('Kalem', 12.5)");
//!
//! let result = interp.execute("SELECT * FROM products WHERE price > 10");
//! assert!(result.success);
//! assert_eq!(result.row_count, Some(1));
//! # Ok::<(), querylab::QueryError>(())
//! ```

pub mod config;
pub mod types;
pub mod catalog;
pub mod sql;

mod error;
mod api;

pub use config::{EngineConfig, MutationMode, PredicatePolicy};
pub use error::{ErrorKind, QueryError, Result};

pub use api::{
    ErrorResponse, OrderedMap, Playground, QueryResponse, SchemasResponse, TableAnalysisResponse,
    TableDetailResponse, TableOverview, TablesResponse,
};
pub use catalog::{
    analyze_columns, infer_relations, ColumnAnalysis, DetectedType, RelationAnnotation, RelationKind,
    RelationshipType, TableStore,
};
pub use sql::{execute_sql, ExecutionResult, StatementInterpreter};
pub use types::{ColumnDef, ColumnDefault, Row, TableSchema, TypeTag, Value};
