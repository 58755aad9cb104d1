//! querylab public API
//!
//! The playground's request/response contracts as plain calls:
//! - `query()`: run one statement, timed
//! - `tables()`: table names in creation order
//! - `table_detail()`: schema plus every row of one table
//! - `schemas()`: per-table overview with sample rows and key annotations
//! - `analyze_table()`: null/distinct counts and detected type per column
//!
//! Every response serializes with `serde` to the JSON shape a web front end
//! expects; no HTTP server is included.

use crate::catalog::{analyze_columns, infer_relations, ColumnAnalysis, RelationAnnotation, TableStore};
use crate::config::EngineConfig;
use crate::error::{ErrorKind, QueryError, Result};
use crate::sql::{ExecutionResult, StatementInterpreter};
use crate::types::{ColumnDef, Row};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Instant;

/// Name-keyed JSON object that keeps insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn column_map(columns: Vec<ColumnDef>) -> OrderedMap<ColumnDef> {
    OrderedMap(columns.into_iter().map(|c| (c.name.clone(), c)).collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    #[serde(flatten)]
    pub result: ExecutionResult,
    /// Milliseconds spent in the interpreter
    pub execution_time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TablesResponse {
    pub success: bool,
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDetailResponse {
    pub success: bool,
    pub table_name: String,
    pub schema: OrderedMap<ColumnDef>,
    pub data: Vec<Row>,
    pub row_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableOverview {
    pub schema: OrderedMap<ColumnDef>,
    pub sample_data: Vec<Row>,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub relations: Vec<RelationAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemasResponse {
    pub success: bool,
    pub schemas: OrderedMap<TableOverview>,
    pub table_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableAnalysisResponse {
    pub success: bool,
    pub table_name: String,
    pub row_count: usize,
    pub analysis: OrderedMap<ColumnAnalysis>,
}

/// Body sent back when a call fails outright (for example an unknown table)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_kind: ErrorKind,
}

impl From<&QueryError> for ErrorResponse {
    fn from(err: &QueryError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            error_kind: err.kind(),
        }
    }
}

/// SQL playground over one shared table store
///
/// ```
/// use querylab::{EngineConfig, Playground};
///
/// let playground = Playground::new(EngineConfig::default())?;
/// let response = playground.query("SELECT name FROM users WHERE id = 1");
/// assert!(response.result.success);
/// assert_eq!(playground.tables().tables, vec!["users", "posts"]);
/// # Ok::<(), querylab::QueryError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Playground {
    interpreter: StatementInterpreter,
}

impl Playground {
    /// Build a playground with a fresh store (seeded unless `config` says otherwise)
    pub fn new(config: EngineConfig) -> Result<Self> {
        Ok(Self {
            interpreter: StatementInterpreter::from_config(config)?,
        })
    }

    pub fn with_store(store: Arc<TableStore>, config: EngineConfig) -> Self {
        Self {
            interpreter: StatementInterpreter::new(store, config),
        }
    }

    pub fn interpreter(&self) -> &StatementInterpreter {
        &self.interpreter
    }

    pub fn store(&self) -> &TableStore {
        self.interpreter.store()
    }

    /// Run one statement and report how long it took
    pub fn query(&self, text: &str) -> QueryResponse {
        if text.trim().is_empty() {
            return QueryResponse {
                result: ExecutionResult {
                    success: false,
                    error: Some("enter a valid SQL query".to_string()),
                    error_kind: Some(ErrorKind::SyntaxError),
                    ..Default::default()
                },
                execution_time: 0,
            };
        }

        let start = Instant::now();
        let result = self.interpreter.execute(text);
        let elapsed = start.elapsed();
        tracing::debug!(success = result.success, elapsed_us = elapsed.as_micros() as u64, "query finished");

        QueryResponse {
            result,
            execution_time: elapsed.as_millis() as u64,
        }
    }

    pub fn tables(&self) -> TablesResponse {
        TablesResponse {
            success: true,
            tables: self.store().list_tables(),
        }
    }

    /// Schema and all rows of `name`; unknown tables are [`QueryError::TableNotFound`]
    pub fn table_detail(&self, name: &str) -> Result<TableDetailResponse> {
        let store = self.store();
        let schema = store
            .get_schema(name)
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;
        let data = store.scan_table(name, None)?;

        Ok(TableDetailResponse {
            success: true,
            table_name: name.to_string(),
            schema: column_map(schema),
            row_count: data.len(),
            data,
        })
    }

    /// Column profile of `name`; unknown tables are [`QueryError::TableNotFound`]
    pub fn analyze_table(&self, name: &str) -> Result<TableAnalysisResponse> {
        let store = self.store();
        let columns = store
            .get_schema(name)
            .ok_or_else(|| QueryError::TableNotFound(name.to_string()))?;
        let rows = store.scan_table(name, None)?;

        Ok(TableAnalysisResponse {
            success: true,
            table_name: name.to_string(),
            row_count: rows.len(),
            analysis: OrderedMap(analyze_columns(&columns, &rows)),
        })
    }

    /// Overview of every table, with the first `sample_rows` rows of each
    pub fn schemas(&self) -> SchemasResponse {
        let store = self.store();
        let tables = store.list_tables();
        let sample_rows = self.interpreter.config().sample_rows;

        let mut schemas = Vec::with_capacity(tables.len());
        for name in &tables {
            // A table dropped since `list_tables` is simply left out
            let (columns, rows) = match (store.get_schema(name), store.scan_table(name, None)) {
                (Some(columns), Ok(rows)) => (columns, rows),
                _ => continue,
            };

            let overview = TableOverview {
                relations: infer_relations(name, &columns, &tables),
                columns: columns.iter().map(|c| c.name.clone()).collect(),
                row_count: rows.len(),
                sample_data: rows.into_iter().take(sample_rows).collect(),
                schema: column_map(columns),
            };
            schemas.push((name.clone(), overview));
        }

        SchemasResponse {
            success: true,
            table_count: schemas.len(),
            schemas: OrderedMap(schemas),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DetectedType, RelationKind};

    fn playground() -> Playground {
        Playground::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_query_response_is_flat() {
        let response = playground().query("SELECT * FROM users WHERE id = 2");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["rowCount"], 1);
        assert_eq!(json["data"][0]["name"], "Fatma Kaya");
        assert!(json["executionTime"].is_u64());
    }

    #[test]
    fn test_blank_query() {
        let response = playground().query("   \n");
        assert!(!response.result.success);
        assert_eq!(response.result.error.as_deref(), Some("enter a valid SQL query"));
    }

    #[test]
    fn test_table_detail() {
        let pg = playground();
        let detail = pg.table_detail("posts").unwrap();
        assert_eq!(detail.row_count, 3);
        assert_eq!(detail.schema.keys().collect::<Vec<_>>(), vec!["id", "user_id", "title", "content", "created_at"]);

        let err = pg.table_detail("missing").unwrap_err();
        assert_eq!(ErrorResponse::from(&err).error_kind, ErrorKind::UnknownTableError);
    }

    #[test]
    fn test_analyze_table() {
        let pg = playground();
        let response = pg.analyze_table("users").unwrap();
        assert_eq!(response.row_count, 3);
        assert_eq!(
            response.analysis.keys().collect::<Vec<_>>(),
            vec!["id", "name", "email", "age", "created_at"]
        );

        let email = response.analysis.get("email").unwrap();
        assert_eq!(email.actual_type, DetectedType::Email);
        assert_eq!(email.unique_count, 3);
        assert_eq!(email.schema_type, "VARCHAR(100)");

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["analysis"]["age"]["actualType"], "INTEGER");
        assert_eq!(json["analysis"]["age"]["nullCount"], 0);

        pg.query("CREATE TABLE empty_one (id INTEGER)");
        assert!(pg.analyze_table("empty_one").unwrap().analysis.is_empty());
        assert!(pg.analyze_table("missing").is_err());
    }

    #[test]
    fn test_schemas_overview() {
        let pg = Playground::new(EngineConfig::default().with_sample_rows(2)).unwrap();
        let response = pg.schemas();
        assert_eq!(response.table_count, 2);

        let posts = response.schemas.get("posts").unwrap();
        assert_eq!(posts.sample_data.len(), 2);
        assert_eq!(posts.row_count, 3);
        let fk = posts
            .relations
            .iter()
            .find(|r| r.kind == RelationKind::ForeignKey)
            .unwrap();
        assert_eq!(fk.from.as_deref(), Some("posts.user_id"));
        assert_eq!(fk.to.as_deref(), Some("users.id"));

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["schemas"]["users"]["schema"]["id"]["primaryKey"], true);
        assert_eq!(json["schemas"]["users"]["schema"]["name"]["type"], "VARCHAR(100)");
    }
}
