//! Common test utilities for interpreter integration tests
#![allow(dead_code)]

use querylab::{
    EngineConfig, ErrorKind, ExecutionResult, MutationMode, PredicatePolicy, Row,
    StatementInterpreter, TableStore, Value,
};
use std::sync::Arc;

/// Interpreter plus helpers that assert on the result envelope
pub struct TestContext {
    pub interp: StatementInterpreter,
}

impl TestContext {
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            interp: StatementInterpreter::from_config(config).unwrap(),
        }
    }

    /// Store seeded with `users` and `posts`
    pub fn seeded() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn empty() -> Self {
        Self::with_config(EngineConfig::empty())
    }

    pub fn applying() -> Self {
        Self::with_config(EngineConfig::default().with_mutation_mode(MutationMode::Apply))
    }

    pub fn strict() -> Self {
        Self::with_config(EngineConfig::default().with_predicate_policy(PredicatePolicy::Reject))
    }

    pub fn store(&self) -> &Arc<TableStore> {
        self.interp.store()
    }

    /// Run a statement that must succeed
    pub fn exec(&self, sql: &str) -> ExecutionResult {
        let result = self.interp.execute(sql);
        assert!(result.success, "statement failed: {}\n  error: {:?}", sql, result.error);
        result
    }

    /// Run a statement that must fail with `kind`; returns the error text
    pub fn exec_error(&self, sql: &str, kind: ErrorKind) -> String {
        let result = self.interp.execute(sql);
        assert!(!result.success, "statement unexpectedly succeeded: {}", sql);
        assert_eq!(result.error_kind, Some(kind), "wrong error kind for {}: {:?}", sql, result.error);
        assert!(result.data.is_none());
        result.error.unwrap()
    }

    /// Rows returned by a SELECT
    pub fn query(&self, sql: &str) -> Vec<Row> {
        let result = self.exec(sql);
        let rows = result.data.expect("SELECT returns data");
        assert_eq!(result.row_count, Some(rows.len()));
        rows
    }

    /// One column of a SELECT, as values
    pub fn column(&self, sql: &str, column: &str) -> Vec<Value> {
        self.query(sql)
            .iter()
            .map(|row| row.get(column).cloned().unwrap_or(Value::Null))
            .collect()
    }

    pub fn row_count(&self, table: &str) -> usize {
        self.store().row_count(table).unwrap()
    }
}

pub fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Integer).collect()
}
