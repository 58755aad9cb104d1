/// Query executor - runs parsed statements against a [`TableStore`]
use super::ast::*;
use super::evaluator::{sort_rows, PredicateEvaluator};
use crate::catalog::TableStore;
use crate::config::{EngineConfig, MutationMode, PredicatePolicy};
use crate::error::{ErrorKind, QueryError, Result};
use crate::types::{Row, TableSchema};
use serde::Serialize;

/// Uniform envelope returned for every statement
///
/// SELECT fills `data` and `rowCount`; DML and DDL fill `rowCount` and
/// `message`; failures fill `error` and `errorKind`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Row>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl ExecutionResult {
    pub fn rows(rows: Vec<Row>) -> Self {
        Self {
            success: true,
            row_count: Some(rows.len()),
            data: Some(rows),
            ..Default::default()
        }
    }

    pub fn affected(row_count: usize, message: impl Into<String>) -> Self {
        Self {
            success: true,
            row_count: Some(row_count),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn failure(err: &QueryError) -> Self {
        Self {
            success: false,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            ..Default::default()
        }
    }
}

/// `1 row inserted`, `3 rows deleted`
fn rows_message(count: usize, verb: &str) -> String {
    if count == 1 {
        format!("1 row {}", verb)
    } else {
        format!("{} rows {}", count, verb)
    }
}

/// Executes one statement; stateless apart from the store it borrows
pub struct QueryExecutor<'a> {
    store: &'a TableStore,
    config: &'a EngineConfig,
}

impl<'a> QueryExecutor<'a> {
    pub fn new(store: &'a TableStore, config: &'a EngineConfig) -> Self {
        Self { store, config }
    }

    pub fn execute(&self, statement: Statement) -> Result<ExecutionResult> {
        tracing::debug!(kind = statement.kind(), table = statement.table(), "executing statement");

        match statement {
            Statement::Select(stmt) => self.execute_select(stmt),
            Statement::Insert(stmt) => self.execute_insert(stmt),
            Statement::Update(stmt) => self.execute_update(stmt),
            Statement::Delete(stmt) => self.execute_delete(stmt),
            Statement::CreateTable(stmt) => self.execute_create_table(stmt),
            Statement::DropTable(stmt) => self.execute_drop_table(stmt),
        }
    }

    fn execute_select(&self, stmt: SelectStmt) -> Result<ExecutionResult> {
        let schema = self.schema(&stmt.table)?;

        if let Projection::Columns(columns) = &stmt.projection {
            for column in columns {
                require_column(&schema, column)?;
            }
        }
        for key in &stmt.order_by {
            require_column(&schema, &key.column)?;
        }

        let predicate = self.resolve_predicate(stmt.where_clause.as_ref(), &schema)?;
        let mut rows = self.scan(&stmt.table, predicate)?;

        sort_rows(&mut rows, &stmt.order_by);
        let rows = rows
            .into_iter()
            .skip(stmt.offset.unwrap_or(0))
            .take(stmt.limit.unwrap_or(usize::MAX));

        let rows = match &stmt.projection {
            Projection::All => rows.collect(),
            Projection::Columns(columns) => rows.map(|row| row.project(columns)).collect(),
        };

        Ok(ExecutionResult::rows(rows))
    }

    fn execute_insert(&self, stmt: InsertStmt) -> Result<ExecutionResult> {
        let schema = self.schema(&stmt.table)?;
        let columns = stmt.columns.unwrap_or_else(|| schema.column_names());

        if stmt.values.iter().any(|tuple| tuple.len() != columns.len()) {
            return Err(QueryError::ColumnCountMismatch);
        }

        let rows: Vec<Row> = stmt
            .values
            .into_iter()
            .map(|tuple| columns.iter().cloned().zip(tuple).collect())
            .collect();

        let inserted = self.store.insert_rows(&stmt.table, rows)?;
        Ok(ExecutionResult::affected(inserted.len(), rows_message(inserted.len(), "inserted")))
    }

    fn execute_update(&self, stmt: UpdateStmt) -> Result<ExecutionResult> {
        if self.config.mutation_mode == MutationMode::Simulated {
            return Ok(ExecutionResult::affected(1, "UPDATE simulated: no rows were changed"));
        }

        let schema = self.schema(&stmt.table)?;
        let predicate = self.resolve_predicate(stmt.where_clause.as_ref(), &schema)?;
        let evaluator = predicate.map(PredicateEvaluator::new);
        let filter: &dyn Fn(&Row) -> bool = &|row| evaluator.map_or(true, |e| e.matches(row));

        let count = self.store.update_rows(&stmt.table, Some(filter), &stmt.assignments)?;
        Ok(ExecutionResult::affected(count, rows_message(count, "updated")))
    }

    fn execute_delete(&self, stmt: DeleteStmt) -> Result<ExecutionResult> {
        if self.config.mutation_mode == MutationMode::Simulated {
            return Ok(ExecutionResult::affected(1, "DELETE simulated: no rows were removed"));
        }

        let schema = self.schema(&stmt.table)?;
        let predicate = self.resolve_predicate(stmt.where_clause.as_ref(), &schema)?;
        let evaluator = predicate.map(PredicateEvaluator::new);
        let filter: &dyn Fn(&Row) -> bool = &|row| evaluator.map_or(true, |e| e.matches(row));

        let count = self.store.delete_rows(&stmt.table, Some(filter))?;
        Ok(ExecutionResult::affected(count, rows_message(count, "deleted")))
    }

    fn execute_create_table(&self, stmt: CreateTableStmt) -> Result<ExecutionResult> {
        let schema = TableSchema::new(stmt.table.clone(), stmt.columns)?;
        self.store.create_table(schema)?;
        Ok(ExecutionResult::affected(0, format!("Table '{}' created", stmt.table)))
    }

    fn execute_drop_table(&self, stmt: DropTableStmt) -> Result<ExecutionResult> {
        match self.store.drop_table(&stmt.table) {
            Ok(()) => Ok(ExecutionResult::affected(0, format!("Table '{}' dropped", stmt.table))),
            Err(QueryError::TableNotFound(_)) if stmt.if_exists => Ok(ExecutionResult::affected(
                0,
                format!("Table '{}' does not exist, skipped", stmt.table),
            )),
            Err(err) => Err(err),
        }
    }

    fn schema(&self, table: &str) -> Result<TableSchema> {
        self.store
            .table_schema(table)
            .ok_or_else(|| QueryError::TableNotFound(table.to_string()))
    }

    fn scan(&self, table: &str, predicate: Option<&Predicate>) -> Result<Vec<Row>> {
        match predicate {
            Some(predicate) => {
                let evaluator = PredicateEvaluator::new(predicate);
                let filter: &dyn Fn(&Row) -> bool = &|row| evaluator.matches(row);
                self.store.scan_table(table, Some(filter))
            }
            None => self.store.scan_table(table, None),
        }
    }

    /// Apply the predicate policy to a WHERE clause
    ///
    /// Returns `None` when every row matches: no clause, or an unparsed
    /// clause under [`PredicatePolicy::MatchAll`].
    fn resolve_predicate<'p>(
        &self,
        clause: Option<&'p Predicate>,
        schema: &TableSchema,
    ) -> Result<Option<&'p Predicate>> {
        let predicate = match clause {
            Some(predicate) => predicate,
            None => return Ok(None),
        };

        if let Some(text) = predicate.unsupported() {
            return match self.config.predicate_policy {
                PredicatePolicy::Reject => Err(QueryError::UnsupportedPredicate(text.to_string())),
                PredicatePolicy::MatchAll => {
                    tracing::warn!(
                        table = %schema.name,
                        predicate = %text,
                        "unsupported predicate, matching every row"
                    );
                    Ok(None)
                }
            };
        }

        PredicateEvaluator::new(predicate).check_columns(schema)?;
        Ok(Some(predicate))
    }
}

fn require_column(schema: &TableSchema, column: &str) -> Result<()> {
    if schema.get_column(column).is_none() {
        return Err(QueryError::ColumnNotFound {
            table: schema.name.clone(),
            column: column.to_string(),
        });
    }
    Ok(())
}
