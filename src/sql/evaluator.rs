/// Predicate evaluator - decides which rows a WHERE clause keeps
use super::ast::{CompareOp, OrderByExpr, Predicate};
use crate::error::{QueryError, Result};
use crate::types::{Row, TableSchema, Value};
use std::cmp::Ordering;

/// Evaluates a parsed predicate against rows
///
/// Comparisons use [`Value::loosely_equals`] and [`Value::compare`], so
/// `age = '25'` matches an integer 25. Anything compared with NULL is false
/// apart from `IS [NOT] NULL`. An [`Predicate::Unsupported`] clause matches
/// every row; callers that want it rejected must check before evaluating.
#[derive(Debug, Clone, Copy)]
pub struct PredicateEvaluator<'a> {
    predicate: &'a Predicate,
}

impl<'a> PredicateEvaluator<'a> {
    pub fn new(predicate: &'a Predicate) -> Self {
        Self { predicate }
    }

    /// Fail with a column mismatch if the predicate names a column `schema` lacks
    pub fn check_columns(&self, schema: &TableSchema) -> Result<()> {
        for column in self.predicate.columns() {
            if schema.get_column(column).is_none() {
                return Err(QueryError::ColumnNotFound {
                    table: schema.name.clone(),
                    column: column.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn matches(&self, row: &Row) -> bool {
        eval(self.predicate, row)
    }
}

fn eval(predicate: &Predicate, row: &Row) -> bool {
    match predicate {
        Predicate::Compare { column, op, value } => {
            let actual = row.get(column).unwrap_or(&Value::Null);
            compare(actual, *op, value)
        }
        Predicate::IsNull { column, negated } => {
            let is_null = row.get(column).map_or(true, Value::is_null);
            is_null != *negated
        }
        Predicate::And(left, right) => eval(left, row) && eval(right, row),
        Predicate::Or(left, right) => eval(left, row) || eval(right, row),
        Predicate::Not(inner) => !eval(inner, row),
        Predicate::Unsupported(_) => true,
    }
}

fn compare(actual: &Value, op: CompareOp, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return false;
    }
    match op {
        CompareOp::Eq => actual.loosely_equals(expected),
        CompareOp::Ne => !actual.loosely_equals(expected),
        CompareOp::Lt => actual.compare(expected) == Some(Ordering::Less),
        CompareOp::Le => matches!(actual.compare(expected), Some(Ordering::Less | Ordering::Equal)),
        CompareOp::Gt => actual.compare(expected) == Some(Ordering::Greater),
        CompareOp::Ge => {
            matches!(actual.compare(expected), Some(Ordering::Greater | Ordering::Equal))
        }
    }
}

/// Stable sort by ORDER BY keys; NULLs sort last ascending, first descending
pub fn sort_rows(rows: &mut [Row], order_by: &[OrderByExpr]) {
    if order_by.is_empty() {
        return;
    }
    rows.sort_by(|a, b| {
        for key in order_by {
            let left = a.get(&key.column).unwrap_or(&Value::Null);
            let right = b.get(&key.column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
            };
            let ordering = if key.asc { ordering } else { ordering.reverse() };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}
