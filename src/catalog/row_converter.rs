/// Row conversion utilities - converts between stored tuples and named rows

use crate::types::{Row, TableSchema, Value};

/// A row as stored: one value per declared column, in column order
pub type StoredRow = Vec<Value>;

/// Convert a stored tuple to a named [`Row`]
pub fn stored_to_row(tuple: &StoredRow, schema: &TableSchema) -> Row {
    let mut row = Row::with_capacity(schema.columns.len());
    for (i, col_def) in schema.columns.iter().enumerate() {
        let value = tuple.get(i).cloned().unwrap_or(Value::Null);
        row.insert(col_def.name.clone(), value);
    }
    row
}

/// Convert a batch of stored tuples
pub fn stored_to_rows<'a, I>(tuples: I, schema: &TableSchema) -> Vec<Row>
where
    I: IntoIterator<Item = &'a StoredRow>,
{
    tuples.into_iter().map(|t| stored_to_row(t, schema)).collect()
}
