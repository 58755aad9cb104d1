/// In-memory table store: schemas plus row data
use super::row_converter::{stored_to_row, stored_to_rows, StoredRow};
use crate::error::{QueryError, Result};
use crate::types::{ColumnDef, Row, TableSchema, UniqueKey, Value};
use ahash::{AHashMap, AHashSet};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// Row predicate used by scans, updates and deletes
pub type RowPredicate<'a> = &'a dyn Fn(&Row) -> bool;

/// One table: its schema and rows in insertion order
#[derive(Debug)]
struct Table {
    schema: TableSchema,
    rows: Vec<StoredRow>,
}

#[derive(Debug, Default)]
struct Catalog {
    /// Table names in creation order
    order: Vec<String>,
    tables: AHashMap<String, Arc<Mutex<Table>>>,
}

/// Owner of every table's schema and rows
///
/// The catalog map is behind a `RwLock`; each table has its own `Mutex`, so
/// the uniqueness check, SERIAL assignment and append of an insert happen
/// under a single lock.
#[derive(Debug, Default)]
pub struct TableStore {
    catalog: RwLock<Catalog>,
}

impl TableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table
    pub fn create_table(&self, schema: TableSchema) -> Result<()> {
        let mut catalog = self.catalog.write();

        if catalog.tables.contains_key(&schema.name) {
            return Err(QueryError::TableExists(schema.name));
        }

        tracing::info!(table = %schema.name, columns = schema.column_count(), "table created");
        let name = schema.name.clone();
        catalog.order.push(name.clone());
        catalog.tables.insert(
            name,
            Arc::new(Mutex::new(Table {
                schema,
                rows: Vec::new(),
            })),
        );
        Ok(())
    }

    /// Drop a table with all of its rows
    pub fn drop_table(&self, table_name: &str) -> Result<()> {
        let mut catalog = self.catalog.write();

        if catalog.tables.remove(table_name).is_none() {
            return Err(QueryError::TableNotFound(table_name.to_string()));
        }
        catalog.order.retain(|name| name != table_name);

        tracing::info!(table = %table_name, "table dropped");
        Ok(())
    }

    /// Check if table exists
    pub fn table_exists(&self, table_name: &str) -> bool {
        self.catalog.read().tables.contains_key(table_name)
    }

    /// List all tables in creation order
    pub fn list_tables(&self) -> Vec<String> {
        self.catalog.read().order.clone()
    }

    /// Column definitions of a table, `None` when it does not exist
    pub fn get_schema(&self, table_name: &str) -> Option<Vec<ColumnDef>> {
        self.table_schema(table_name).map(|schema| schema.columns)
    }

    /// Full schema snapshot of a table
    pub fn table_schema(&self, table_name: &str) -> Option<TableSchema> {
        let table = self.table(table_name).ok()?;
        let schema = table.lock().schema.clone();
        Some(schema)
    }

    pub fn row_count(&self, table_name: &str) -> Result<usize> {
        let table = self.table(table_name)?;
        let count = table.lock().rows.len();
        Ok(count)
    }

    /// Rows in insertion order for which `predicate` holds (all rows if `None`)
    pub fn scan_table(&self, table_name: &str, predicate: Option<RowPredicate<'_>>) -> Result<Vec<Row>> {
        let table = self.table(table_name)?;
        let table = table.lock();

        let rows = stored_to_rows(&table.rows, &table.schema);
        Ok(match predicate {
            Some(pred) => rows.into_iter().filter(|row| pred(row)).collect(),
            None => rows,
        })
    }

    /// Insert one row; returns it with generated columns filled in
    pub fn insert_row(&self, table_name: &str, values: Row) -> Result<Row> {
        let mut inserted = self.insert_rows(table_name, vec![values])?;
        inserted
            .pop()
            .ok_or_else(|| QueryError::Syntax("no row to insert".to_string()))
    }

    /// Insert several rows atomically: every row is validated before any is stored
    pub fn insert_rows(&self, table_name: &str, batch: Vec<Row>) -> Result<Vec<Row>> {
        let table = self.table(table_name)?;
        let mut table = table.lock();

        let schema = &table.schema;
        let serial_pos = schema
            .columns
            .iter()
            .position(|c| c.is_auto_increment());
        let mut max_serial = serial_pos
            .map(|pos| max_integer(&table.rows, pos))
            .unwrap_or(0);

        let mut unique_sets = UniqueSets::build(schema, &table.rows);
        let mut prepared = Vec::with_capacity(batch.len());

        for values in &batch {
            let tuple = prepare_tuple(schema, values, serial_pos, &mut max_serial)?;
            unique_sets.check_and_add(schema, &tuple)?;
            prepared.push(tuple);
        }

        let inserted = stored_to_rows(&prepared, &table.schema);
        tracing::debug!(table = %table_name, rows = prepared.len(), "rows inserted");
        table.rows.extend(prepared);
        Ok(inserted)
    }

    /// Set `assignments` on every row matching `predicate`; returns the number of rows changed
    ///
    /// All changed rows are validated (declared columns, NOT NULL, uniqueness
    /// against the final table contents) before anything is written.
    pub fn update_rows(
        &self,
        table_name: &str,
        predicate: Option<RowPredicate<'_>>,
        assignments: &[(String, Value)],
    ) -> Result<usize> {
        let table = self.table(table_name)?;
        let mut table = table.lock();
        let schema = &table.schema;

        let mut resolved = Vec::with_capacity(assignments.len());
        for (column, value) in assignments {
            let pos = schema.get_column_position(column).ok_or_else(|| {
                QueryError::ColumnNotFound {
                    table: table_name.to_string(),
                    column: column.clone(),
                }
            })?;
            let col = &schema.columns[pos];
            let value = col.declared_type.coerce(&col.name, value.clone())?;
            if value.is_null() && !col.nullable {
                return Err(QueryError::NotNullViolation { column: col.name.clone() });
            }
            resolved.push((pos, value));
        }

        let mut updates: Vec<(usize, StoredRow)> = Vec::new();
        for (idx, tuple) in table.rows.iter().enumerate() {
            let matched = match predicate {
                Some(pred) => pred(&stored_to_row(tuple, schema)),
                None => true,
            };
            if matched {
                let mut new_tuple = tuple.clone();
                for (pos, value) in &resolved {
                    new_tuple[*pos] = value.clone();
                }
                updates.push((idx, new_tuple));
            }
        }

        // Uniqueness over the table as it would look after the update
        let mut final_sets = UniqueSets::empty(schema);
        let mut cursor = 0;
        for (idx, tuple) in table.rows.iter().enumerate() {
            let effective = match updates.get(cursor) {
                Some((update_idx, new_tuple)) if *update_idx == idx => {
                    cursor += 1;
                    new_tuple
                }
                _ => tuple,
            };
            final_sets.check_and_add(schema, effective)?;
        }

        let affected = updates.len();
        for (idx, new_tuple) in updates {
            table.rows[idx] = new_tuple;
        }
        tracing::debug!(table = %table_name, rows = affected, "rows updated");
        Ok(affected)
    }

    /// Remove every row matching `predicate`; survivors keep their order
    pub fn delete_rows(&self, table_name: &str, predicate: Option<RowPredicate<'_>>) -> Result<usize> {
        let table = self.table(table_name)?;
        let mut table = table.lock();
        let Table { schema, rows } = &mut *table;

        let before = rows.len();
        match predicate {
            Some(pred) => rows.retain(|tuple| !pred(&stored_to_row(tuple, schema))),
            None => rows.clear(),
        }
        let affected = before - rows.len();
        tracing::debug!(table = %table_name, rows = affected, "rows deleted");
        Ok(affected)
    }

    fn table(&self, table_name: &str) -> Result<Arc<Mutex<Table>>> {
        self.catalog
            .read()
            .tables
            .get(table_name)
            .cloned()
            .ok_or_else(|| QueryError::TableNotFound(table_name.to_string()))
    }
}

/// Build the stored tuple for one inserted row
fn prepare_tuple(
    schema: &TableSchema,
    values: &Row,
    serial_pos: Option<usize>,
    max_serial: &mut i64,
) -> Result<StoredRow> {
    for column in values.columns() {
        if schema.get_column(column).is_none() {
            return Err(QueryError::ColumnNotFound {
                table: schema.name.clone(),
                column: column.to_string(),
            });
        }
    }

    let mut tuple = Vec::with_capacity(schema.column_count());
    for (pos, col) in schema.columns.iter().enumerate() {
        let value = match values.get(&col.name) {
            Some(value) => col.declared_type.coerce(&col.name, value.clone())?,
            None if Some(pos) == serial_pos => match max_serial.checked_add(1) {
                Some(next) => Value::Integer(next),
                None => {
                    return Err(QueryError::InvalidValue {
                        column: col.name.clone(),
                        reason: "SERIAL exhausted".to_string(),
                    })
                }
            },
            None => match &col.default {
                Some(default) => default.materialize(),
                None => Value::Null,
            },
        };

        if value.is_null() && !col.nullable {
            return Err(QueryError::NotNullViolation { column: col.name.clone() });
        }
        if Some(pos) == serial_pos {
            if let Some(id) = value.as_i64() {
                *max_serial = (*max_serial).max(id);
            }
        }
        tuple.push(value);
    }
    Ok(tuple)
}

/// Largest integer held in column `pos`, or 0
fn max_integer(rows: &[StoredRow], pos: usize) -> i64 {
    rows.iter()
        .filter_map(|tuple| tuple.get(pos).and_then(Value::as_i64))
        .max()
        .unwrap_or(0)
        .max(0)
}

/// Seen values per unique column
struct UniqueSets {
    sets: Vec<(usize, AHashSet<UniqueKey>)>,
}

impl UniqueSets {
    fn empty(schema: &TableSchema) -> Self {
        let sets = schema
            .columns
            .iter()
            .enumerate()
            .filter(|(_, col)| col.is_unique())
            .map(|(pos, _)| (pos, AHashSet::new()))
            .collect();
        Self { sets }
    }

    fn build(schema: &TableSchema, rows: &[StoredRow]) -> Self {
        let mut this = Self::empty(schema);
        for (pos, set) in &mut this.sets {
            set.extend(rows.iter().filter_map(|t| t.get(*pos).and_then(Value::unique_key)));
        }
        this
    }

    fn check_and_add(&mut self, schema: &TableSchema, tuple: &StoredRow) -> Result<()> {
        for (pos, set) in &self.sets {
            if let Some(key) = tuple[*pos].unique_key() {
                if set.contains(&key) {
                    return Err(QueryError::UniqueViolation {
                        column: schema.columns[*pos].name.clone(),
                        value: tuple[*pos].to_string(),
                    });
                }
            }
        }
        for (pos, set) in &mut self.sets {
            if let Some(key) = tuple[*pos].unique_key() {
                set.insert(key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnDefault, TypeTag};

    fn users_schema() -> TableSchema {
        TableSchema::new(
            "users",
            vec![
                ColumnDef::new("id", TypeTag::Serial).primary_key(),
                ColumnDef::new("name", TypeTag::Varchar(Some(100))).not_null(),
                ColumnDef::new("email", TypeTag::Varchar(Some(100))).unique(),
                ColumnDef::new("age", TypeTag::Integer),
            ],
        )
        .unwrap()
    }

    fn store_with_users() -> TableStore {
        let store = TableStore::new();
        store.create_table(users_schema()).unwrap();
        store
    }

    fn user(name: &str, email: &str, age: i64) -> Row {
        vec![
            ("name", Value::from(name)),
            ("email", Value::from(email)),
            ("age", Value::Integer(age)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_create_and_list_in_creation_order() {
        let store = store_with_users();
        store
            .create_table(TableSchema::new("a_table", vec![ColumnDef::new("x", TypeTag::Text)]).unwrap())
            .unwrap();
        assert_eq!(store.list_tables(), vec!["users", "a_table"]);
    }

    #[test]
    fn test_duplicate_table() {
        let store = store_with_users();
        let err = store.create_table(users_schema()).unwrap_err();
        assert_eq!(err, QueryError::TableExists("users".into()));
    }

    #[test]
    fn test_drop_table() {
        let store = store_with_users();
        store.drop_table("users").unwrap();
        assert!(!store.table_exists("users"));
        assert!(store.list_tables().is_empty());
        assert_eq!(store.drop_table("users").unwrap_err(), QueryError::TableNotFound("users".into()));
        assert!(store.scan_table("users", None).is_err());
    }

    #[test]
    fn test_serial_assignment() {
        let store = store_with_users();
        let first = store.insert_row("users", user("Ahmet", "ahmet@example.com", 25)).unwrap();
        assert_eq!(first.get("id"), Some(&Value::Integer(1)));

        let mut explicit = user("Fatma", "fatma@example.com", 30);
        explicit.insert("id", Value::Integer(10));
        store.insert_row("users", explicit).unwrap();

        let next = store.insert_row("users", user("Mehmet", "mehmet@example.com", 28)).unwrap();
        assert_eq!(next.get("id"), Some(&Value::Integer(11)));
    }

    #[test]
    fn test_serial_exhausted() {
        let store = store_with_users();
        let mut last = user("Fatma", "fatma@example.com", 30);
        last.insert("id", Value::Integer(i64::MAX));
        store.insert_row("users", last).unwrap();

        let err = store
            .insert_row("users", user("Mehmet", "mehmet@example.com", 28))
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::InvalidValue { column: "id".into(), reason: "SERIAL exhausted".into() }
        );
        assert_eq!(store.row_count("users").unwrap(), 1);
    }

    #[test]
    fn test_serial_ignores_out_of_range_decimal_ids() {
        let store = store_with_users();
        let mut huge = user("Fatma", "fatma@example.com", 30);
        huge.insert("id", Value::Decimal(1e20));
        store.insert_row("users", huge).unwrap();

        let next = store.insert_row("users", user("Mehmet", "mehmet@example.com", 28)).unwrap();
        assert_eq!(next.get("id"), Some(&Value::Integer(1)));
    }

    #[test]
    fn test_missing_required_column() {
        let store = store_with_users();
        let row: Row = vec![("email", Value::from("x@example.com"))].into_iter().collect();
        let err = store.insert_row("users", row).unwrap_err();
        assert_eq!(err, QueryError::NotNullViolation { column: "name".into() });
        assert_eq!(store.row_count("users").unwrap(), 0);
    }

    #[test]
    fn test_undeclared_column() {
        let store = store_with_users();
        let mut row = user("Ahmet", "a@example.com", 1);
        row.insert("nickname", Value::from("ah"));
        let err = store.insert_row("users", row).unwrap_err();
        assert!(matches!(err, QueryError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_unique_violation_leaves_table_unchanged() {
        let store = store_with_users();
        store.insert_row("users", user("Ayse", "ayse@example.com", 22)).unwrap();
        let before = store.scan_table("users", None).unwrap();

        let err = store.insert_row("users", user("Ayse", "ayse@example.com", 22)).unwrap_err();
        assert!(matches!(err, QueryError::UniqueViolation { ref column, .. } if column == "email"));
        assert_eq!(store.scan_table("users", None).unwrap(), before);
    }

    #[test]
    fn test_batch_insert_is_atomic() {
        let store = store_with_users();
        let err = store
            .insert_rows(
                "users",
                vec![user("A", "same@example.com", 1), user("B", "same@example.com", 2)],
            )
            .unwrap_err();
        assert!(matches!(err, QueryError::UniqueViolation { .. }));
        assert_eq!(store.row_count("users").unwrap(), 0);

        let rows = store
            .insert_rows("users", vec![user("A", "a@example.com", 1), user("B", "b@example.com", 2)])
            .unwrap();
        assert_eq!(rows[1].get("id"), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_nulls_do_not_collide_on_unique_columns() {
        let store = store_with_users();
        let row = |name: &str| -> Row { vec![("name", Value::from(name))].into_iter().collect() };
        store.insert_row("users", row("A")).unwrap();
        store.insert_row("users", row("B")).unwrap();
        assert_eq!(store.row_count("users").unwrap(), 2);
    }

    #[test]
    fn test_default_applied() {
        let store = TableStore::new();
        store
            .create_table(
                TableSchema::new(
                    "flags",
                    vec![
                        ColumnDef::new("name", TypeTag::Text),
                        ColumnDef::new("enabled", TypeTag::Boolean)
                            .not_null()
                            .default_value(ColumnDefault::Literal(Value::Boolean(false))),
                        ColumnDef::new("created_at", TypeTag::Timestamp).default_value(ColumnDefault::Now),
                    ],
                )
                .unwrap(),
            )
            .unwrap();
        let row = store
            .insert_row("flags", vec![("name", Value::from("beta"))].into_iter().collect())
            .unwrap();
        assert_eq!(row.get("enabled"), Some(&Value::Boolean(false)));
        assert!(matches!(row.get("created_at"), Some(Value::DateTime(_))));
    }

    #[test]
    fn test_scan_with_predicate_and_idempotence() {
        let store = store_with_users();
        store.insert_row("users", user("A", "a@example.com", 18)).unwrap();
        store.insert_row("users", user("B", "b@example.com", 30)).unwrap();

        let adults = |row: &Row| row.get("age").and_then(Value::as_i64).unwrap_or(0) > 20;
        let found = store.scan_table("users", Some(&adults)).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&Value::from("B")));

        assert_eq!(store.scan_table("users", None).unwrap(), store.scan_table("users", None).unwrap());
    }

    #[test]
    fn test_update_rows() {
        let store = store_with_users();
        store.insert_row("users", user("A", "a@example.com", 18)).unwrap();
        store.insert_row("users", user("B", "b@example.com", 30)).unwrap();

        let is_a = |row: &Row| row.get("name") == Some(&Value::from("A"));
        let changed = store
            .update_rows("users", Some(&is_a), &[("age".into(), Value::Integer(19))])
            .unwrap();
        assert_eq!(changed, 1);

        let rows = store.scan_table("users", None).unwrap();
        assert_eq!(rows[0].get("age"), Some(&Value::Integer(19)));
        assert_eq!(rows[1].get("age"), Some(&Value::Integer(30)));
    }

    #[test]
    fn test_update_unique_violation_changes_nothing() {
        let store = store_with_users();
        store.insert_row("users", user("A", "a@example.com", 18)).unwrap();
        store.insert_row("users", user("B", "b@example.com", 30)).unwrap();
        let before = store.scan_table("users", None).unwrap();

        let err = store
            .update_rows("users", None, &[("email".into(), Value::from("same@example.com"))])
            .unwrap_err();
        assert!(matches!(err, QueryError::UniqueViolation { .. }));
        assert_eq!(store.scan_table("users", None).unwrap(), before);
    }

    #[test]
    fn test_delete_rows_preserves_order() {
        let store = store_with_users();
        for (i, name) in ["A", "B", "C", "D"].iter().enumerate() {
            store
                .insert_row("users", user(name, &format!("{}@example.com", name), i as i64))
                .unwrap();
        }
        let odd = |row: &Row| row.get("age").and_then(Value::as_i64).unwrap_or(0) % 2 == 1;
        assert_eq!(store.delete_rows("users", Some(&odd)).unwrap(), 2);

        let names: Vec<_> = store
            .scan_table("users", None)
            .unwrap()
            .iter()
            .map(|r| r.get("name").cloned().unwrap())
            .collect();
        assert_eq!(names, vec![Value::from("A"), Value::from("C")]);
    }
}
