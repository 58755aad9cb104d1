/// Table metadata and schema definitions
use super::{Timestamp, Value};
use crate::error::{QueryError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Declared column type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeTag {
    /// Auto-incrementing integer
    Serial,
    Integer,
    Decimal,
    /// Variable-length text; `None` means no declared limit
    Varchar(Option<usize>),
    Text,
    Boolean,
    Date,
    Timestamp,
    Json,
    /// Any other declared name; values are stored as given, like TEXT
    Other(String),
}

impl TypeTag {
    /// Resolve a type name from CREATE TABLE, with its parenthesised arguments
    pub fn from_sql(name: &str, args: &[usize]) -> Self {
        let upper = name.to_ascii_uppercase();
        match upper.as_str() {
            "SERIAL" | "BIGSERIAL" => TypeTag::Serial,
            "INTEGER" | "INT" | "BIGINT" | "SMALLINT" => TypeTag::Integer,
            "DECIMAL" | "NUMERIC" | "FLOAT" | "REAL" | "DOUBLE" => TypeTag::Decimal,
            "VARCHAR" | "CHAR" | "CHARACTER" => TypeTag::Varchar(args.first().copied()),
            "TEXT" | "STRING" => TypeTag::Text,
            "BOOLEAN" | "BOOL" => TypeTag::Boolean,
            "DATE" => TypeTag::Date,
            "TIMESTAMP" | "DATETIME" | "TIMESTAMPTZ" => TypeTag::Timestamp,
            "JSON" | "JSONB" => TypeTag::Json,
            _ if args.is_empty() => TypeTag::Other(upper),
            _ => {
                let args: Vec<String> = args.iter().map(usize::to_string).collect();
                TypeTag::Other(format!("{}({})", upper, args.join(",")))
            }
        }
    }

    pub fn is_serial(&self) -> bool {
        matches!(self, TypeTag::Serial)
    }

    /// Lossless adjustments of a literal to the declared type
    ///
    /// Values that do not fit are kept as given; the playground does not
    /// reject inserts on type grounds, except for over-long VARCHAR text.
    pub fn coerce(&self, column: &str, value: Value) -> Result<Value> {
        let coerced = match (self, value) {
            (TypeTag::Decimal, Value::Integer(i)) => Value::Decimal(i as f64),
            (TypeTag::Date | TypeTag::Timestamp, Value::Text(s)) => match Timestamp::parse(&s) {
                Some(ts) => Value::DateTime(ts),
                None => Value::Text(s),
            },
            (TypeTag::Boolean, Value::Text(s)) if s.eq_ignore_ascii_case("true") => {
                Value::Boolean(true)
            }
            (TypeTag::Boolean, Value::Text(s)) if s.eq_ignore_ascii_case("false") => {
                Value::Boolean(false)
            }
            (TypeTag::Varchar(Some(limit)), Value::Text(s)) => {
                if s.chars().count() > *limit {
                    return Err(QueryError::InvalidValue {
                        column: column.to_string(),
                        reason: format!("value longer than VARCHAR({})", limit),
                    });
                }
                Value::Text(s)
            }
            (_, value) => value,
        };
        Ok(coerced)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Serial => f.write_str("SERIAL"),
            TypeTag::Integer => f.write_str("INTEGER"),
            TypeTag::Decimal => f.write_str("DECIMAL"),
            TypeTag::Varchar(Some(n)) => write!(f, "VARCHAR({})", n),
            TypeTag::Varchar(None) => f.write_str("VARCHAR"),
            TypeTag::Text => f.write_str("TEXT"),
            TypeTag::Boolean => f.write_str("BOOLEAN"),
            TypeTag::Date => f.write_str("DATE"),
            TypeTag::Timestamp => f.write_str("TIMESTAMP"),
            TypeTag::Json => f.write_str("JSON"),
            TypeTag::Other(name) => f.write_str(name),
        }
    }
}

impl Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Value filled in when an insert omits the column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnDefault {
    Literal(Value),
    /// `DEFAULT NOW()` / `CURRENT_TIMESTAMP`
    Now,
}

impl ColumnDefault {
    pub fn materialize(&self) -> Value {
        match self {
            ColumnDefault::Literal(v) => v.clone(),
            ColumnDefault::Now => Value::DateTime(Timestamp::now()),
        }
    }
}

impl Serialize for ColumnDefault {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ColumnDefault::Literal(v) => v.serialize(serializer),
            ColumnDefault::Now => serializer.serialize_str("NOW()"),
        }
    }
}

/// Declared `REFERENCES table(column)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
    pub column: String,
}

impl std::fmt::Display for ForeignKeyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

impl Serialize for ForeignKeyRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: TypeTag,
    pub primary_key: bool,
    pub unique: bool,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<ColumnDefault>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, declared_type: TypeTag) -> Self {
        Self {
            name: name.into(),
            declared_type,
            primary_key: false,
            unique: false,
            nullable: true,
            foreign_key: None,
            default: None,
        }
    }

    /// PRIMARY KEY implies UNIQUE and NOT NULL
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.unique = true;
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.foreign_key = Some(ForeignKeyRef {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    pub fn default_value(mut self, default: ColumnDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Unique checks apply to primary keys too
    pub fn is_unique(&self) -> bool {
        self.unique || self.primary_key
    }

    /// A SERIAL primary key may be omitted and is auto-assigned
    pub fn is_auto_increment(&self) -> bool {
        self.primary_key && self.declared_type.is_serial()
    }

    /// Must an insert supply this column?
    pub fn is_required(&self) -> bool {
        !self.nullable && self.default.is_none() && !self.is_auto_increment()
    }
}

/// Table schema definition
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    /// Column definitions (ordered)
    pub columns: Vec<ColumnDef>,
    /// Column name -> position mapping
    column_map: HashMap<String, usize>,
}

impl TableSchema {
    /// Validates column names and the primary key count
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Result<Self> {
        let name = name.into();
        if columns.is_empty() {
            return Err(QueryError::Syntax(format!("table '{}' needs at least one column", name)));
        }

        let mut column_map = HashMap::with_capacity(columns.len());
        for (pos, col) in columns.iter().enumerate() {
            if column_map.insert(col.name.clone(), pos).is_some() {
                return Err(QueryError::Syntax(format!(
                    "duplicate column '{}' in table '{}'",
                    col.name, name
                )));
            }
        }

        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(QueryError::Syntax(format!(
                "table '{}' declares more than one primary key",
                name
            )));
        }

        Ok(Self { name, columns, column_map })
    }

    /// Get column by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.column_map.get(name).map(|&pos| &self.columns[pos])
    }

    /// Get column position by name
    pub fn get_column_position(&self, name: &str) -> Option<usize> {
        self.column_map.get(name).copied()
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableSchema {
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

    #[test]
    fn test_type_aliases() {
        assert_eq!(TypeTag::from_sql("int", &[]), TypeTag::Integer);
        assert_eq!(TypeTag::from_sql("varchar", &[100]), TypeTag::Varchar(Some(100)));
        assert_eq!(TypeTag::from_sql("Numeric", &[10, 2]), TypeTag::Decimal);
        assert_eq!(TypeTag::Varchar(Some(100)).to_string(), "VARCHAR(100)");
    }

    #[test]
    fn test_unlisted_type_names_are_kept() {
        assert_eq!(TypeTag::from_sql("uuid", &[]), TypeTag::Other("UUID".into()));
        assert_eq!(TypeTag::from_sql("bit", &[8]).to_string(), "BIT(8)");

        let tag = TypeTag::from_sql("money", &[]);
        assert_eq!(tag.coerce("price", Value::from("12.50")).unwrap(), Value::from("12.50"));
        assert_eq!(tag.coerce("price", Value::Integer(3)).unwrap(), Value::Integer(3));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = users();
        assert_eq!(schema.column_count(), 4);
        assert_eq!(schema.get_column_position("email"), Some(2));
        assert_eq!(schema.primary_key().map(|c| c.name.as_str()), Some("id"));
        assert!(schema.get_column("missing").is_none());
    }

    #[test]
    fn test_required_columns() {
        let schema = users();
        assert!(!schema.get_column("id").unwrap().is_required());
        assert!(schema.get_column("name").unwrap().is_required());
        assert!(!schema.get_column("age").unwrap().is_required());
    }

    #[test]
    fn test_rejects_duplicate_columns_and_two_primary_keys() {
        let dup = TableSchema::new(
            "t",
            vec![ColumnDef::new("a", TypeTag::Text), ColumnDef::new("a", TypeTag::Text)],
        );
        assert!(dup.is_err());

        let two_pk = TableSchema::new(
            "t",
            vec![
                ColumnDef::new("a", TypeTag::Integer).primary_key(),
                ColumnDef::new("b", TypeTag::Integer).primary_key(),
            ],
        );
        assert!(two_pk.is_err());
    }

    #[test]
    fn test_coerce() {
        let ts = TypeTag::Timestamp.coerce("t", Value::from("2024-01-01 10:00:00")).unwrap();
        assert!(matches!(ts, Value::DateTime(_)));
        assert_eq!(TypeTag::Boolean.coerce("b", Value::from("TRUE")).unwrap(), Value::Boolean(true));
        assert_eq!(TypeTag::Decimal.coerce("p", Value::Integer(5)).unwrap(), Value::Decimal(5.0));
        assert!(TypeTag::Varchar(Some(3)).coerce("v", Value::from("abcd")).is_err());
        assert_eq!(TypeTag::Integer.coerce("i", Value::from("abc")).unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_column_def_serializes_camel_case() {
        let col = ColumnDef::new("user_id", TypeTag::Integer).references("users", "id");
        let json = serde_json::to_value(&col).unwrap();
        assert_eq!(json["type"], "INTEGER");
        assert_eq!(json["primaryKey"], false);
        assert_eq!(json["foreignKey"], "users.id");
    }
}
