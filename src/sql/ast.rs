/// Parsed statements
use crate::types::{ColumnDef, Value};

/// Top-level statement, one variant per supported kind
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStmt),
    Insert(InsertStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
    CreateTable(CreateTableStmt),
    DropTable(DropTableStmt),
}

impl Statement {
    /// Leading keyword(s), for log lines and advisory messages
    pub fn kind(&self) -> &'static str {
        match self {
            Statement::Select(_) => "SELECT",
            Statement::Insert(_) => "INSERT",
            Statement::Update(_) => "UPDATE",
            Statement::Delete(_) => "DELETE",
            Statement::CreateTable(_) => "CREATE TABLE",
            Statement::DropTable(_) => "DROP TABLE",
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Statement::Select(s) => &s.table,
            Statement::Insert(s) => &s.table,
            Statement::Update(s) => &s.table,
            Statement::Delete(s) => &s.table,
            Statement::CreateTable(s) => &s.table,
            Statement::DropTable(s) => &s.table,
        }
    }
}

/// SELECT <projection> FROM <table> [WHERE ...] [ORDER BY ...] [LIMIT n [OFFSET m]]
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub projection: Projection,
    pub table: String,
    pub where_clause: Option<Predicate>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`, or any projection that is not a plain column list
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderByExpr {
    pub column: String,
    pub asc: bool,
}

/// WHERE clause
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: CompareOp,
        value: Value,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    /// Clause text the grammar could not parse
    Unsupported(String),
}

impl Predicate {
    /// Column names the predicate reads, in order of appearance
    pub fn columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::Compare { column, .. } | Predicate::IsNull { column, .. } => {
                out.push(column)
            }
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.collect_columns(out);
                r.collect_columns(out);
            }
            Predicate::Not(inner) => inner.collect_columns(out),
            Predicate::Unsupported(_) => {}
        }
    }

    /// First unparsed fragment anywhere in the tree
    pub fn unsupported(&self) -> Option<&str> {
        match self {
            Predicate::Unsupported(text) => Some(text),
            Predicate::And(l, r) | Predicate::Or(l, r) => l.unsupported().or_else(|| r.unsupported()),
            Predicate::Not(inner) => inner.unsupported(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// INSERT INTO <table> [(<columns>)] VALUES (<values>)[, ...]
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table: String,
    /// `None` means schema order
    pub columns: Option<Vec<String>>,
    pub values: Vec<Vec<Value>>,
}

/// UPDATE <table> SET <col> = <value>[, ...] [WHERE ...]
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table: String,
    pub assignments: Vec<(String, Value)>,
    pub where_clause: Option<Predicate>,
}

/// DELETE FROM <table> [WHERE ...]
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table: String,
    pub where_clause: Option<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableStmt {
    pub table: String,
    pub if_exists: bool,
}
