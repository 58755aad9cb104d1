/// Statement parser - converts tokens into a [`Statement`]
use super::ast::*;
use super::lexer::Lexer;
use super::token::{Token, TokenType};
use crate::error::{QueryError, Result};
use crate::types::{ColumnDef, ColumnDefault, TypeTag, Value};

/// Lex and parse one statement
///
/// Text whose first word is not a supported statement keyword is reported as
/// an unsupported statement even when it would not lex.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let tokens = match Lexer::new(sql).tokenize() {
        Ok(tokens) => tokens,
        Err(err) if starts_with_statement_keyword(sql) => return Err(err),
        Err(_) => return Err(QueryError::UnsupportedStatement),
    };
    Parser::new(tokens).parse()
}

fn starts_with_statement_keyword(sql: &str) -> bool {
    let word: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_alphabetic())
        .collect();
    TokenType::from_keyword(&word).map_or(false, |t| t.starts_statement())
}

/// Column definition clause or table-level constraint inside CREATE TABLE
enum TableClause {
    Column(ColumnDef),
    PrimaryKey(Vec<String>),
    Unique(Vec<String>),
    ForeignKey { columns: Vec<String>, table: String, column: String },
    Ignored,
}

/// Deepest parenthesis / NOT nesting accepted in a WHERE clause
const MAX_PREDICATE_DEPTH: usize = 64;

/// Most comparisons accepted in one WHERE clause
const MAX_PREDICATE_TERMS: usize = 256;

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    /// Current nesting while parsing a predicate
    depth: usize,
    /// Comparisons parsed so far in the current predicate
    terms: usize,
}

impl Parser {
    /// `tokens` must end with [`TokenType::Eof`], as [`Lexer::tokenize`] produces
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
            terms: 0,
        }
    }

    /// Parse a single statement; one trailing `;` is allowed
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = match &self.current().token_type {
            TokenType::Select => Statement::Select(self.parse_select()?),
            TokenType::Insert => Statement::Insert(self.parse_insert()?),
            TokenType::Update => Statement::Update(self.parse_update()?),
            TokenType::Delete => Statement::Delete(self.parse_delete()?),
            TokenType::Create => self.parse_create()?,
            TokenType::Drop => self.parse_drop()?,
            _ => return Err(QueryError::UnsupportedStatement),
        };

        self.match_token(TokenType::Semicolon);
        if !self.is_eof() {
            return Err(self.error("unexpected input after statement"));
        }

        Ok(stmt)
    }

    fn parse_select(&mut self) -> Result<SelectStmt> {
        self.expect(TokenType::Select)?;

        let projection = self.parse_projection();

        if !self.match_token(TokenType::From) {
            return Err(QueryError::MissingFrom);
        }
        let table = match &self.current().token_type {
            TokenType::Identifier(name) => name.clone(),
            _ => return Err(QueryError::MissingFrom),
        };
        self.advance();

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_where_clause())
        } else {
            None
        };

        let order_by = if self.match_token(TokenType::Order) {
            self.expect(TokenType::By)?;
            self.parse_order_by()?
        } else {
            Vec::new()
        };

        let limit = if self.match_token(TokenType::Limit) {
            Some(self.parse_usize()?)
        } else {
            None
        };

        let offset = if self.match_token(TokenType::Offset) {
            Some(self.parse_usize()?)
        } else {
            None
        };

        Ok(SelectStmt {
            projection,
            table,
            where_clause,
            order_by,
            limit,
            offset,
        })
    }

    /// Everything up to FROM. Only `*` and plain column lists are understood;
    /// any other shape selects every column.
    fn parse_projection(&mut self) -> Projection {
        let start = self.position;
        let mut depth = 0usize;
        while !self.is_eof() {
            match self.current().token_type {
                TokenType::From if depth == 0 => break,
                TokenType::LParen => depth += 1,
                TokenType::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }

        let items = &self.tokens[start..self.position];
        if items.len() == 1 && items[0].token_type == TokenType::Star {
            return Projection::All;
        }

        let mut columns = Vec::new();
        for (i, token) in items.iter().enumerate() {
            match (&token.token_type, i % 2) {
                (TokenType::Identifier(name), 0) => columns.push(name.clone()),
                (TokenType::Comma, 1) if i + 1 < items.len() => {}
                _ => return Projection::All,
            }
        }

        if columns.is_empty() {
            Projection::All
        } else {
            Projection::Columns(columns)
        }
    }

    /// WHERE body up to ORDER BY / LIMIT / OFFSET / `;` / end of input
    ///
    /// A clause the predicate grammar cannot parse is kept verbatim as
    /// [`Predicate::Unsupported`] so the executor can apply its policy.
    fn parse_where_clause(&mut self) -> Predicate {
        let start = self.position;
        let mut depth = 0usize;
        while !self.is_eof() {
            match self.current().token_type {
                TokenType::Order | TokenType::Limit | TokenType::Offset | TokenType::Semicolon
                    if depth == 0 =>
                {
                    break
                }
                TokenType::LParen => depth += 1,
                TokenType::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }

        let mut clause = self.tokens[start..self.position].to_vec();
        let text = render_tokens(&clause);
        let end = self.current();
        clause.push(Token::new(TokenType::Eof, end.line, end.column));

        let mut sub = Parser::new(clause);
        match sub.parse_or() {
            Ok(predicate) if sub.is_eof() => predicate,
            _ => Predicate::Unsupported(text),
        }
    }

    fn parse_or(&mut self) -> Result<Predicate> {
        let mut left = self.parse_and()?;
        while self.match_token(TokenType::Or) {
            let right = self.parse_and()?;
            left = Predicate::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Predicate> {
        let mut left = self.parse_not()?;
        while self.match_token(TokenType::And) {
            let right = self.parse_not()?;
            left = Predicate::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Predicate> {
        if self.match_token(TokenType::Not) {
            let inner = self.nested(Self::parse_not)?;
            return Ok(Predicate::Not(Box::new(inner)));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Predicate> {
        if self.match_token(TokenType::LParen) {
            let inner = self.nested(Self::parse_or)?;
            self.expect(TokenType::RParen)?;
            return Ok(inner);
        }

        self.terms += 1;
        if self.terms > MAX_PREDICATE_TERMS {
            return Err(self.error("too many conditions in WHERE clause"));
        }

        let column = self.parse_column_ref()?;

        if self.match_token(TokenType::Is) {
            let negated = self.match_token(TokenType::Not);
            self.expect(TokenType::Null)?;
            return Ok(Predicate::IsNull { column, negated });
        }

        let op = match self.current().token_type {
            TokenType::Eq => CompareOp::Eq,
            TokenType::Ne => CompareOp::Ne,
            TokenType::Lt => CompareOp::Lt,
            TokenType::Le => CompareOp::Le,
            TokenType::Gt => CompareOp::Gt,
            TokenType::Ge => CompareOp::Ge,
            _ => return Err(self.error("expected comparison operator")),
        };
        self.advance();

        let value = self.parse_literal()?;
        Ok(Predicate::Compare { column, op, value })
    }

    /// Run a nested predicate rule, bounding recursion depth
    fn nested(&mut self, rule: fn(&mut Self) -> Result<Predicate>) -> Result<Predicate> {
        if self.depth >= MAX_PREDICATE_DEPTH {
            return Err(self.error("WHERE clause nested too deeply"));
        }
        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;
        result
    }

    fn parse_order_by(&mut self) -> Result<Vec<OrderByExpr>> {
        let mut items = Vec::new();
        loop {
            let column = self.parse_column_ref()?;
            let asc = if self.match_token(TokenType::Desc) {
                false
            } else {
                self.match_token(TokenType::Asc);
                true
            };
            items.push(OrderByExpr { column, asc });
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        Ok(items)
    }

    fn parse_insert(&mut self) -> Result<InsertStmt> {
        self.expect(TokenType::Insert)?;
        self.expect(TokenType::Into)?;
        let table = self.parse_table_name()?;

        let columns = if self.current().token_type == TokenType::LParen {
            Some(self.parse_paren_identifier_list()?)
        } else {
            None
        };

        self.expect(TokenType::Values)?;

        let mut values = Vec::new();
        loop {
            self.expect(TokenType::LParen)?;
            let mut tuple = Vec::new();
            loop {
                tuple.push(self.parse_literal()?);
                if !self.match_token(TokenType::Comma) {
                    break;
                }
            }
            self.expect(TokenType::RParen)?;
            values.push(tuple);

            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        if let Some(columns) = &columns {
            if values.iter().any(|tuple| tuple.len() != columns.len()) {
                return Err(QueryError::ColumnCountMismatch);
            }
        }

        Ok(InsertStmt { table, columns, values })
    }

    fn parse_update(&mut self) -> Result<UpdateStmt> {
        self.expect(TokenType::Update)?;
        let table = self.parse_table_name()?;
        self.expect(TokenType::Set)?;

        let mut assignments = Vec::new();
        loop {
            let column = self.parse_column_ref()?;
            self.expect(TokenType::Eq)?;
            let value = self.parse_literal()?;
            assignments.push((column, value));
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_where_clause())
        } else {
            None
        };

        Ok(UpdateStmt { table, assignments, where_clause })
    }

    fn parse_delete(&mut self) -> Result<DeleteStmt> {
        self.expect(TokenType::Delete)?;
        self.expect(TokenType::From)?;
        let table = self.parse_table_name()?;

        let where_clause = if self.match_token(TokenType::Where) {
            Some(self.parse_where_clause())
        } else {
            None
        };

        Ok(DeleteStmt { table, where_clause })
    }

    fn parse_create(&mut self) -> Result<Statement> {
        self.expect(TokenType::Create)?;
        if !self.match_token(TokenType::Table) {
            return Err(QueryError::UnsupportedStatement);
        }

        let table = self.parse_table_name()?;
        self.expect(TokenType::LParen)?;

        let mut clauses = Vec::new();
        let mut current = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.current().clone();
            match token.token_type {
                TokenType::Eof => return Err(self.error("unclosed column list")),
                TokenType::RParen if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenType::Comma if depth == 0 => {
                    clauses.push(std::mem::take(&mut current));
                    self.advance();
                    continue;
                }
                TokenType::LParen => depth += 1,
                TokenType::RParen => depth -= 1,
                _ => {}
            }
            current.push(token);
            self.advance();
        }
        clauses.push(current);

        let mut columns: Vec<ColumnDef> = Vec::new();
        let mut table_constraints = Vec::new();
        for mut clause in clauses {
            let end = self.current();
            clause.push(Token::new(TokenType::Eof, end.line, end.column));
            match Parser::new(clause).parse_table_clause()? {
                TableClause::Column(col) => columns.push(col),
                TableClause::Ignored => {}
                constraint => table_constraints.push(constraint),
            }
        }

        for constraint in table_constraints {
            match constraint {
                TableClause::PrimaryKey(names) => {
                    for name in names {
                        let col = find_column(&mut columns, &table, &name)?;
                        *col = col.clone().primary_key();
                    }
                }
                TableClause::Unique(names) => {
                    for name in names {
                        let col = find_column(&mut columns, &table, &name)?;
                        *col = col.clone().unique();
                    }
                }
                TableClause::ForeignKey { columns: names, table: target, column: target_col } => {
                    for name in names {
                        let col = find_column(&mut columns, &table, &name)?;
                        *col = col.clone().references(target.clone(), target_col.clone());
                    }
                }
                TableClause::Column(_) | TableClause::Ignored => {}
            }
        }

        // Anything after the column list is ignored
        while !self.is_eof() {
            self.advance();
        }

        Ok(Statement::CreateTable(CreateTableStmt { table, columns }))
    }

    fn parse_table_clause(&mut self) -> Result<TableClause> {
        let clause = match self.current().token_type.clone() {
            TokenType::Primary => {
                self.advance();
                self.expect(TokenType::Key)?;
                TableClause::PrimaryKey(self.parse_paren_identifier_list()?)
            }
            TokenType::Unique => {
                self.advance();
                TableClause::Unique(self.parse_paren_identifier_list()?)
            }
            TokenType::Identifier(word) if word.eq_ignore_ascii_case("foreign") => {
                self.advance();
                self.expect(TokenType::Key)?;
                let columns = self.parse_paren_identifier_list()?;
                self.expect(TokenType::References)?;
                let (table, column) = self.parse_reference()?;
                TableClause::ForeignKey { columns, table, column }
            }
            TokenType::Identifier(word)
                if word.eq_ignore_ascii_case("constraint") || word.eq_ignore_ascii_case("check") =>
            {
                TableClause::Ignored
            }
            TokenType::Identifier(_) => TableClause::Column(self.parse_column_def()?),
            TokenType::Eof => return Err(self.error("empty column definition")),
            _ => return Err(self.error("expected column name")),
        };
        Ok(clause)
    }

    /// `<name> [<type>[(n[, m])]] [constraints...]`; unknown trailing words are skipped
    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.parse_identifier()?;

        let declared_type = match self.current().token_type.clone() {
            TokenType::Identifier(type_name) => {
                self.advance();
                let mut args = Vec::new();
                if self.match_token(TokenType::LParen) {
                    loop {
                        args.push(self.parse_usize()?);
                        if !self.match_token(TokenType::Comma) {
                            break;
                        }
                    }
                    self.expect(TokenType::RParen)?;
                }
                TypeTag::from_sql(&type_name, &args)
            }
            _ => TypeTag::Text,
        };

        let mut col = ColumnDef::new(name, declared_type);
        while !self.is_eof() {
            match self.current().token_type {
                TokenType::Primary => {
                    self.advance();
                    if self.match_token(TokenType::Key) {
                        col = col.primary_key();
                    }
                }
                TokenType::Not => {
                    self.advance();
                    if self.match_token(TokenType::Null) {
                        col = col.not_null();
                    }
                }
                TokenType::Unique => {
                    self.advance();
                    col = col.unique();
                }
                TokenType::Default => {
                    self.advance();
                    let default = self.parse_default(&col)?;
                    col = col.default_value(default);
                }
                TokenType::References => {
                    self.advance();
                    let (table, column) = self.parse_reference()?;
                    col = col.references(table, column);
                }
                _ => self.advance(),
            }
        }

        Ok(col)
    }

    fn parse_default(&mut self, col: &ColumnDef) -> Result<ColumnDefault> {
        if let TokenType::Identifier(word) = &self.current().token_type {
            let word = word.to_ascii_uppercase();
            if matches!(word.as_str(), "NOW" | "CURRENT_TIMESTAMP" | "CURRENT_DATE") {
                self.advance();
                if self.match_token(TokenType::LParen) {
                    self.expect(TokenType::RParen)?;
                }
                return Ok(ColumnDefault::Now);
            }
        }
        let literal = self.parse_literal()?;
        Ok(ColumnDefault::Literal(col.declared_type.coerce(&col.name, literal)?))
    }

    /// `table[(column)]`; the column defaults to `id`
    fn parse_reference(&mut self) -> Result<(String, String)> {
        let table = self.parse_identifier()?;
        let column = if self.match_token(TokenType::LParen) {
            let column = self.parse_identifier()?;
            self.expect(TokenType::RParen)?;
            column
        } else {
            "id".to_string()
        };
        Ok((table, column))
    }

    fn parse_drop(&mut self) -> Result<Statement> {
        self.expect(TokenType::Drop)?;
        if !self.match_token(TokenType::Table) {
            return Err(QueryError::UnsupportedStatement);
        }

        let if_exists = if self.match_token(TokenType::If) {
            self.expect(TokenType::Exists)?;
            true
        } else {
            false
        };

        let table = self.parse_table_name()?;
        Ok(Statement::DropTable(DropTableStmt { table, if_exists }))
    }

    // Helper methods

    fn parse_literal(&mut self) -> Result<Value> {
        let value = match self.current().token_type.clone() {
            TokenType::String(s) => Value::Text(s),
            TokenType::Number(n) => self.number(&n)?,
            TokenType::Minus => {
                self.advance();
                match self.current().token_type.clone() {
                    TokenType::Number(n) => self.number(&format!("-{}", n))?,
                    _ => return Err(self.error("expected number after '-'")),
                }
            }
            TokenType::True => Value::Boolean(true),
            TokenType::False => Value::Boolean(false),
            TokenType::Null => Value::Null,
            _ => return Err(self.error("expected a value")),
        };
        self.advance();
        Ok(value)
    }

    fn number(&self, text: &str) -> Result<Value> {
        Value::from_number_text(text).ok_or_else(|| self.error(&format!("invalid number '{}'", text)))
    }

    /// `column` or `table.column`; the qualifier is dropped
    fn parse_column_ref(&mut self) -> Result<String> {
        let name = self.parse_identifier()?;
        if self.match_token(TokenType::Dot) {
            return self.parse_identifier();
        }
        Ok(name)
    }

    fn parse_table_name(&mut self) -> Result<String> {
        if let TokenType::Identifier(name) = &self.current().token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("expected table name"))
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        if let TokenType::Identifier(name) = &self.current().token_type {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error("expected identifier"))
        }
    }

    fn parse_paren_identifier_list(&mut self) -> Result<Vec<String>> {
        self.expect(TokenType::LParen)?;
        let mut list = Vec::new();
        loop {
            list.push(self.parse_identifier()?);
            if !self.match_token(TokenType::Comma) {
                break;
            }
        }
        self.expect(TokenType::RParen)?;
        Ok(list)
    }

    fn parse_usize(&mut self) -> Result<usize> {
        if let TokenType::Number(n) = &self.current().token_type {
            let parsed = n
                .parse::<usize>()
                .map_err(|_| self.error("expected non-negative integer"))?;
            self.advance();
            Ok(parsed)
        } else {
            Err(self.error("expected number"))
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.position]
    }

    fn is_eof(&self) -> bool {
        matches!(self.current().token_type, TokenType::Eof)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() - 1 {
            self.position += 1;
        }
    }

    fn match_token(&mut self, token_type: TokenType) -> bool {
        if std::mem::discriminant(&self.current().token_type) == std::mem::discriminant(&token_type) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token_type: TokenType) -> Result<()> {
        if self.match_token(token_type.clone()) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", token_type)))
        }
    }

    fn error(&self, msg: &str) -> QueryError {
        let token = self.current();
        let found = match &token.token_type {
            TokenType::Eof => "end of input".to_string(),
            other => format!("'{}'", other),
        };
        QueryError::Syntax(format!(
            "{}, found {} at line {} column {}",
            msg, found, token.line, token.column
        ))
    }
}

fn find_column<'a>(columns: &'a mut [ColumnDef], table: &str, name: &str) -> Result<&'a mut ColumnDef> {
    columns
        .iter_mut()
        .find(|c| c.name == name)
        .ok_or_else(|| QueryError::ColumnNotFound {
            table: table.to_string(),
            column: name.to_string(),
        })
}

/// Tokens back to readable SQL for error messages
fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&TokenType> = None;
    for token in tokens {
        let tight = matches!(prev, Some(TokenType::LParen))
            || matches!(token.token_type, TokenType::RParen | TokenType::Comma);
        if prev.is_some() && !tight {
            out.push(' ');
        }
        out.push_str(&token.token_type.to_string());
        prev = Some(&token.token_type);
    }
    out
}
