/// Token types for the statement lexer
use phf::phf_map;
use std::fmt;

// Only structural words are reserved. Type names (INTEGER, VARCHAR, ...) and
// NOW stay identifiers and are resolved where they are used.
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "select" => TokenType::Select,
    "from" => TokenType::From,
    "where" => TokenType::Where,
    "insert" => TokenType::Insert,
    "into" => TokenType::Into,
    "values" => TokenType::Values,
    "update" => TokenType::Update,
    "set" => TokenType::Set,
    "delete" => TokenType::Delete,
    "create" => TokenType::Create,
    "table" => TokenType::Table,
    "drop" => TokenType::Drop,
    "if" => TokenType::If,
    "exists" => TokenType::Exists,
    "and" => TokenType::And,
    "or" => TokenType::Or,
    "not" => TokenType::Not,
    "is" => TokenType::Is,
    "null" => TokenType::Null,
    "order" => TokenType::Order,
    "by" => TokenType::By,
    "asc" => TokenType::Asc,
    "desc" => TokenType::Desc,
    "limit" => TokenType::Limit,
    "offset" => TokenType::Offset,
    "primary" => TokenType::Primary,
    "key" => TokenType::Key,
    "unique" => TokenType::Unique,
    "default" => TokenType::Default,
    "references" => TokenType::References,
    "true" => TokenType::True,
    "false" => TokenType::False,
};

#[derive(Debug, Clone, PartialEq)]
pub enum TokenType {
    // Keywords
    Select,
    From,
    Where,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Table,
    Drop,
    If,
    Exists,
    And,
    Or,
    Not,
    Is,
    Null,
    Order,
    By,
    Asc,
    Desc,
    Limit,
    Offset,
    Primary,
    Key,
    Unique,
    Default,
    References,
    True,
    False,

    // Operators
    Eq,           // =
    Ne,           // != or <>
    Lt,           // <
    Gt,           // >
    Le,           // <=
    Ge,           // >=
    Minus,        // -
    Star,         // *

    // Delimiters
    LParen,       // (
    RParen,       // )
    Comma,        // ,
    Semicolon,    // ;
    Dot,          // .

    // Literals
    /// Number exactly as written; the parser decides integer or decimal
    Number(String),
    String(String),
    Identifier(String),

    // Special
    /// Character with no meaning in the grammar, such as `~` or `%`
    Unknown(char),
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, line: usize, column: usize) -> Self {
        Self { token_type, line, column }
    }
}

impl TokenType {
    /// Keyword lookup, case-insensitive
    pub fn from_keyword(s: &str) -> Option<Self> {
        let lowercase = s.to_lowercase();
        KEYWORDS.get(lowercase.as_str()).cloned()
    }

    /// Leading keywords that start a supported statement
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenType::Select
                | TokenType::Insert
                | TokenType::Update
                | TokenType::Delete
                | TokenType::Create
                | TokenType::Drop
        )
    }
}

/// Renders the token back as SQL text, used when echoing an unparsed predicate
impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenType::Number(n) => return write!(f, "{}", n),
            TokenType::String(s) => return write!(f, "'{}'", s),
            TokenType::Identifier(s) => return write!(f, "{}", s),
            TokenType::Unknown(c) => return write!(f, "{}", c),
            TokenType::Select => "SELECT",
            TokenType::From => "FROM",
            TokenType::Where => "WHERE",
            TokenType::Insert => "INSERT",
            TokenType::Into => "INTO",
            TokenType::Values => "VALUES",
            TokenType::Update => "UPDATE",
            TokenType::Set => "SET",
            TokenType::Delete => "DELETE",
            TokenType::Create => "CREATE",
            TokenType::Table => "TABLE",
            TokenType::Drop => "DROP",
            TokenType::If => "IF",
            TokenType::Exists => "EXISTS",
            TokenType::And => "AND",
            TokenType::Or => "OR",
            TokenType::Not => "NOT",
            TokenType::Is => "IS",
            TokenType::Null => "NULL",
            TokenType::Order => "ORDER",
            TokenType::By => "BY",
            TokenType::Asc => "ASC",
            TokenType::Desc => "DESC",
            TokenType::Limit => "LIMIT",
            TokenType::Offset => "OFFSET",
            TokenType::Primary => "PRIMARY",
            TokenType::Key => "KEY",
            TokenType::Unique => "UNIQUE",
            TokenType::Default => "DEFAULT",
            TokenType::References => "REFERENCES",
            TokenType::True => "TRUE",
            TokenType::False => "FALSE",
            TokenType::Eq => "=",
            TokenType::Ne => "!=",
            TokenType::Lt => "<",
            TokenType::Gt => ">",
            TokenType::Le => "<=",
            TokenType::Ge => ">=",
            TokenType::Minus => "-",
            TokenType::Star => "*",
            TokenType::LParen => "(",
            TokenType::RParen => ")",
            TokenType::Comma => ",",
            TokenType::Semicolon => ";",
            TokenType::Dot => ".",
            TokenType::Eof => "",
        };
        f.write_str(text)
    }
}
