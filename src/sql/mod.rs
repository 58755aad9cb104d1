/// Ad-hoc statement interpreter
///
/// Architecture:
/// - Lexer: tokenizes statement text
/// - Parser: builds a `Statement` from tokens
/// - Executor: runs the statement against a `TableStore`
/// - Evaluator: applies WHERE clauses to rows

pub mod token;
pub mod lexer;
pub mod ast;
pub mod parser;
pub mod evaluator;
pub mod executor;
pub mod interpreter;

pub use token::{Token, TokenType};
pub use lexer::Lexer;
pub use ast::{Predicate, Projection, Statement};
pub use parser::{parse_statement, Parser};
pub use evaluator::PredicateEvaluator;
pub use executor::{ExecutionResult, QueryExecutor};
pub use interpreter::StatementInterpreter;

use crate::catalog::TableStore;
use crate::config::EngineConfig;
use crate::error::Result;

/// Parse and execute one statement
pub fn execute_sql(store: &TableStore, config: &EngineConfig, sql: &str) -> Result<ExecutionResult> {
    let statement = parse_statement(sql)?;
    QueryExecutor::new(store, config).execute(statement)
}
