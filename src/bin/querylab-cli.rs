//! querylab interactive shell
//!
//! Starts with the sample `users` / `posts` tables unless `--empty` is given.
//! Statements end with `;` and may span several lines.

use anyhow::{bail, Context};
use clap::Parser;
use querylab::sql::StatementInterpreter;
use querylab::types::Value;
use querylab::{
    analyze_columns, infer_relations, EngineConfig, ExecutionResult, MutationMode, PredicatePolicy,
    TableStore,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "querylab-cli", version, about = "In-memory SQL playground shell")]
struct Args {
    /// Start without the sample tables
    #[arg(long)]
    empty: bool,

    /// Really apply UPDATE and DELETE instead of simulating them
    #[arg(long)]
    apply_mutations: bool,

    /// Reject WHERE clauses the parser does not understand instead of matching every row
    #[arg(long)]
    strict_predicates: bool,

    /// Print result envelopes as JSON
    #[arg(long)]
    json: bool,

    /// Run one statement and exit
    #[arg(short, long, value_name = "SQL")]
    execute: Option<String>,

    /// Engine settings as a JSON file; flags override it
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Args {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => EngineConfig::default(),
        };
        if self.empty {
            config.seed_sample_data = false;
        }
        if self.apply_mutations {
            config.mutation_mode = MutationMode::Apply;
        }
        if self.strict_predicates {
            config.predicate_policy = PredicatePolicy::Reject;
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = args.engine_config()?;
    let store = TableStore::from_config(&config).context("failed to build the table store")?;
    let interp = StatementInterpreter::new(Arc::new(store), config);

    if let Some(sql) = &args.execute {
        let result = interp.execute(sql);
        print_result(&result, args.json)?;
        if !result.success {
            bail!("statement failed");
        }
        return Ok(());
    }

    interactive_mode(&interp, args.json)
}

fn interactive_mode(interp: &StatementInterpreter, json: bool) -> anyhow::Result<()> {
    println!("querylab v{}", VERSION);
    println!("Type '.help' for help, '.exit' to quit\n");

    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut pending = String::new();

    loop {
        if pending.is_empty() {
            print!("querylab> ");
        } else {
            print!("       -> ");
        }
        io::stdout().flush()?;

        buffer.clear();
        if stdin.lock().read_line(&mut buffer)? == 0 {
            break;
        }
        let input = buffer.trim();

        if input.starts_with('.') && pending.is_empty() {
            match run_command(interp, input) {
                Ok(true) => continue,
                Ok(false) => break,
                Err(err) => {
                    eprintln!("Error: {:#}", err);
                    continue;
                }
            }
        }

        if input.is_empty() {
            continue;
        }

        pending.push_str(input);
        pending.push('\n');

        if input.ends_with(';') {
            let result = interp.execute(&pending);
            print_result(&result, json)?;
            pending.clear();
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Handle a dot-command; `Ok(false)` means quit
fn run_command(interp: &StatementInterpreter, input: &str) -> anyhow::Result<bool> {
    let store = interp.store();
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default();
    let arg = parts.next();

    match (command, arg) {
        (".exit" | ".quit", _) => return Ok(false),
        (".help", _) => print_help(),
        (".tables", _) => {
            let tables = store.list_tables();
            if tables.is_empty() {
                println!("No tables");
            }
            for table in tables {
                println!("  {}", table);
            }
        }
        (".schema", Some(table)) => show_table_schema(store, table)?,
        (".schema", None) => {
            for table in store.list_tables() {
                show_table_schema(store, &table)?;
                println!();
            }
        }
        (".analyze", Some(table)) => show_table_analysis(store, table)?,
        (".analyze", None) => bail!("usage: .analyze <table>"),
        (".relations", _) => {
            let tables = store.list_tables();
            for table in &tables {
                let columns = store.get_schema(table).unwrap_or_default();
                for relation in infer_relations(table, &columns, &tables) {
                    println!("  {}", relation.description);
                }
            }
        }
        _ => bail!("unknown command {} (try .help)", input),
    }
    Ok(true)
}

fn print_help() {
    println!(
        r#"
Commands:
  .help              Show this help
  .exit, .quit       Leave the shell
  .tables            List tables
  .schema [table]    Show column definitions
  .relations         Show primary, unique and foreign keys
  .analyze <table>   Null/distinct counts and detected type per column

Examples:
  SELECT * FROM users WHERE age > 26;
  INSERT INTO users (name, email, age) VALUES ('Ayşe', 'ayse@example.com', 22);
  CREATE TABLE products (id SERIAL PRIMARY KEY, name VARCHAR(100), price DECIMAL);
  DROP TABLE products;
"#
    );
}

fn show_table_schema(store: &TableStore, table: &str) -> anyhow::Result<()> {
    let columns = match store.get_schema(table) {
        Some(columns) => columns,
        None => bail!("table not found: {}", table),
    };

    println!("Table: {}", table);
    let header = vec!["column".to_string(), "type".to_string(), "constraints".to_string()];
    let rows: Vec<Vec<String>> = columns
        .iter()
        .map(|col| {
            let mut constraints = Vec::new();
            if col.primary_key {
                constraints.push("PRIMARY KEY".to_string());
            } else if col.unique {
                constraints.push("UNIQUE".to_string());
            }
            if !col.nullable && !col.primary_key {
                constraints.push("NOT NULL".to_string());
            }
            if let Some(fk) = &col.foreign_key {
                constraints.push(format!("REFERENCES {}", fk));
            }
            vec![col.name.clone(), col.declared_type.to_string(), constraints.join(" ")]
        })
        .collect();
    print_table(&header, &rows);
    Ok(())
}

fn show_table_analysis(store: &TableStore, table: &str) -> anyhow::Result<()> {
    let columns = match store.get_schema(table) {
        Some(columns) => columns,
        None => bail!("table not found: {}", table),
    };
    let rows = store.scan_table(table, None)?;

    let header: Vec<String> = ["column", "declared", "detected", "nulls", "distinct", "samples"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let cells: Vec<Vec<String>> = analyze_columns(&columns, &rows)
        .into_iter()
        .map(|(name, a)| {
            let samples: Vec<String> = a.sample_values.iter().map(display_value).collect();
            vec![
                name,
                a.schema_type,
                a.actual_type.to_string(),
                a.null_count.to_string(),
                a.unique_count.to_string(),
                samples.join(", "),
            ]
        })
        .collect();
    if cells.is_empty() {
        println!("(no rows)");
    } else {
        print_table(&header, &cells);
    }
    Ok(())
}

fn print_result(result: &ExecutionResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if !result.success {
        eprintln!("Error: {}", result.error.as_deref().unwrap_or("unknown error"));
        return Ok(());
    }

    match &result.data {
        Some(rows) if rows.is_empty() => println!("(no rows)"),
        Some(rows) => {
            let header: Vec<String> = rows[0].columns().map(str::to_string).collect();
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|row| row.values().map(display_value).collect())
                .collect();
            print_table(&header, &cells);
            println!("{} row(s) returned", rows.len());
        }
        None => {
            if let Some(message) = &result.message {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

fn display_value(value: &Value) -> String {
    const MAX: usize = 50;
    let text = match value {
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    };
    if text.chars().count() > MAX {
        let cut: String = text.chars().take(MAX - 3).collect();
        format!("{}...", cut)
    } else {
        text
    }
}

fn print_table(header: &[String], rows: &[Vec<String>]) {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let rule = |left: &str, mid: &str, right: &str| {
        let parts: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        println!("{}{}{}", left, parts.join(mid), right);
    };
    let line = |cells: &[String]| {
        let parts: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                let pad = w.saturating_sub(cell.chars().count());
                format!(" {}{} ", cell, " ".repeat(pad))
            })
            .collect();
        println!("│{}│", parts.join("│"));
    };

    rule("┌", "┬", "┐");
    line(header);
    rule("├", "┼", "┤");
    for row in rows {
        line(row);
    }
    rule("└", "┴", "┘");
}
