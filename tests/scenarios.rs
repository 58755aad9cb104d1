//! End-to-end playground scenarios and store properties

mod common;

use common::{ints, TestContext};
use querylab::{ErrorKind, TypeTag, Value};

const USERS_DDL: &str = "CREATE TABLE users (
    id SERIAL PRIMARY KEY,
    name VARCHAR(100),
    email VARCHAR(100) UNIQUE,
    age INTEGER
)";

#[test]
fn test_serial_id_and_filtered_select() {
    let ctx = TestContext::empty();
    ctx.exec(USERS_DDL);

    let result = ctx.exec("INSERT INTO users (name, email, age) VALUES ('Ahmet', 'ahmet@example.com', 25)");
    assert_eq!(result.row_count, Some(1));

    let rows = ctx.query("SELECT * FROM users WHERE age > 20");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("id"), Some(&Value::Integer(1)));
    assert_eq!(rows[0].get("name"), Some(&Value::from("Ahmet")));
    assert_eq!(rows[0].columns().collect::<Vec<_>>(), vec!["id", "name", "email", "age"]);
}

#[test]
fn test_create_table_is_listed() {
    let ctx = TestContext::seeded();
    ctx.exec("CREATE TABLE products (id SERIAL PRIMARY KEY, name VARCHAR(100), price DECIMAL);");

    assert!(ctx.store().list_tables().contains(&"products".to_string()));
    let schema = ctx.store().get_schema("products").unwrap();
    assert_eq!(schema.len(), 3);
    assert!(schema[0].primary_key);
    assert_eq!(schema[0].name, "id");
    assert_eq!(schema[2].declared_type, TypeTag::Decimal);
}

#[test]
fn test_duplicate_unique_value_rejected() {
    let ctx = TestContext::empty();
    ctx.exec(USERS_DDL);
    let insert = "INSERT INTO users (name, email, age) VALUES ('Ayse', 'ayse@example.com', 22)";

    ctx.exec(insert);
    let count = ctx.row_count("users");

    let error = ctx.exec_error(insert, ErrorKind::ConstraintViolation);
    assert!(error.contains("email"), "{}", error);
    assert_eq!(ctx.row_count("users"), count);
}

#[test]
fn test_drop_unknown_table() {
    let ctx = TestContext::seeded();
    let error = ctx.exec_error("DROP TABLE nonexistent;", ErrorKind::UnknownTableError);
    assert!(error.contains("nonexistent"));
}

#[test]
fn test_select_by_id_is_exact() {
    let ctx = TestContext::seeded();
    let rows = ctx.query("SELECT name FROM users WHERE id = 1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Ahmet Yılmaz")));
}

#[test]
fn test_create_then_drop_then_select_fails() {
    let ctx = TestContext::empty();
    ctx.exec("CREATE TABLE temp (id INTEGER)");
    ctx.exec("DROP TABLE temp");
    assert!(!ctx.store().list_tables().contains(&"temp".to_string()));
    ctx.exec_error("SELECT * FROM temp", ErrorKind::UnknownTableError);
}

#[test]
fn test_duplicate_table_rejected() {
    let ctx = TestContext::seeded();
    ctx.exec_error("CREATE TABLE users (id INTEGER)", ErrorKind::DuplicateTableError);
}

#[test]
fn test_serial_ids_strictly_increase() {
    let ctx = TestContext::empty();
    ctx.exec(USERS_DDL);

    let mut last = 0;
    for i in 0..5 {
        ctx.exec(&format!("INSERT INTO users (name) VALUES ('user{}')", i));
        let ids = ctx.column("SELECT id FROM users", "id");
        let newest = ids.last().and_then(Value::as_i64).unwrap();
        assert!(newest > last);
        last = newest;
    }
    assert_eq!(ctx.column("SELECT id FROM users", "id"), ints(&[1, 2, 3, 4, 5]));

    // Explicit ids move the counter: next is max + 1
    ctx.exec("INSERT INTO users (id, name) VALUES (10, 'ten')");
    ctx.exec("INSERT INTO users (name) VALUES ('eleven')");
    assert_eq!(
        ctx.column("SELECT id FROM users WHERE name = 'eleven'", "id"),
        ints(&[11])
    );
}

#[test]
fn test_serial_at_integer_limit_fails_cleanly() {
    let ctx = TestContext::empty();
    ctx.exec("CREATE TABLE t (id SERIAL PRIMARY KEY, n INTEGER)");
    ctx.exec("INSERT INTO t (id, n) VALUES (9223372036854775807, 1)");

    let error = ctx.exec_error("INSERT INTO t (n) VALUES (2)", ErrorKind::ConstraintViolation);
    assert!(error.contains("SERIAL exhausted"), "{}", error);
    assert_eq!(ctx.row_count("t"), 1);
}

#[test]
fn test_scans_are_repeatable() {
    let ctx = TestContext::seeded();
    let first = ctx.query("SELECT * FROM posts");
    let second = ctx.query("SELECT * FROM posts");
    assert_eq!(first, second);
}

#[test]
fn test_insert_select_round_trip() {
    let ctx = TestContext::empty();
    ctx.exec("CREATE TABLE items (id INTEGER PRIMARY KEY, label TEXT, weight DECIMAL, active BOOLEAN)");
    ctx.exec("INSERT INTO items (id, label, weight, active) VALUES (7, 'bolt', 2.5, TRUE)");

    let rows = ctx.query("SELECT * FROM items WHERE id = 7");
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.get("label"), Some(&Value::from("bolt")));
    assert_eq!(row.get("weight"), Some(&Value::Decimal(2.5)));
    assert_eq!(row.get("active"), Some(&Value::Boolean(true)));
}

#[test]
fn test_rejected_insert_changes_nothing() {
    let ctx = TestContext::seeded();
    let before = ctx.query("SELECT * FROM users");

    // name is NOT NULL in the sample schema
    ctx.exec_error("INSERT INTO users (email) VALUES ('x@example.com')", ErrorKind::ConstraintViolation);
    ctx.exec_error("INSERT INTO users (nickname) VALUES ('x')", ErrorKind::ColumnMismatchError);
    ctx.exec_error("INSERT INTO users (name, email) VALUES ('x')", ErrorKind::ColumnMismatchError);
    ctx.exec_error("INSERT INTO nowhere (a) VALUES (1)", ErrorKind::UnknownTableError);

    assert_eq!(ctx.query("SELECT * FROM users"), before);
}

#[test]
fn test_multi_row_insert_is_atomic() {
    let ctx = TestContext::seeded();
    ctx.exec_error(
        "INSERT INTO users (name, email) VALUES ('a', 'a@example.com'), ('b', 'ahmet@example.com')",
        ErrorKind::ConstraintViolation,
    );
    assert_eq!(ctx.row_count("users"), 3);

    let result = ctx.exec("INSERT INTO users (name, email) VALUES ('a', 'a@example.com'), ('b', 'b@example.com')");
    assert_eq!(result.row_count, Some(2));
    assert_eq!(ctx.column("SELECT id FROM users", "id"), ints(&[1, 2, 3, 4, 5]));
}

#[test]
fn test_unsupported_and_malformed_statements() {
    let ctx = TestContext::seeded();
    assert_eq!(ctx.exec_error("", ErrorKind::SyntaxError), "unsupported statement");
    assert_eq!(ctx.exec_error("VACUUM", ErrorKind::SyntaxError), "unsupported statement");
    assert_eq!(ctx.exec_error("SELECT * users", ErrorKind::SyntaxError), "missing FROM clause");
    assert_eq!(
        ctx.exec_error("INSERT INTO users (name, age) VALUES ('x', 1, 2)", ErrorKind::ColumnMismatchError),
        "column/value count mismatch"
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    let ctx = TestContext::seeded();
    // Identifiers stay case-sensitive
    ctx.exec_error("select NAME from users where id = 2", ErrorKind::ColumnMismatchError);

    let rows = ctx.query("sElEcT name FrOm users WhErE id = 2;");
    assert_eq!(rows[0].get("name"), Some(&Value::from("Fatma Kaya")));
}

#[test]
fn test_loose_comparisons() {
    let ctx = TestContext::seeded();
    assert_eq!(ctx.column("SELECT id FROM users WHERE age = '30'", "id"), ints(&[2]));
    assert_eq!(ctx.column("SELECT id FROM users WHERE age < 28", "id"), ints(&[1]));
    assert_eq!(
        ctx.column("SELECT id FROM posts WHERE user_id = 1 AND title != 'İlk Postum'", "id"),
        ints(&[2])
    );
}

#[test]
fn test_permissive_predicate_fallback() {
    let ctx = TestContext::seeded();
    let rows = ctx.query("SELECT * FROM users WHERE name LIKE '%a%'");
    assert_eq!(rows.len(), 3);
}

#[test]
fn test_unknown_operator_in_where_matches_all() {
    let ctx = TestContext::seeded();
    assert_eq!(ctx.query("SELECT * FROM users WHERE name ~ 'A'").len(), 3);
    assert_eq!(ctx.query("SELECT id FROM users WHERE age % 2 = 0").len(), 3);

    let strict = TestContext::strict();
    let error = strict.exec_error("SELECT * FROM users WHERE name ~ 'A'", ErrorKind::SyntaxError);
    assert_eq!(error, "unsupported predicate: name ~ 'A'");
}

#[test]
fn test_deeply_nested_where_does_not_abort() {
    let ctx = TestContext::seeded();
    let depth = 100_000;
    let sql = format!(
        "SELECT * FROM users WHERE {}id = 1{}",
        "(".repeat(depth),
        ")".repeat(depth)
    );
    assert_eq!(ctx.query(&sql).len(), 3);

    let strict = TestContext::strict();
    strict.exec_error(&sql, ErrorKind::SyntaxError);
}

#[test]
fn test_strict_predicate_policy() {
    let ctx = TestContext::strict();
    let error = ctx.exec_error("SELECT * FROM users WHERE name LIKE '%a%'", ErrorKind::SyntaxError);
    assert_eq!(error, "unsupported predicate: name LIKE '%a%'");

    // Parsable predicates are unaffected
    assert_eq!(ctx.query("SELECT * FROM users WHERE age >= 28").len(), 2);
}

#[test]
fn test_unlisted_column_types_are_accepted() {
    let ctx = TestContext::empty();
    ctx.exec("CREATE TABLE tokens (id UUID PRIMARY KEY, amount MONEY, raw BYTEA)");
    ctx.exec("INSERT INTO tokens (id, amount, raw) VALUES ('a1b2', '12.50', 'xyz')");

    let schema = ctx.store().get_schema("tokens").unwrap();
    assert_eq!(schema[0].declared_type, TypeTag::Other("UUID".into()));
    assert_eq!(schema[1].declared_type.to_string(), "MONEY");
    assert_eq!(
        ctx.column("SELECT amount FROM tokens WHERE id = 'a1b2'", "amount"),
        vec![Value::from("12.50")]
    );
    ctx.exec_error("INSERT INTO tokens (id) VALUES ('a1b2')", ErrorKind::ConstraintViolation);
}

#[test]
fn test_defaults_and_coercion() {
    let ctx = TestContext::empty();
    ctx.exec(
        "CREATE TABLE events (
            id SERIAL PRIMARY KEY,
            title TEXT NOT NULL,
            happens_on DATE,
            score DECIMAL DEFAULT 1,
            public BOOLEAN DEFAULT FALSE,
            logged_at TIMESTAMP DEFAULT NOW()
        )",
    );
    ctx.exec("INSERT INTO events (title, happens_on) VALUES ('launch', '2024-05-01')");

    let row = &ctx.query("SELECT * FROM events")[0];
    assert!(matches!(row.get("happens_on"), Some(Value::DateTime(_))));
    assert_eq!(row.get("score"), Some(&Value::Decimal(1.0)));
    assert_eq!(row.get("public"), Some(&Value::Boolean(false)));
    assert!(matches!(row.get("logged_at"), Some(Value::DateTime(_))));

    assert_eq!(
        ctx.column("SELECT id FROM events WHERE happens_on > '2024-01-01'", "id"),
        ints(&[1])
    );
    ctx.exec_error("INSERT INTO events (title) VALUES (NULL)", ErrorKind::ConstraintViolation);
}

#[test]
fn test_envelope_json_shape() {
    let ctx = TestContext::seeded();
    let result = ctx.exec("SELECT id, name FROM users WHERE id = 3");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["rowCount"], 1);
    assert_eq!(json["data"][0]["name"], "Mehmet Öz");
    assert!(json.get("error").is_none());

    let result = ctx.exec("CREATE TABLE t (x INT)");
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["rowCount"], 0);
    assert_eq!(json["message"], "Table 't' created");
    assert!(json.get("data").is_none());
}
