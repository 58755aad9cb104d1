//! Sample dataset loaded into a fresh playground

use super::TableStore;
use crate::error::Result;
use crate::types::{ColumnDef, ColumnDefault, Row, TableSchema, TypeTag, Value};

pub fn users_schema() -> Result<TableSchema> {
    TableSchema::new(
        "users",
        vec![
            ColumnDef::new("id", TypeTag::Serial).primary_key(),
            ColumnDef::new("name", TypeTag::Varchar(Some(100))).not_null(),
            ColumnDef::new("email", TypeTag::Varchar(Some(100))).unique(),
            ColumnDef::new("age", TypeTag::Integer),
            ColumnDef::new("created_at", TypeTag::Timestamp).default_value(ColumnDefault::Now),
        ],
    )
}

pub fn posts_schema() -> Result<TableSchema> {
    TableSchema::new(
        "posts",
        vec![
            ColumnDef::new("id", TypeTag::Serial).primary_key(),
            ColumnDef::new("user_id", TypeTag::Integer).references("users", "id"),
            ColumnDef::new("title", TypeTag::Varchar(Some(200))).not_null(),
            ColumnDef::new("content", TypeTag::Text),
            ColumnDef::new("created_at", TypeTag::Timestamp).default_value(ColumnDefault::Now),
        ],
    )
}

/// Create `users` and `posts` and fill them with three rows each
pub fn seed_sample_data(store: &TableStore) -> Result<()> {
    store.create_table(users_schema()?)?;
    store.create_table(posts_schema()?)?;

    let users = [
        (1, "Ahmet Yılmaz", "ahmet@example.com", 25),
        (2, "Fatma Kaya", "fatma@example.com", 30),
        (3, "Mehmet Öz", "mehmet@example.com", 28),
    ];
    let user_rows = users
        .iter()
        .map(|(id, name, email, age)| {
            Row::from_iter([
                ("id", Value::Integer(*id)),
                ("name", Value::from(*name)),
                ("email", Value::from(*email)),
                ("age", Value::Integer(*age)),
            ])
        })
        .collect();
    store.insert_rows("users", user_rows)?;

    let posts = [
        (1, 1, "İlk Postum", "Bu benim ilk blog postum."),
        (2, 1, "SQL Öğreniyorum", "PostgreSQL çok güçlü bir veritabanı."),
        (3, 2, "Web Geliştirme", "Next.js ile harika projeler yapabiliyoruz."),
    ];
    let post_rows = posts
        .iter()
        .map(|(id, user_id, title, content)| {
            Row::from_iter([
                ("id", Value::Integer(*id)),
                ("user_id", Value::Integer(*user_id)),
                ("title", Value::from(*title)),
                ("content", Value::from(*content)),
            ])
        })
        .collect();
    store.insert_rows("posts", post_rows)?;

    tracing::debug!("sample data loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed() {
        let store = TableStore::new();
        seed_sample_data(&store).unwrap();
        assert_eq!(store.list_tables(), vec!["users", "posts"]);
        assert_eq!(store.row_count("users").unwrap(), 3);
        assert_eq!(store.row_count("posts").unwrap(), 3);

        let users = store.scan_table("users", None).unwrap();
        assert_eq!(users[2].get("name"), Some(&Value::from("Mehmet Öz")));
        assert!(matches!(users[0].get("created_at"), Some(Value::DateTime(_))));
    }

    #[test]
    fn test_seed_twice_fails() {
        let store = TableStore::new();
        seed_sample_data(&store).unwrap();
        assert!(seed_sample_data(&store).is_err());
    }
}
