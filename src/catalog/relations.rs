//! Descriptive key annotations for schema listings
//!
//! Nothing here is enforced by the store. Foreign keys are guessed from
//! `<name>_id` columns, so false positives and misses are expected.

use crate::types::ColumnDef;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    ForeignKey,
    PrimaryKey,
    UniqueConstraint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipType {
    ManyToOne,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationAnnotation {
    #[serde(rename = "type")]
    pub kind: RelationKind,
    /// `table.column` holding the reference (foreign keys)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Referenced `table.column` (foreign keys)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Annotated `table.column` (primary keys and unique constraints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    pub relationship_type: RelationshipType,
    /// Guessed from the column name rather than declared
    pub inferred: bool,
    pub description: String,
}

/// Table a `<prefix>_id` column probably points at: `user_id` -> `users`
pub fn guess_referenced_table(column: &str) -> Option<String> {
    if column == "id" {
        return None;
    }
    column
        .strip_suffix("_id")
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| format!("{}s", prefix))
}

/// Annotations for one table, in column order
pub fn infer_relations(
    table_name: &str,
    columns: &[ColumnDef],
    all_tables: &[String],
) -> Vec<RelationAnnotation> {
    let mut relations = Vec::new();

    for col in columns {
        let qualified = format!("{}.{}", table_name, col.name);

        if let Some(fk) = &col.foreign_key {
            relations.push(RelationAnnotation {
                kind: RelationKind::ForeignKey,
                from: Some(qualified.clone()),
                to: Some(fk.to_string()),
                column: None,
                relationship_type: RelationshipType::ManyToOne,
                inferred: false,
                description: format!("{} references {}", qualified, fk),
            });
        } else if let Some(target) = guess_referenced_table(&col.name) {
            if all_tables.iter().any(|t| *t == target) {
                relations.push(RelationAnnotation {
                    kind: RelationKind::ForeignKey,
                    from: Some(qualified.clone()),
                    to: Some(format!("{}.id", target)),
                    column: None,
                    relationship_type: RelationshipType::ManyToOne,
                    inferred: true,
                    description: format!("{} probably references {}.id", qualified, target),
                });
            }
        }

        if col.primary_key || col.name == "id" {
            relations.push(RelationAnnotation {
                kind: RelationKind::PrimaryKey,
                from: None,
                to: None,
                column: Some(qualified.clone()),
                relationship_type: RelationshipType::Unique,
                inferred: !col.primary_key,
                description: format!("primary key of {}", table_name),
            });
        } else if col.unique {
            relations.push(RelationAnnotation {
                kind: RelationKind::UniqueConstraint,
                from: None,
                to: None,
                column: Some(qualified.clone()),
                relationship_type: RelationshipType::Unique,
                inferred: false,
                description: format!("{} holds unique values", qualified),
            });
        }
    }

    relations
}
