//! Engine configuration
//!
//! Switches the behaviors where the playground deliberately stays lenient
//! (unparseable WHERE clauses, simulated UPDATE/DELETE) and controls how the
//! store is seeded.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a WHERE clause the grammar cannot understand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PredicatePolicy {
    /// Treat the clause as always true (every row matches)
    #[default]
    MatchAll,
    /// Fail the statement with a syntax error
    Reject,
}

/// How UPDATE and DELETE statements are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MutationMode {
    /// Acknowledge the statement with `rowCount: 1` and leave the store untouched
    #[default]
    Simulated,
    /// Evaluate the WHERE clause and really modify matching rows
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub predicate_policy: PredicatePolicy,

    pub mutation_mode: MutationMode,

    /// Populate `users` and `posts` when the store is built
    pub seed_sample_data: bool,

    /// Number of rows included as `sampleData` in schema listings
    pub sample_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            predicate_policy: PredicatePolicy::MatchAll,
            mutation_mode: MutationMode::Simulated,
            seed_sample_data: true,
            sample_rows: 3,
        }
    }
}

impl EngineConfig {
    /// Config for an empty store with default policies
    pub fn empty() -> Self {
        Self {
            seed_sample_data: false,
            ..Default::default()
        }
    }

    pub fn with_predicate_policy(mut self, policy: PredicatePolicy) -> Self {
        self.predicate_policy = policy;
        self
    }

    pub fn with_mutation_mode(mut self, mode: MutationMode) -> Self {
        self.mutation_mode = mode;
        self
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            crate::QueryError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }
}
