//! Table storage, sample data and schema annotations

pub mod analysis;
pub mod registry;
pub mod relations;
pub mod row_converter;
pub mod seed;

pub use analysis::{analyze_columns, ColumnAnalysis, DetectedType};
pub use registry::{RowPredicate, TableStore};
pub use relations::{infer_relations, RelationAnnotation, RelationKind, RelationshipType};
pub use seed::seed_sample_data;

use crate::config::EngineConfig;
use crate::error::Result;

impl TableStore {
    /// Store pre-loaded with the `users` / `posts` sample dataset
    pub fn with_sample_data() -> Result<Self> {
        let store = Self::new();
        seed_sample_data(&store)?;
        Ok(store)
    }

    /// Empty or seeded store, as the config asks
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        if config.seed_sample_data {
            Self::with_sample_data()
        } else {
            Ok(Self::new())
        }
    }
}
