/// Statement interpreter - text in, [`ExecutionResult`] out
use super::executor::ExecutionResult;
use super::execute_sql;
use crate::catalog::TableStore;
use crate::config::EngineConfig;
use crate::error::Result;
use std::sync::Arc;

/// Runs free-form statements against a shared [`TableStore`]
///
/// Every failure comes back as an envelope with `success: false`; nothing
/// escapes to the caller as an error.
#[derive(Debug, Clone)]
pub struct StatementInterpreter {
    store: Arc<TableStore>,
    config: EngineConfig,
}

impl StatementInterpreter {
    pub fn new(store: Arc<TableStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Interpreter over a store built as `config` asks (seeded by default)
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let store = TableStore::from_config(&config)?;
        Ok(Self::new(Arc::new(store), config))
    }

    pub fn store(&self) -> &Arc<TableStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn execute(&self, sql: &str) -> ExecutionResult {
        match execute_sql(&self.store, &self.config, sql) {
            Ok(result) => result,
            Err(err) => {
                tracing::debug!(error = %err, "statement failed");
                ExecutionResult::failure(&err)
            }
        }
    }
}
