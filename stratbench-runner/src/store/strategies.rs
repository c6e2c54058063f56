//! Strategy store with compare-and-set status transitions.
//!
//! The status field is the per-strategy run guard: a backtest starts only by
//! moving `inactive → backtesting` atomically, so two runs for the same
//! strategy cannot both start.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use stratbench_core::strategy::{StrategyDefinition, StrategyStatus};

use super::StoreError;

pub trait StrategyStore: Send + Sync {
    /// Look up a definition by id.
    fn get(&self, id: &str) -> Result<Option<StrategyDefinition>, StoreError>;

    /// Set status to `to` only if it is currently `from`.
    ///
    /// Fails with `StatusConflict` (carrying the actual status) otherwise.
    fn transition_status(
        &self,
        id: &str,
        from: StrategyStatus,
        to: StrategyStatus,
    ) -> Result<(), StoreError>;
}

/// Strategy definitions file: `[[strategy]]` tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyFile {
    #[serde(default)]
    pub strategy: Vec<StrategyDefinition>,
}

impl StrategyFile {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// Mutex-guarded map of definitions.
#[derive(Debug, Default)]
pub struct InMemoryStrategyStore {
    strategies: Mutex<HashMap<String, StrategyDefinition>>,
}

impl InMemoryStrategyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_definitions(definitions: impl IntoIterator<Item = StrategyDefinition>) -> Self {
        let map = definitions
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        Self {
            strategies: Mutex::new(map),
        }
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::from_definitions(StrategyFile::load(path)?.strategy))
    }

    /// Insert or replace a definition.
    pub fn insert(&self, definition: StrategyDefinition) -> Result<(), StoreError> {
        let mut map = self.strategies.lock().map_err(|_| StoreError::Poisoned)?;
        map.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// All definitions, sorted by id.
    pub fn list(&self) -> Result<Vec<StrategyDefinition>, StoreError> {
        let map = self.strategies.lock().map_err(|_| StoreError::Poisoned)?;
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }
}

impl StrategyStore for InMemoryStrategyStore {
    fn get(&self, id: &str) -> Result<Option<StrategyDefinition>, StoreError> {
        let map = self.strategies.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn transition_status(
        &self,
        id: &str,
        from: StrategyStatus,
        to: StrategyStatus,
    ) -> Result<(), StoreError> {
        let mut map = self.strategies.lock().map_err(|_| StoreError::Poisoned)?;
        let def = map
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if def.status != from {
            return Err(StoreError::StatusConflict {
                id: id.to_string(),
                expected: from,
                actual: def.status,
            });
        }
        def.status = to;
        Ok(())
    }
}
