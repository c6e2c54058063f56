//! Runner configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! source = "csv"        # or "synthetic"
//! dir = "data"
//!
//! [store]
//! strategies = "strategies.toml"
//! results = "results/backtests.jsonl"
//!
//! [export]
//! dir = "exports"       # optional
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data_source::{BarSource, CsvBarSource, SyntheticBarSource};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    #[default]
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    #[serde(default)]
    pub source: DataSourceKind,
    /// Directory of `<SYMBOL>.csv` files. Ignored for synthetic data.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DataSourceKind::default(),
            dir: default_data_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default = "default_strategies_path")]
    pub strategies: PathBuf,
    #[serde(default = "default_results_path")]
    pub results: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies_path(),
            results: default_results_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// When set, each completed run also writes trades and equity CSVs here.
    pub dir: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_strategies_path() -> PathBuf {
    PathBuf::from("strategies.toml")
}

fn default_results_path() -> PathBuf {
    PathBuf::from("results/backtests.jsonl")
}

impl RunnerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a config file. Relative paths inside it resolve against the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        resolve(&mut self.data.dir);
        resolve(&mut self.store.strategies);
        resolve(&mut self.store.results);
        if let Some(dir) = self.export.dir.as_mut() {
            resolve(dir);
        }
    }

    /// Bar source selected by `[data] source`.
    pub fn bar_source(&self) -> Box<dyn BarSource> {
        match self.data.source {
            DataSourceKind::Csv => Box::new(CsvBarSource::new(self.data.dir.clone())),
            DataSourceKind::Synthetic => Box::new(SyntheticBarSource),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = RunnerConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunnerConfig::default());
        assert_eq!(config.data.source, DataSourceKind::Csv);
        assert_eq!(config.store.results, PathBuf::from("results/backtests.jsonl"));
        assert!(config.export.dir.is_none());
    }

    #[test]
    fn full_config_parses() {
        let config = RunnerConfig::from_toml_str(
            r#"
            [data]
            source = "synthetic"

            [store]
            strategies = "s.toml"
            results = "out/r.jsonl"

            [export]
            dir = "exports"
            "#,
        )
        .unwrap();
        assert_eq!(config.data.source, DataSourceKind::Synthetic);
        assert_eq!(config.store.strategies, PathBuf::from("s.toml"));
        assert_eq!(config.export.dir, Some(PathBuf::from("exports")));
        assert_eq!(config.bar_source().name(), "synthetic");
    }

    #[test]
    fn unknown_source_rejected() {
        let err = RunnerConfig::from_toml_str("[data]\nsource = \"yahoo\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(RunnerConfig::from_toml_str("[store]\nresult = \"x\"\n").is_err());
    }

    #[test]
    fn load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner.toml");
        std::fs::write(&path, "[data]\ndir = \"bars\"\n[store]\nresults = \"/abs/r.jsonl\"\n").unwrap();

        let config = RunnerConfig::load(&path).unwrap();
        assert_eq!(config.data.dir, dir.path().join("bars"));
        assert_eq!(config.store.results, PathBuf::from("/abs/r.jsonl"));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = RunnerConfig::load(Path::new("/nonexistent/runner.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
