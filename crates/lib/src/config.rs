//! Project configuration read from `buildgraph.toml` at the build root.
//!
//! ```toml
//! build_patterns = ["BUILD.json", "*.BUILD.json"]
//! ignore_patterns = [".git", "target"]
//! types = ["target", "struct"]
//! parallelism = 4
//! ```
//!
//! Every key is optional. An empty `types` list makes every type alias
//! addressable; `parallelism = 0` uses one worker per CPU.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CONFIG_FILENAME, DEFAULT_BUILD_PATTERNS, DEFAULT_IGNORE_PATTERNS};
use crate::engine::{EngineError, SchedulerConfig};
use crate::fs::{BuildPatterns, FsProjectTree, PatternError};
use crate::mapper::{AddressMapper, MapperConfig};
use crate::parser::{JsonParser, SymbolTable, TypeTable};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}", .0.display())]
  Io(PathBuf, #[source] std::io::Error),

  #[error("invalid config file {}: {}", .0.display(), .1)]
  Toml(PathBuf, #[source] toml::de::Error),

  #[error(transparent)]
  Pattern(#[from] PatternError),

  #[error(transparent)]
  Engine(#[from] EngineError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
  /// Globs naming declaration files.
  pub build_patterns: Vec<String>,
  /// Directory names never descended into.
  pub ignore_patterns: Vec<String>,
  /// Addressable type aliases; empty accepts every alias.
  pub types: Vec<String>,
  /// Worker threads; 0 means one per CPU.
  pub parallelism: usize,
}

impl Default for GraphConfig {
  fn default() -> Self {
    Self {
      build_patterns: DEFAULT_BUILD_PATTERNS.iter().map(|s| s.to_string()).collect(),
      ignore_patterns: DEFAULT_IGNORE_PATTERNS.iter().map(|s| s.to_string()).collect(),
      types: Vec::new(),
      parallelism: 0,
    }
  }
}

impl GraphConfig {
  pub fn from_toml(path: &Path, content: &str) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Toml(path.to_path_buf(), e))
  }

  /// Load `buildgraph.toml` from `root`, or the defaults when it is absent.
  pub fn load(root: &Path) -> Result<Self, ConfigError> {
    let path = root.join(CONFIG_FILENAME);
    if !path.exists() {
      debug!(path = %path.display(), "no config file, using defaults");
      return Ok(Self::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
    let config = Self::from_toml(&path, &content)?;
    debug!(path = %path.display(), ?config, "loaded config");
    Ok(config)
  }

  pub fn patterns(&self) -> Result<BuildPatterns, PatternError> {
    BuildPatterns::new(&self.build_patterns, &self.ignore_patterns)
  }

  pub fn symbol_table(&self) -> TypeTable {
    if self.types.is_empty() {
      TypeTable::permissive()
    } else {
      TypeTable::new(self.types.iter().cloned())
    }
  }

  pub fn scheduler_config(&self) -> SchedulerConfig {
    match self.parallelism {
      0 => SchedulerConfig::default(),
      n => SchedulerConfig { parallelism: n },
    }
  }

  /// An [`AddressMapper`] over the files below `root`, parsing JSON
  /// declaration files.
  pub fn mapper(&self, root: &Path) -> Result<AddressMapper, ConfigError> {
    let symbols: Arc<dyn SymbolTable> = Arc::new(self.symbol_table());
    let config = MapperConfig::new(Arc::new(JsonParser::new(symbols)), self.patterns()?);
    let tree = Arc::new(FsProjectTree::new(root));
    Ok(AddressMapper::new(tree, config, &self.scheduler_config())?)
  }
}
