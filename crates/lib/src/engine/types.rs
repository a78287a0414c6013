//! Error, configuration and statistics types for the rule engine.

use std::collections::BTreeMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::mapper::MapperError;

/// Errors surfaced by product requests.
///
/// Clonable so one failed node can be handed to every requester that awaits
/// it. Errors raised deep in the graph pass through dependent rules
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
  #[error(transparent)]
  Mapper(#[from] MapperError),

  /// No rule is registered for the requested (product, subject) pair.
  #[error("no rule computes {product} for subject type {subject}")]
  NoRule { product: String, subject: String },

  /// Two rules claim the same (product, subject) pair.
  #[error("rules '{first}' and '{second}' both compute {product} for subject type {subject}")]
  AmbiguousRules {
    product: String,
    subject: String,
    first: String,
    second: String,
  },

  /// A node requested itself, directly or through other nodes.
  #[error("dependency cycle detected: {node} depends on {dependency}, which depends on it")]
  Cycle { node: String, dependency: String },

  /// A rule was invoked with a subject of the wrong type.
  #[error("rule '{rule}' expected a subject of type {expected}")]
  SubjectMismatch { rule: String, expected: String },

  /// Filesystem access failed inside an intrinsic rule.
  #[error("io error at {}: {message}", .path.display())]
  Io { path: PathBuf, message: String },

  /// A spawned sub-request panicked or was aborted.
  #[error("task failed: {0}")]
  TaskFailed(String),

  /// The async runtime could not be started.
  #[error("failed to start runtime: {0}")]
  Runtime(String),

  /// A rule body reported its own failure.
  #[error("rule '{rule}' failed: {message}")]
  Rule { rule: String, message: String },
}

impl EngineError {
  /// Convenience constructor for rule-level failures.
  pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
    EngineError::Rule {
      rule: rule.into(),
      message: message.into(),
    }
  }

  pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
    EngineError::Io {
      path: path.into(),
      message: err.to_string(),
    }
  }

  /// True when the failure means "no such address", as opposed to a
  /// structural problem.
  pub fn is_not_found(&self) -> bool {
    matches!(self, EngineError::Mapper(e) if e.is_not_found())
  }
}

/// Configuration for a [`Scheduler`](super::Scheduler).
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
  /// Number of runtime worker threads.
  pub parallelism: usize,
}

impl Default for SchedulerConfig {
  fn default() -> Self {
    Self {
      parallelism: num_cpus(),
    }
  }
}

/// Get the number of CPUs for default parallelism.
pub(crate) fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}

/// Snapshot of the engine's cache and rule activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulerStats {
  /// Nodes currently memoized.
  pub cached_nodes: usize,
  /// Executions per rule name since the scheduler was created.
  pub rule_runs: BTreeMap<String, usize>,
}

impl SchedulerStats {
  pub fn runs(&self, rule: &str) -> usize {
    self.rule_runs.get(rule).copied().unwrap_or(0)
  }

  pub fn total_runs(&self) -> usize {
    self.rule_runs.values().sum()
  }
}
