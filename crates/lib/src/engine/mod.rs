//! The rule engine.
//!
//! Rules are async functions from a subject to a product. A product request
//! asks for one product type for a list of root subjects; the engine finds the
//! rule registered for each `(product, subject)` pair and runs it, and every
//! sub-request the rule makes through its [`Context`] becomes another node.
//!
//! Each node is computed at most once and memoized until a filesystem change
//! invalidates it:
//!
//! ```text
//! Specs ─► BuildFileAddresses ─► AddressFamily(a/b) ─► BuildFiles(a/b) ─► DirectoryListing(a/b)
//!                                                    └► FileContent(a/b/BUILD.json)
//! ```
//!
//! Invalidating `a/b/BUILD.json` evicts `FileContent` and `DirectoryListing`
//! (the file's directory) and walks the dependency edges downstream, so the
//! family and every aggregate over it are recomputed on the next request
//! while unrelated namespaces stay cached.

mod cache;
mod context;
mod node;
mod rules;
mod types;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::runtime::Runtime;
use tracing::{debug, info, trace};

use cache::{NodeCache, NodeResult};

pub use context::Context;
pub use node::{NodeKey, Product, Subject};
pub use rules::{Rule, RuleSet};
pub use types::{EngineError, SchedulerConfig, SchedulerStats};

use rules::RuleIndex;

/// State shared by every context of one scheduler.
pub(crate) struct Core {
  rules: RuleIndex,
  cache: NodeCache,
  runs: Mutex<HashMap<&'static str, usize>>,
}

impl Core {
  fn new(rules: RuleIndex) -> Self {
    Self {
      rules,
      cache: NodeCache::default(),
      runs: Mutex::new(HashMap::new()),
    }
  }

  /// Return the memoized result for `key`, computing it if needed.
  ///
  /// Concurrent requesters of the same key share one computation.
  async fn get_node(self: &Arc<Self>, key: NodeKey, dependent: Option<&NodeKey>) -> NodeResult {
    let node = self.cache.node_for(&key, dependent)?;

    if let Some(result) = node.cell.get() {
      trace!(node = %key, "cache hit");
      return result.clone();
    }

    node.cell.get_or_init(|| self.clone().compute(key)).await.clone()
  }

  async fn compute(self: Arc<Self>, key: NodeKey) -> NodeResult {
    let Some(rule) = self.rules.get(key.product(), key.subject_type()).cloned() else {
      return Err(EngineError::NoRule {
        product: key.product_name().to_string(),
        subject: key.subject_name().to_string(),
      });
    };

    *self.runs.lock().entry(rule.name()).or_default() += 1;
    debug!(node = %key, rule = rule.name(), "running rule");

    let ctx = Context::new(self.clone(), Some(key.clone()));
    let result = rule.run(ctx, key.subject().clone()).await;

    if let Err(e) = &result {
      debug!(node = %key, rule = rule.name(), error = %e, "rule failed");
    }
    result
  }

  fn stats(&self) -> SchedulerStats {
    SchedulerStats {
      cached_nodes: self.cache.len(),
      rule_runs: self
        .runs
        .lock()
        .iter()
        .map(|(name, count)| (name.to_string(), *count))
        .collect(),
    }
  }
}

/// Async handle to a scheduler's rules and cache.
///
/// Cheap to clone; use it from code that already runs inside a tokio
/// runtime.
#[derive(Clone)]
pub struct Engine {
  core: Arc<Core>,
}

impl Engine {
  /// Compute `P` for each root subject, in order.
  ///
  /// Root subjects run concurrently. Fails with the first error in subject
  /// order.
  pub async fn request<P: Product, S: Subject>(&self, subjects: Vec<S>) -> Result<Vec<Arc<P>>, EngineError> {
    let started = Instant::now();
    let count = subjects.len();
    let root = Context::new(self.core.clone(), None);
    let result = root.get_all::<P, S, _>(subjects).await;

    info!(
      product = node::short_type_name::<P>(),
      subjects = count,
      ok = result.is_ok(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "product request complete"
    );
    result
  }

  /// Evict nodes affected by changes at `paths` (relative to the build
  /// root). Returns the number of evicted nodes.
  pub fn invalidate_files<I, T>(&self, paths: I) -> usize
  where
    I: IntoIterator<Item = T>,
    T: Into<PathBuf>,
  {
    let paths: Vec<PathBuf> = paths.into_iter().map(Into::into).collect();
    let evicted = self.core.cache.invalidate(&paths);
    info!(paths = paths.len(), evicted, "invalidated files");
    evicted
  }

  /// Evict every node.
  pub fn invalidate_all(&self) -> usize {
    let evicted = self.core.cache.clear();
    info!(evicted, "invalidated all nodes");
    evicted
  }

  pub fn stats(&self) -> SchedulerStats {
    self.core.stats()
  }
}

/// Owns the rule registry, the node cache and the runtime that drives rules.
///
/// [`Scheduler::product_request`] blocks the calling thread; it must not be
/// called from inside an async context. Async callers use [`Scheduler::engine`].
pub struct Scheduler {
  engine: Engine,
  runtime: Runtime,
}

impl Scheduler {
  /// Index `rules` and start the worker runtime.
  ///
  /// # Errors
  ///
  /// `AmbiguousRules` if two rules compute the same product from the same
  /// subject type; `Runtime` if the worker threads cannot be started.
  pub fn new(rules: RuleSet, config: &SchedulerConfig) -> Result<Self, EngineError> {
    let index = RuleIndex::build(rules)?;
    let parallelism = config.parallelism.max(1);

    let runtime = tokio::runtime::Builder::new_multi_thread()
      .worker_threads(parallelism)
      .thread_name("buildgraph-worker")
      .enable_all()
      .build()
      .map_err(|e| EngineError::Runtime(e.to_string()))?;

    info!(rules = index.len(), parallelism, "scheduler ready");

    Ok(Self {
      engine: Engine {
        core: Arc::new(Core::new(index)),
      },
      runtime,
    })
  }

  /// Compute `P` for each root subject, blocking until done.
  pub fn product_request<P: Product, S: Subject>(&self, subjects: Vec<S>) -> Result<Vec<Arc<P>>, EngineError> {
    self.runtime.block_on(self.engine.request::<P, S>(subjects))
  }

  /// Compute `P` for a single subject.
  pub fn product<P: Product, S: Subject>(&self, subject: S) -> Result<Arc<P>, EngineError> {
    let mut products = self.product_request::<P, S>(vec![subject])?;
    products
      .pop()
      .ok_or_else(|| EngineError::TaskFailed("product request returned no result".to_string()))
  }

  pub fn engine(&self) -> Engine {
    self.engine.clone()
  }

  pub fn invalidate_files<I, T>(&self, paths: I) -> usize
  where
    I: IntoIterator<Item = T>,
    T: Into<PathBuf>,
  {
    self.engine.invalidate_files(paths)
  }

  pub fn invalidate_all(&self) -> usize {
    self.engine.invalidate_all()
  }

  pub fn stats(&self) -> SchedulerStats {
    self.engine.stats()
  }

  /// Number of times the named rule has run.
  pub fn rule_runs(&self, rule: &str) -> usize {
    self.stats().runs(rule)
  }
}
