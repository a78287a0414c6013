//! The memoization cache and its dependency graph.
//!
//! Nodes live in a `StableDiGraph` with edges pointing from a dependency to
//! its dependents, mirroring the execution DAG. Invalidation walks those
//! edges downstream from every node that read a changed path.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use petgraph::Direction;
use petgraph::algo::has_path_connecting;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use tokio::sync::OnceCell;
use tracing::debug;

use super::node::{ErasedProduct, NodeKey};
use super::types::EngineError;

pub(crate) type NodeResult = Result<ErasedProduct, EngineError>;

/// How much of the filesystem below a tracked path a node observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum PathScope {
  /// The path itself and, for a directory, its direct entries.
  Entry,
  /// Everything at or below the path.
  Subtree,
}

/// One memoized computation. The cell is filled exactly once.
#[derive(Debug)]
pub(crate) struct Node {
  pub(crate) key: NodeKey,
  pub(crate) cell: OnceCell<NodeResult>,
}

#[derive(Default)]
struct CacheState {
  graph: StableDiGraph<Arc<Node>, ()>,
  index: HashMap<NodeKey, NodeIndex>,
  /// Path -> nodes that read it.
  readers: HashMap<(PathBuf, PathScope), HashSet<NodeKey>>,
  /// Node -> paths it read, for cleanup on eviction.
  reads: HashMap<NodeKey, Vec<(PathBuf, PathScope)>>,
}

impl CacheState {
  fn intern(&mut self, key: &NodeKey) -> NodeIndex {
    if let Some(&idx) = self.index.get(key) {
      return idx;
    }
    let node = Arc::new(Node {
      key: key.clone(),
      cell: OnceCell::new(),
    });
    let idx = self.graph.add_node(node);
    self.index.insert(key.clone(), idx);
    idx
  }

  fn evict(&mut self, idx: NodeIndex) {
    let Some(node) = self.graph.remove_node(idx) else {
      return;
    };
    self.index.remove(&node.key);
    for tracked in self.reads.remove(&node.key).unwrap_or_default() {
      if let Some(readers) = self.readers.get_mut(&tracked) {
        readers.remove(&node.key);
        if readers.is_empty() {
          self.readers.remove(&tracked);
        }
      }
    }
  }
}

/// Shared cache of node results keyed by [`NodeKey`].
#[derive(Default)]
pub(crate) struct NodeCache {
  state: Mutex<CacheState>,
}

impl NodeCache {
  /// Look up (or create) the node for `key`, recording that `dependent`
  /// depends on it.
  ///
  /// Fails with `Cycle` when `key` already depends on `dependent`. A
  /// dependent that has been evicted while in flight records no edge.
  pub(crate) fn node_for(&self, key: &NodeKey, dependent: Option<&NodeKey>) -> Result<Arc<Node>, EngineError> {
    let mut state = self.state.lock();
    let idx = state.intern(key);

    if let Some(dependent) = dependent
      && let Some(&dependent_idx) = state.index.get(dependent)
    {
      if dependent_idx == idx || has_path_connecting(&state.graph, dependent_idx, idx, None) {
        return Err(EngineError::Cycle {
          node: dependent.to_string(),
          dependency: key.to_string(),
        });
      }
      state.graph.update_edge(idx, dependent_idx, ());
    }

    Ok(state.graph[idx].clone())
  }

  /// Record that the node for `key` read `path` with the given scope.
  pub(crate) fn track_path(&self, key: &NodeKey, path: PathBuf, scope: PathScope) {
    let mut state = self.state.lock();
    if !state.index.contains_key(key) {
      return;
    }
    let tracked = (path, scope);
    state.readers.entry(tracked.clone()).or_default().insert(key.clone());
    state.reads.entry(key.clone()).or_default().push(tracked);
  }

  /// Evict every node that read one of `changed` and everything downstream.
  ///
  /// A [`PathScope::Entry`] path is affected when it equals a changed
  /// path, is the parent directory of one, or lies below one. A
  /// [`PathScope::Subtree`] path is also affected by any change below it.
  /// Returns the number of evicted nodes.
  pub(crate) fn invalidate(&self, changed: &[PathBuf]) -> usize {
    let mut state = self.state.lock();

    let mut queue: VecDeque<NodeIndex> = VecDeque::new();
    for ((path, scope), readers) in &state.readers {
      if changed.iter().any(|c| affects(c, path, *scope)) {
        queue.extend(readers.iter().filter_map(|key| state.index.get(key).copied()));
      }
    }

    let mut doomed: HashSet<NodeIndex> = HashSet::new();
    while let Some(idx) = queue.pop_front() {
      if !doomed.insert(idx) {
        continue;
      }
      queue.extend(state.graph.neighbors_directed(idx, Direction::Outgoing));
    }

    for &idx in &doomed {
      debug!(node = %state.graph[idx].key, "evicting node");
      state.evict(idx);
    }

    doomed.len()
  }

  /// Drop every node.
  pub(crate) fn clear(&self) -> usize {
    let mut state = self.state.lock();
    let count = state.index.len();
    *state = CacheState::default();
    count
  }

  pub(crate) fn len(&self) -> usize {
    self.state.lock().index.len()
  }

  #[cfg(test)]
  pub(crate) fn contains(&self, key: &NodeKey) -> bool {
    self.state.lock().index.contains_key(key)
  }
}

/// True when a change at `changed` can alter what a reader of `tracked` saw.
fn affects(changed: &Path, tracked: &Path, scope: PathScope) -> bool {
  match scope {
    PathScope::Entry => tracked == changed || changed.parent() == Some(tracked) || tracked.starts_with(changed),
    PathScope::Subtree => changed.starts_with(tracked) || tracked.starts_with(changed),
  }
}
