//! The address space: declaration files parsed into maps, merged into
//! per-namespace families, and queried through [`AddressMapper`].

mod family;
mod map;
mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

pub use family::AddressFamily;
pub use map::AddressMap;
pub use types::MapperError;

use crate::address::{Address, normalize_namespace};
use crate::engine::{EngineError, RuleSet, Scheduler, SchedulerConfig};
use crate::fs::{BuildPatterns, Dir, ProjectTree, create_fs_rules};
use crate::graph::{BuildFileAddresses, UnhydratedStruct, UnhydratedStructs, create_graph_rules};
use crate::objects::Struct;
use crate::parser::Parser;
use crate::specs::Specs;

/// How declaration files are found and parsed.
#[derive(Clone)]
pub struct MapperConfig {
  pub parser: Arc<dyn Parser>,
  pub patterns: Arc<BuildPatterns>,
}

impl MapperConfig {
  pub fn new(parser: Arc<dyn Parser>, patterns: BuildPatterns) -> Self {
    Self {
      parser,
      patterns: Arc::new(patterns),
    }
  }
}

impl fmt::Debug for MapperConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MapperConfig")
      .field("parser", &self.parser)
      .field("build_patterns", &self.patterns.build_patterns().collect::<Vec<_>>())
      .field("ignore_patterns", &self.patterns.ignore_patterns().collect::<Vec<_>>())
      .finish()
  }
}

/// Resolves specs against the declaration files of one project tree.
///
/// Every query is a product request on the owned [`Scheduler`], so families
/// are parsed once and reused until [`AddressMapper::invalidate`] reports a
/// change under their directory.
pub struct AddressMapper {
  scheduler: Scheduler,
  tree: Arc<dyn ProjectTree>,
  absolute_root: PathBuf,
  config: Arc<MapperConfig>,
}

impl AddressMapper {
  pub fn new(
    tree: Arc<dyn ProjectTree>,
    config: MapperConfig,
    scheduler_config: &SchedulerConfig,
  ) -> Result<Self, EngineError> {
    Self::with_rules(tree, config, scheduler_config, RuleSet::new())
  }

  /// Like [`AddressMapper::new`], registering `rules` next to the
  /// filesystem and address-space rules.
  pub fn with_rules(
    tree: Arc<dyn ProjectTree>,
    config: MapperConfig,
    scheduler_config: &SchedulerConfig,
    rules: RuleSet,
  ) -> Result<Self, EngineError> {
    let config = Arc::new(config);
    let all_rules = create_fs_rules(tree.clone(), config.patterns.clone())
      .extend(create_graph_rules(config.clone()))
      .extend(rules);
    let scheduler = Scheduler::new(all_rules, scheduler_config)?;
    let absolute_root = std::path::absolute(tree.build_root()).unwrap_or_else(|_| tree.build_root().to_path_buf());

    Ok(Self {
      scheduler,
      tree,
      absolute_root,
      config,
    })
  }

  /// The family of `namespace`; empty when the directory declares nothing.
  pub fn address_family_for(&self, namespace: &str) -> Result<Arc<AddressFamily>, EngineError> {
    let namespace = normalize_namespace(namespace, namespace).map_err(MapperError::from)?;
    self.scheduler.product::<AddressFamily, _>(Dir(namespace))
  }

  /// Every address `specs` resolves to.
  pub fn resolve(&self, specs: impl Into<Specs>) -> Result<BTreeSet<Address>, EngineError> {
    let addresses = self.scheduler.product::<BuildFileAddresses, _>(specs.into())?;
    Ok(addresses.0.iter().cloned().collect())
  }

  /// The objects `specs` resolve to, keyed by address.
  pub fn resolve_objects(&self, specs: impl Into<Specs>) -> Result<BTreeMap<Address, Struct>, EngineError> {
    Ok(
      self
        .unhydrated_structs(specs)?
        .into_iter()
        .map(|s| (s.address, s.object))
        .collect(),
    )
  }

  /// Resolved objects with their declaring files, in resolution order.
  pub fn unhydrated_structs(&self, specs: impl Into<Specs>) -> Result<Vec<UnhydratedStruct>, EngineError> {
    let structs = self.scheduler.product::<UnhydratedStructs, _>(specs.into())?;
    Ok(structs.0.clone())
  }

  /// Report changed files or directories.
  ///
  /// Paths may be relative to the build root or absolute. Paths outside the
  /// build root (absolute or through `..`) and paths inside ignored
  /// directories are skipped. Returns the number of evicted nodes.
  pub fn invalidate<I, P>(&self, paths: I) -> usize
  where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
  {
    let relative: Vec<PathBuf> = paths
      .into_iter()
      .filter_map(|p| self.relativize(p.as_ref()))
      .collect();
    if relative.is_empty() {
      return 0;
    }
    self.scheduler.invalidate_files(relative)
  }

  pub fn invalidate_all(&self) -> usize {
    self.scheduler.invalidate_all()
  }

  pub fn scheduler(&self) -> &Scheduler {
    &self.scheduler
  }

  pub fn build_root(&self) -> &Path {
    self.tree.build_root()
  }

  pub fn config(&self) -> &MapperConfig {
    &self.config
  }

  fn relativize(&self, path: &Path) -> Option<PathBuf> {
    let relative = if path.is_absolute() {
      match path
        .strip_prefix(&self.absolute_root)
        .or_else(|_| path.strip_prefix(self.tree.build_root()))
      {
        Ok(rel) => rel,
        Err(_) => {
          debug!(path = %path.display(), "ignoring change outside the build root");
          return None;
        }
      }
    } else {
      path
    };
    let Some(relative) = normal_components(relative) else {
      debug!(path = %path.display(), "ignoring change that leaves the build root");
      return None;
    };
    if self.under_ignored_dir(&relative) {
      trace!(path = %relative.display(), "ignoring change in an ignored directory");
      return None;
    }
    Some(relative)
  }

  /// True when an ancestor of `path` is never descended into.
  fn under_ignored_dir(&self, path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
      parent.components().any(|c| match c {
        Component::Normal(name) => self.config.patterns.is_ignored(&name.to_string_lossy()),
        _ => false,
      })
    })
  }
}

/// Drop `.` components; `None` if the path climbs out through `..`.
fn normal_components(path: &Path) -> Option<PathBuf> {
  let mut normal = PathBuf::new();
  for component in path.components() {
    match component {
      Component::Normal(part) => normal.push(part),
      Component::ParentDir => return None,
      _ => {}
    }
  }
  Some(normal)
}
