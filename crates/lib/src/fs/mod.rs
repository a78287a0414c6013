//! Filesystem access for the rule engine.
//!
//! The intrinsic rules here are the only ones that touch the disk. Each one
//! records the paths it read through [`Context::track_path`] or
//! [`Context::track_subtree`], which is what
//! lets an invalidation signal for a file reach every node derived from it.

mod patterns;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::address::namespace_of;
use crate::engine::{Context, EngineError, RuleSet};

pub use patterns::{BuildPatterns, Glob, PatternError};

/// Subject: one directory, as a namespace relative to the build root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Dir(pub String);

impl Dir {
  pub fn new(namespace: impl Into<String>) -> Self {
    Self(namespace.into())
  }

  pub fn path(&self) -> &Path {
    Path::new(&self.0)
  }
}

/// Subject: one file, relative to the build root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct File(pub PathBuf);

/// Subject: a directory and everything below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescendantDirs(pub String);

/// Names of the entries of one directory, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryListing {
  pub dir: String,
  pub files: Vec<String>,
  pub dirs: Vec<String>,
  /// False when the directory does not exist; `files` and `dirs` are empty.
  pub exists: bool,
}

impl DirectoryListing {
  pub fn missing(dir: impl Into<String>) -> Self {
    Self {
      dir: dir.into(),
      ..Default::default()
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
  pub path: PathBuf,
  pub content: Vec<u8>,
}

/// Every directory at or below `root` that was not pruned, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirectoryTree {
  pub root: String,
  pub dirs: Vec<String>,
}

/// Read-only view of a project on disk.
///
/// All paths are relative to [`ProjectTree::build_root`].
pub trait ProjectTree: Send + Sync + fmt::Debug {
  fn build_root(&self) -> &Path;

  /// List `dir`. A missing directory is not an error.
  fn list_dir(&self, dir: &Path) -> io::Result<DirectoryListing>;

  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Every directory at or below `root`, skipping ignored directory names.
  /// A missing root yields no directories.
  fn walk_dirs(&self, root: &Path, patterns: &BuildPatterns) -> io::Result<Vec<PathBuf>>;
}

/// [`ProjectTree`] over the local filesystem.
#[derive(Debug, Clone)]
pub struct FsProjectTree {
  root: PathBuf,
}

impl FsProjectTree {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }
}

impl ProjectTree for FsProjectTree {
  fn build_root(&self) -> &Path {
    &self.root
  }

  fn list_dir(&self, dir: &Path) -> io::Result<DirectoryListing> {
    let full = self.root.join(dir);
    let namespace = namespace_of(dir);
    if !full.is_dir() {
      return Ok(DirectoryListing::missing(namespace));
    }

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(&full)? {
      let entry = entry?;
      let name = entry.file_name().to_string_lossy().into_owned();
      if entry.path().is_dir() {
        dirs.push(name);
      } else {
        files.push(name);
      }
    }
    files.sort();
    dirs.sort();

    Ok(DirectoryListing {
      dir: namespace,
      files,
      dirs,
      exists: true,
    })
  }

  fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
    std::fs::read(self.root.join(path))
  }

  fn walk_dirs(&self, root: &Path, patterns: &BuildPatterns) -> io::Result<Vec<PathBuf>> {
    let start = self.root.join(root);
    if !start.is_dir() {
      return Ok(Vec::new());
    }

    let walker = WalkDir::new(&start).sort_by_file_name().into_iter().filter_entry(|e| {
      e.file_type().is_dir() && (e.depth() == 0 || !e.file_name().to_str().is_some_and(|n| patterns.is_ignored(n)))
    });

    let mut dirs = Vec::new();
    for entry in walker {
      let entry = entry?;
      let rel = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
      dirs.push(rel.to_path_buf());
    }
    Ok(dirs)
  }
}

/// Run blocking filesystem work off the runtime's worker threads.
async fn blocking<T, F>(f: F) -> Result<T, EngineError>
where
  T: Send + 'static,
  F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
  tokio::task::spawn_blocking(f)
    .await
    .map_err(|e| EngineError::TaskFailed(e.to_string()))?
}

async fn list_directory(ctx: Context, tree: Arc<dyn ProjectTree>, dir: Dir) -> Result<DirectoryListing, EngineError> {
  ctx.track_path(dir.path());
  let path = dir.path().to_path_buf();
  let listing = blocking(move || tree.list_dir(&path).map_err(|e| EngineError::io(path, &e))).await?;
  debug!(dir = %dir.0, files = listing.files.len(), dirs = listing.dirs.len(), "listed directory");
  Ok(listing)
}

async fn read_file(ctx: Context, tree: Arc<dyn ProjectTree>, file: File) -> Result<FileContent, EngineError> {
  ctx.track_path(file.0.clone());
  let path = file.0;
  blocking(move || {
    let content = tree.read_file(&path).map_err(|e| EngineError::io(&path, &e))?;
    Ok(FileContent { path, content })
  })
  .await
}

async fn walk_tree(
  ctx: Context,
  tree: Arc<dyn ProjectTree>,
  patterns: Arc<BuildPatterns>,
  root: DescendantDirs,
) -> Result<DirectoryTree, EngineError> {
  // Any change below the root can add or remove a walked directory.
  ctx.track_subtree(&root.0);
  let start = PathBuf::from(&root.0);
  let walked = blocking(move || tree.walk_dirs(&start, &patterns).map_err(|e| EngineError::io(start, &e))).await?;

  let dirs: Vec<String> = walked.iter().map(|d| namespace_of(d)).collect();
  debug!(root = %root.0, dirs = dirs.len(), "walked directory tree");

  Ok(DirectoryTree { root: root.0, dirs })
}

/// Rules reading `tree`: `Dir → DirectoryListing`, `File → FileContent` and
/// `DescendantDirs → DirectoryTree`.
pub fn create_fs_rules(tree: Arc<dyn ProjectTree>, patterns: Arc<BuildPatterns>) -> RuleSet {
  let list_tree = tree.clone();
  let read_tree = tree.clone();

  RuleSet::new()
    .rule("list_directory", move |ctx: Context, dir: Dir| {
      list_directory(ctx, list_tree.clone(), dir)
    })
    .rule("read_file", move |ctx: Context, file: File| {
      read_file(ctx, read_tree.clone(), file)
    })
    .rule("walk_tree", move |ctx: Context, root: DescendantDirs| {
      walk_tree(ctx, tree.clone(), patterns.clone(), root)
    })
}
