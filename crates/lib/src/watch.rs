//! Filesystem notifications turned into batches of changed paths.
//!
//! The batches are meant for [`AddressMapper::invalidate`](crate::mapper::AddressMapper::invalidate).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error)]
pub enum WatchError {
  #[error("failed to watch {}", .0.display())]
  Watch(PathBuf, #[source] notify::Error),

  #[error("file watcher stopped")]
  Disconnected,
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
  let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
  let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

  matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp") || name.ends_with('~')
}

/// Paths of `event` that can change what declaration files say.
fn changed_paths(event: &Event) -> Vec<PathBuf> {
  match event.kind {
    EventKind::Create(_) | EventKind::Remove(_) => {}
    EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
    EventKind::Modify(_) => {}
    _ => return Vec::new(),
  }
  event.paths.iter().filter(|p| !is_temp_file(p)).cloned().collect()
}

/// Recursive watcher over a build root.
pub struct FileWatcher {
  root: PathBuf,
  rx: Receiver<notify::Result<Event>>,
  _watcher: RecommendedWatcher,
}

impl FileWatcher {
  /// Start watching `root` recursively. Events buffer until read.
  pub fn new(root: &Path) -> Result<Self, WatchError> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
      let _ = tx.send(res);
    })
    .map_err(|e| WatchError::Watch(root.to_path_buf(), e))?;

    watcher
      .watch(root, RecursiveMode::Recursive)
      .map_err(|e| WatchError::Watch(root.to_path_buf(), e))?;
    debug!(root = %root.display(), "watching for changes");

    Ok(Self {
      root: root.to_path_buf(),
      rx,
      _watcher: watcher,
    })
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Block until something changes, then keep collecting until nothing has
  /// changed for `debounce`.
  pub fn next_batch(&self, debounce: Duration) -> Result<BTreeSet<PathBuf>, WatchError> {
    let mut batch = BTreeSet::new();

    while batch.is_empty() {
      let event = self.rx.recv().map_err(|_| WatchError::Disconnected)?;
      self.absorb(event, &mut batch);
    }

    loop {
      match self.rx.recv_timeout(debounce) {
        Ok(event) => self.absorb(event, &mut batch),
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
      }
    }

    debug!(paths = batch.len(), "collected file changes");
    Ok(batch)
  }

  fn absorb(&self, event: notify::Result<Event>, batch: &mut BTreeSet<PathBuf>) {
    match event {
      Ok(event) => {
        trace!(kind = ?event.kind, paths = ?event.paths, "raw notify event");
        batch.extend(changed_paths(&event));
      }
      Err(e) => warn!(error = %e, "notify error"),
    }
  }
}
