//! The handle rule bodies use to issue sub-requests.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;

use super::Core;
use super::cache::PathScope;
use super::node::{ErasedProduct, NodeKey, Product, Subject, short_type_name};
use super::types::EngineError;

/// Passed to every rule body.
///
/// Sub-requests made through a context are recorded as dependencies of the
/// node the rule is computing, so invalidating a sub-result also evicts the
/// caller.
#[derive(Clone)]
pub struct Context {
  core: Arc<Core>,
  current: Option<NodeKey>,
}

impl Context {
  pub(crate) fn new(core: Arc<Core>, current: Option<NodeKey>) -> Self {
    Self { core, current }
  }

  /// Request product `P` for `subject` and wait for it.
  pub async fn get<P: Product, S: Subject>(&self, subject: S) -> Result<Arc<P>, EngineError> {
    let key = NodeKey::new::<P, S>(subject);
    let product = self.core.get_node(key, self.current.as_ref()).await?;
    downcast::<P>(product)
  }

  /// Request `P` for every subject as one batch.
  ///
  /// The sub-requests run concurrently. Results come back in request order
  /// once the whole batch has finished; if any failed, the failure of the
  /// earliest one in request order is returned.
  pub async fn get_all<P, S, I>(&self, subjects: I) -> Result<Vec<Arc<P>>, EngineError>
  where
    P: Product,
    S: Subject,
    I: IntoIterator<Item = S>,
  {
    let handles: Vec<JoinHandle<Result<Arc<P>, EngineError>>> = subjects
      .into_iter()
      .map(|subject| {
        let ctx = self.clone();
        tokio::spawn(async move { ctx.get::<P, S>(subject).await })
      })
      .collect();

    let mut products = Vec::with_capacity(handles.len());
    let mut first_error = None;

    for handle in handles {
      match handle.await {
        Ok(Ok(product)) => products.push(product),
        Ok(Err(e)) => {
          first_error.get_or_insert(e);
        }
        Err(e) => {
          first_error.get_or_insert(EngineError::TaskFailed(e.to_string()));
        }
      }
    }

    match first_error {
      Some(e) => Err(e),
      None => Ok(products),
    }
  }

  /// Record that the node being computed read `path`.
  ///
  /// Paths are relative to the build root. Only rules that touch the
  /// filesystem need this; everything else is invalidated through its
  /// dependencies.
  pub fn track_path(&self, path: impl Into<PathBuf>) {
    self.track(path.into(), PathScope::Entry);
  }

  /// Record that the node being computed observed everything below `dir`,
  /// so a change at any depth under it evicts the node.
  pub fn track_subtree(&self, dir: impl Into<PathBuf>) {
    self.track(dir.into(), PathScope::Subtree);
  }

  fn track(&self, path: PathBuf, scope: PathScope) {
    if let Some(current) = &self.current {
      self.core.cache.track_path(current, path, scope);
    }
  }
}

fn downcast<P: Product>(product: ErasedProduct) -> Result<Arc<P>, EngineError> {
  product
    .downcast::<P>()
    .map_err(|_| EngineError::TaskFailed(format!("cached product is not a {}", short_type_name::<P>())))
}
