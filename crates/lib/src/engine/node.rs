//! Node identity: a product type paired with a subject value.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A value products are computed for.
///
/// Implemented for every clonable, hashable, comparable, thread-safe type.
pub trait Subject: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> Subject for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// A value rules compute.
pub trait Product: fmt::Debug + Send + Sync + 'static {}

impl<T> Product for T where T: fmt::Debug + Send + Sync + 'static {}

/// Type-erased product as stored in the cache.
pub(crate) type ErasedProduct = Arc<dyn Any + Send + Sync>;

/// Object-safe view of a [`Subject`].
pub(crate) trait DynSubject: Send + Sync + fmt::Debug {
  fn as_any(&self) -> &dyn Any;
  fn dyn_eq(&self, other: &dyn DynSubject) -> bool;
  fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T: Subject> DynSubject for T {
  fn as_any(&self) -> &dyn Any {
    self
  }

  fn dyn_eq(&self, other: &dyn DynSubject) -> bool {
    other.as_any().downcast_ref::<T>().is_some_and(|other| other == self)
  }

  fn dyn_hash(&self, mut state: &mut dyn Hasher) {
    TypeId::of::<T>().hash(&mut state);
    self.hash(&mut state);
  }
}

/// Key of one memoized computation.
#[derive(Clone)]
pub struct NodeKey {
  product: TypeId,
  product_name: &'static str,
  subject_name: &'static str,
  subject: Arc<dyn DynSubject>,
}

impl NodeKey {
  pub(crate) fn new<P: Product, S: Subject>(subject: S) -> Self {
    Self {
      product: TypeId::of::<P>(),
      product_name: short_type_name::<P>(),
      subject_name: short_type_name::<S>(),
      subject: Arc::new(subject),
    }
  }

  pub(crate) fn product(&self) -> TypeId {
    self.product
  }

  pub(crate) fn subject_type(&self) -> TypeId {
    self.subject.as_any().type_id()
  }

  pub(crate) fn subject(&self) -> &Arc<dyn DynSubject> {
    &self.subject
  }

  pub fn product_name(&self) -> &'static str {
    self.product_name
  }

  pub fn subject_name(&self) -> &'static str {
    self.subject_name
  }
}

impl PartialEq for NodeKey {
  fn eq(&self, other: &Self) -> bool {
    self.product == other.product && self.subject.dyn_eq(other.subject.as_ref())
  }
}

impl Eq for NodeKey {}

impl Hash for NodeKey {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.product.hash(state);
    self.subject.dyn_hash(state);
  }
}

impl fmt::Debug for NodeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}({:?})", self.product_name, self.subject)
  }
}

impl fmt::Display for NodeKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Type name without its module path, e.g. `AddressFamily`.
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
  let full = std::any::type_name::<T>();
  let base = full.split('<').next().unwrap_or(full);
  match base.rfind("::") {
    Some(idx) => &full[idx + 2..],
    None => full,
  }
}
