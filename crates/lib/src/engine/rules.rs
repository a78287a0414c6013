//! Rule declarations and the registry resolved at scheduler construction.

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::Context;
use super::node::{DynSubject, ErasedProduct, Product, Subject, short_type_name};
use super::types::EngineError;

pub(crate) type RuleFuture = Pin<Box<dyn Future<Output = Result<ErasedProduct, EngineError>> + Send>>;

type RuleFn = dyn Fn(Context, Arc<dyn DynSubject>) -> RuleFuture + Send + Sync;

/// A named async function computing one product type from one subject type.
#[derive(Clone)]
pub struct Rule {
  name: &'static str,
  product: TypeId,
  product_name: &'static str,
  subject: TypeId,
  subject_name: &'static str,
  func: Arc<RuleFn>,
}

impl Rule {
  /// Declare a rule computing `P` for subjects of type `S`.
  ///
  /// The body receives a [`Context`] for issuing sub-requests and the
  /// subject by value.
  pub fn new<P, S, F, Fut>(name: &'static str, func: F) -> Self
  where
    P: Product,
    S: Subject,
    F: Fn(Context, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, EngineError>> + Send + 'static,
  {
    let expected = short_type_name::<S>();
    let erased = move |ctx: Context, subject: Arc<dyn DynSubject>| -> RuleFuture {
      match subject.as_any().downcast_ref::<S>() {
        Some(subject) => {
          let fut = func(ctx, subject.clone());
          Box::pin(async move { fut.await.map(|product| Arc::new(product) as ErasedProduct) })
        }
        None => Box::pin(std::future::ready(Err(EngineError::SubjectMismatch {
          rule: name.to_string(),
          expected: expected.to_string(),
        }))),
      }
    };

    Self {
      name,
      product: TypeId::of::<P>(),
      product_name: short_type_name::<P>(),
      subject: TypeId::of::<S>(),
      subject_name: expected,
      func: Arc::new(erased),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn product_name(&self) -> &'static str {
    self.product_name
  }

  pub fn subject_name(&self) -> &'static str {
    self.subject_name
  }

  pub(crate) fn run(&self, ctx: Context, subject: Arc<dyn DynSubject>) -> RuleFuture {
    (self.func)(ctx, subject)
  }
}

impl fmt::Debug for Rule {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Rule")
      .field("name", &self.name)
      .field("product", &self.product_name)
      .field("subject", &self.subject_name)
      .finish()
  }
}

/// An unordered collection of rules, combined before building a scheduler.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
  rules: Vec<Rule>,
}

impl RuleSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add(mut self, rule: Rule) -> Self {
    self.rules.push(rule);
    self
  }

  /// Declare and add a rule in one step.
  pub fn rule<P, S, F, Fut>(self, name: &'static str, func: F) -> Self
  where
    P: Product,
    S: Subject,
    F: Fn(Context, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<P, EngineError>> + Send + 'static,
  {
    self.add(Rule::new(name, func))
  }

  pub fn extend(mut self, other: RuleSet) -> Self {
    self.rules.extend(other.rules);
    self
  }

  pub fn len(&self) -> usize {
    self.rules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }
}

/// Rules indexed by (product type, subject type).
#[derive(Debug, Default)]
pub(crate) struct RuleIndex {
  by_key: HashMap<(TypeId, TypeId), Rule>,
}

impl RuleIndex {
  /// Index `rules`, rejecting two rules for the same pair.
  pub(crate) fn build(rules: RuleSet) -> Result<Self, EngineError> {
    let mut by_key = HashMap::new();
    for rule in rules.rules {
      match by_key.entry((rule.product, rule.subject)) {
        Entry::Occupied(existing) => {
          let existing: &Rule = existing.get();
          return Err(EngineError::AmbiguousRules {
            product: rule.product_name.to_string(),
            subject: rule.subject_name.to_string(),
            first: existing.name.to_string(),
            second: rule.name.to_string(),
          });
        }
        Entry::Vacant(slot) => {
          slot.insert(rule);
        }
      }
    }
    Ok(Self { by_key })
  }

  pub(crate) fn get(&self, product: TypeId, subject: TypeId) -> Option<&Rule> {
    self.by_key.get(&(product, subject))
  }

  pub(crate) fn len(&self) -> usize {
    self.by_key.len()
  }
}
