//! The addressable object form produced by parsers.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field holding an object's identifying name.
pub const NAME_FIELD: &str = "name";

/// Field holding an object's registered type alias.
pub const TYPE_ALIAS_FIELD: &str = "type_alias";

/// A raw, not yet hydrated declaration object.
///
/// Field values stay as JSON; cross-references inside them (e.g. dependency
/// specs) are left for downstream hydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
  pub type_alias: String,
  #[serde(flatten)]
  pub fields: BTreeMap<String, Value>,
}

impl Struct {
  pub fn new(type_alias: impl Into<String>) -> Self {
    Self {
      type_alias: type_alias.into(),
      fields: BTreeMap::new(),
    }
  }

  /// Builder-style field setter.
  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.fields.insert(key.into(), value.into());
    self
  }

  /// The identifying name, if present and non-empty.
  pub fn name(&self) -> Option<&str> {
    self
      .fields
      .get(NAME_FIELD)
      .and_then(Value::as_str)
      .filter(|name| !name.is_empty())
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.fields.get(key)
  }
}

impl fmt::Display for Struct {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}(", self.type_alias)?;
    for (idx, (key, value)) in self.fields.iter().enumerate() {
      if idx > 0 {
        write!(f, ", ")?;
      }
      write!(f, "{}={}", key, value)?;
    }
    write!(f, ")")
  }
}

/// One top-level item yielded by a parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed {
  /// An object whose type alias is registered in the symbol table.
  Addressable(Struct),
  /// Anything else; kept so the caller can report it.
  Unregistered(Value),
}
