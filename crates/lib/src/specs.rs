//! Query shapes over the address space and their command-line syntax.
//!
//! | syntax     | spec                                 |
//! |------------|--------------------------------------|
//! | `a/b:c`    | `SingleAddress { "a/b", "c" }`       |
//! | `a/b`      | `SingleAddress { "a/b", "b" }`       |
//! | `a/b:`     | `SiblingAddresses { "a/b" }`         |
//! | `a/b::`    | `DescendantAddresses { "a/b" }`      |
//! | `::`       | `DescendantAddresses { "" }`         |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::address::{Address, AddressError, normalize_namespace};
use crate::consts::BUILD_ROOT_PREFIX;

/// One query over the address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Spec {
  /// Exactly one address.
  SingleAddress { directory: String, name: String },
  /// Every address declared directly in `directory`.
  SiblingAddresses { directory: String },
  /// Every address declared in `directory` or any directory below it.
  DescendantAddresses { directory: String },
}

impl Spec {
  pub fn single(directory: impl Into<String>, name: impl Into<String>) -> Self {
    Spec::SingleAddress {
      directory: directory.into(),
      name: name.into(),
    }
  }

  pub fn siblings(directory: impl Into<String>) -> Self {
    Spec::SiblingAddresses {
      directory: directory.into(),
    }
  }

  pub fn descendants(directory: impl Into<String>) -> Self {
    Spec::DescendantAddresses {
      directory: directory.into(),
    }
  }

  /// Parse the command-line spec syntax.
  pub fn parse(spec: &str) -> Result<Self, AddressError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
      return Err(AddressError::Empty);
    }

    if let Some(directory) = trimmed.strip_suffix("::") {
      return Ok(Spec::descendants(normalize_namespace(spec, directory)?));
    }
    if let Some(directory) = trimmed.strip_suffix(':') {
      return Ok(Spec::siblings(normalize_namespace(spec, directory)?));
    }

    let address = Address::parse(trimmed)?;
    Ok(Spec::single(address.namespace(), address.name()))
  }

  /// The directory the spec is rooted at.
  pub fn directory(&self) -> &str {
    match self {
      Spec::SingleAddress { directory, .. }
      | Spec::SiblingAddresses { directory }
      | Spec::DescendantAddresses { directory } => directory,
    }
  }
}

impl fmt::Display for Spec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Spec::SingleAddress { directory, name } => write!(f, "{}{}:{}", root_marker(directory), directory, name),
      Spec::SiblingAddresses { directory } => write!(f, "{}{}:", root_marker(directory), directory),
      Spec::DescendantAddresses { directory } => write!(f, "{}::", directory),
    }
  }
}

fn root_marker(directory: &str) -> &'static str {
  if directory.is_empty() { BUILD_ROOT_PREFIX } else { "" }
}

impl FromStr for Spec {
  type Err = AddressError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

/// An ordered collection of specs, resolved independently and concatenated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Specs(pub Vec<Spec>);

impl Specs {
  pub fn new(specs: impl IntoIterator<Item = Spec>) -> Self {
    Self(specs.into_iter().collect())
  }

  /// Parse several command-line specs.
  pub fn parse<I, S>(specs: I) -> Result<Self, AddressError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    specs
      .into_iter()
      .map(|s| Spec::parse(s.as_ref()))
      .collect::<Result<Vec<_>, _>>()
      .map(Self)
  }

  pub fn iter(&self) -> impl Iterator<Item = &Spec> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl From<Spec> for Specs {
  fn from(spec: Spec) -> Self {
    Self(vec![spec])
  }
}

impl fmt::Display for Specs {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self.0.iter().map(Spec::to_string).collect();
    write!(f, "{}", parts.join(" "))
  }
}
