//! Addresses: the `namespace:name` identifiers of addressable objects.
//!
//! A namespace is a directory path relative to the build root, written with
//! `/` separators. The root namespace is the empty string and displays as `//`.

use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::BUILD_ROOT_PREFIX;

/// Errors produced while parsing addresses and specs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
  #[error("empty address spec")]
  Empty,

  #[error("invalid name '{name}' in '{spec}': {reason}")]
  InvalidName {
    spec: String,
    name: String,
    reason: &'static str,
  },

  #[error("invalid namespace '{namespace}' in '{spec}': {reason}")]
  InvalidNamespace {
    spec: String,
    namespace: String,
    reason: &'static str,
  },
}

/// Identifies one addressable object.
///
/// Ordering is by namespace, then name, which keeps listings grouped by
/// directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
  namespace: String,
  name: String,
}

impl Address {
  /// Create an address after validating both parts.
  pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Result<Self, AddressError> {
    let namespace = namespace.into();
    let name = name.into();
    let spec = format!("{}:{}", namespace, name);
    let namespace = normalize_namespace(&spec, &namespace)?;
    validate_name(&spec, &name)?;
    Ok(Self { namespace, name })
  }

  /// Parse `namespace:name`, `//namespace:name` or a bare `namespace` path.
  ///
  /// A bare path names the object carrying the directory's last component,
  /// so `a/b` is `a/b:b`.
  pub fn parse(spec: &str) -> Result<Self, AddressError> {
    let trimmed = spec.trim();
    if trimmed.is_empty() {
      return Err(AddressError::Empty);
    }
    let stripped = trimmed.strip_prefix(BUILD_ROOT_PREFIX).unwrap_or(trimmed);

    let (namespace, name) = match stripped.rsplit_once(':') {
      Some((namespace, name)) => (namespace, name.to_string()),
      None => {
        let namespace = stripped.trim_end_matches('/');
        let name = namespace.rsplit('/').next().unwrap_or_default();
        if name.is_empty() {
          return Err(AddressError::InvalidName {
            spec: spec.to_string(),
            name: String::new(),
            reason: "a bare path must name a directory",
          });
        }
        (namespace, name.to_string())
      }
    };

    let namespace = normalize_namespace(spec, namespace)?;
    validate_name(spec, &name)?;
    Ok(Self { namespace, name })
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The canonical spec string, always in `namespace:name` form.
  pub fn spec(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for Address {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.namespace.is_empty() {
      write!(f, "{}:{}", BUILD_ROOT_PREFIX, self.name)
    } else {
      write!(f, "{}:{}", self.namespace, self.name)
    }
  }
}

impl FromStr for Address {
  type Err = AddressError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

/// Convert a relative directory path into its namespace string.
///
/// `.` components are dropped so `./a/b` and `a/b` share a namespace.
pub fn namespace_of(dir: &Path) -> String {
  dir
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("/")
}

/// True when `namespace` is `ancestor` or lies below it.
pub fn is_within(namespace: &str, ancestor: &str) -> bool {
  if ancestor.is_empty() || namespace == ancestor {
    return true;
  }
  namespace
    .strip_prefix(ancestor)
    .is_some_and(|rest| rest.starts_with('/'))
}

/// Strip the root prefix, trailing slashes and `.` components, then check the
/// namespace shape.
pub(crate) fn normalize_namespace(spec: &str, namespace: &str) -> Result<String, AddressError> {
  let namespace = namespace.strip_prefix(BUILD_ROOT_PREFIX).unwrap_or(namespace);
  let namespace = namespace.trim_end_matches('/');

  let invalid = |reason| AddressError::InvalidNamespace {
    spec: spec.to_string(),
    namespace: namespace.to_string(),
    reason,
  };

  if namespace.starts_with('/') {
    return Err(invalid("namespaces are relative to the build root"));
  }
  if namespace.contains(':') {
    return Err(invalid("namespaces cannot contain ':'"));
  }
  if namespace.split('/').any(|part| part == "..") {
    return Err(invalid("namespaces cannot leave the build root"));
  }
  if !namespace.is_empty() && namespace.split('/').any(str::is_empty) {
    return Err(invalid("namespaces cannot contain empty path components"));
  }
  Ok(
    namespace
      .split('/')
      .filter(|part| !part.is_empty() && *part != ".")
      .collect::<Vec<_>>()
      .join("/"),
  )
}

pub(crate) fn validate_name(spec: &str, name: &str) -> Result<(), AddressError> {
  let invalid = |reason| AddressError::InvalidName {
    spec: spec.to_string(),
    name: name.to_string(),
    reason,
  };

  if name.is_empty() {
    return Err(invalid("names cannot be empty"));
  }
  if name.contains('/') || name.contains(':') {
    return Err(invalid("names cannot contain '/' or ':'"));
  }
  if name == "." || name == ".." {
    return Err(invalid("names cannot be '.' or '..'"));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_qualified() {
    let address = Address::parse("a/b:c").unwrap();
    assert_eq!(address.namespace(), "a/b");
    assert_eq!(address.name(), "c");
  }

  #[test]
  fn parse_bare_path_uses_last_component() {
    let address = Address::parse("a/b").unwrap();
    assert_eq!(address, Address::new("a/b", "b").unwrap());
    assert_eq!(address.to_string(), "a/b:b");
  }

  #[test]
  fn parse_root_namespace() {
    let address = Address::parse("//:root").unwrap();
    assert_eq!(address.namespace(), "");
    assert_eq!(address.name(), "root");
    assert_eq!(address.to_string(), "//:root");
  }

  #[test]
  fn parse_strips_root_prefix() {
    assert_eq!(Address::parse("//a/d:d").unwrap(), Address::parse("a/d").unwrap());
  }

  #[test]
  fn parse_rejects_empty_and_malformed() {
    assert_eq!(Address::parse("  "), Err(AddressError::Empty));
    assert!(matches!(Address::parse("a/b:"), Err(AddressError::InvalidName { .. })));
    assert!(matches!(Address::parse("//"), Err(AddressError::InvalidName { .. })));
    assert!(matches!(
      Address::parse("/abs:x"),
      Err(AddressError::InvalidNamespace { .. })
    ));
    assert!(matches!(
      Address::parse("a/../b:x"),
      Err(AddressError::InvalidNamespace { .. })
    ));
  }

  #[test]
  fn dot_components_are_dropped() {
    assert_eq!(Address::parse("./a:x").unwrap(), Address::parse("a:x").unwrap());
    assert_eq!(Address::parse("a/./b:x").unwrap().namespace(), "a/b");
    assert_eq!(Address::parse("//./a/b").unwrap(), Address::parse("a/b:b").unwrap());
    assert_eq!(Address::parse(".:root").unwrap(), Address::parse("//:root").unwrap());
    assert_eq!(Address::new("./a", "x").unwrap(), Address::new("a", "x").unwrap());
    assert!(matches!(Address::parse("a/."), Err(AddressError::InvalidName { .. })));
  }

  #[test]
  fn display_round_trips() {
    for spec in ["//:root", "a/b:b", "a/d/e:e-prime"] {
      assert_eq!(Address::parse(spec).unwrap().to_string(), spec);
    }
  }

  #[test]
  fn ordering_groups_by_namespace() {
    let mut addresses = vec![
      Address::parse("a/d:d").unwrap(),
      Address::parse("//:root").unwrap(),
      Address::parse("a/b:b").unwrap(),
    ];
    addresses.sort();
    let specs: Vec<_> = addresses.iter().map(Address::spec).collect();
    assert_eq!(specs, vec!["//:root", "a/b:b", "a/d:d"]);
  }

  #[test]
  fn namespace_helpers() {
    assert_eq!(namespace_of(Path::new("./a/b")), "a/b");
    assert_eq!(namespace_of(Path::new("")), "");
    assert!(is_within("a/d/e", "a/d"));
    assert!(is_within("a/d", "a/d"));
    assert!(is_within("a/b", ""));
    assert!(!is_within("a/dd", "a/d"));
    assert!(!is_within("a/b", "a/d"));
  }
}
