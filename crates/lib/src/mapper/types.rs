//! Error types for address-space construction and lookup.

use std::path::PathBuf;

use thiserror::Error;

use crate::address::{Address, AddressError};

/// Errors raised while building or querying the address space.
///
/// Every variant carries owned, clonable data so a failed node can be cached
/// and handed to every requester.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
  /// A parsed object cannot be named or is not an addressable type.
  #[error("unaddressable object in {}: {reason}", .path.display())]
  UnaddressableObject { path: PathBuf, reason: String },

  /// Two objects share a name within one file or one namespace.
  #[error(
    "duplicate name '{name}' declared in {} and {}{}",
    .first.display(),
    .second.display(),
    format_addresses(.addresses)
  )]
  DuplicateName {
    name: String,
    first: PathBuf,
    second: PathBuf,
    addresses: Vec<Address>,
  },

  /// Address maps handed to one family live in different directories.
  #[error("address maps for namespace '{namespace}' come from other directories: {}", format_paths(.paths))]
  DifferingFamilies { namespace: String, paths: Vec<PathBuf> },

  /// The namespace exists (or is empty) but holds no object with this name.
  #[error("'{}' was not found in namespace '{}'{}", .address.name(), .address.namespace(), format_candidates(.available))]
  AddressNotFound { address: Address, available: Vec<String> },

  /// The parser rejected the file's syntax.
  #[error("failed to parse {}: {message}", .path.display())]
  Parse { path: PathBuf, message: String },

  #[error(transparent)]
  Address(#[from] AddressError),
}

impl MapperError {
  /// True for the recoverable "no such address" outcome.
  pub fn is_not_found(&self) -> bool {
    matches!(self, MapperError::AddressNotFound { .. })
  }
}

fn format_addresses(addresses: &[Address]) -> String {
  if addresses.is_empty() {
    return String::new();
  }
  let specs: Vec<String> = addresses.iter().map(Address::spec).collect();
  format!(" (addresses: {})", specs.join(", "))
}

fn format_paths(paths: &[PathBuf]) -> String {
  paths
    .iter()
    .map(|p| p.display().to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

fn format_candidates(available: &[String]) -> String {
  if available.is_empty() {
    ". The namespace declares no objects".to_string()
  } else {
    format!(". Did you mean one of: {}", available.join(", "))
  }
}
