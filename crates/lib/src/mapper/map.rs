//! One declaration file's objects, keyed by local name.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::path::{Path, PathBuf};

use super::types::MapperError;
use crate::address::validate_name;
use crate::objects::{Parsed, Struct};
use crate::parser::Parser;

/// The parse result of exactly one declaration file.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressMap {
  path: PathBuf,
  objects_by_name: BTreeMap<String, Struct>,
}

impl AddressMap {
  pub fn new(path: impl Into<PathBuf>, objects_by_name: BTreeMap<String, Struct>) -> Self {
    Self {
      path: path.into(),
      objects_by_name,
    }
  }

  /// Parse `content` with `parser` and index the objects by name.
  ///
  /// # Errors
  ///
  /// - `UnaddressableObject` if the file declares nothing, declares an
  ///   unregistered item, or declares an object without a usable name.
  /// - `DuplicateName` if two objects in the file share a name.
  /// - `Parse` if the parser rejects the syntax.
  pub fn parse(path: &Path, content: &[u8], parser: &dyn Parser) -> Result<Self, MapperError> {
    let mut objects_by_name = BTreeMap::new();

    for item in parser.parse(path, content) {
      let item = item.map_err(|e| MapperError::Parse {
        path: path.to_path_buf(),
        message: e.message,
      })?;

      let object = match item {
        Parsed::Addressable(object) => object,
        Parsed::Unregistered(value) => {
          return Err(MapperError::UnaddressableObject {
            path: path.to_path_buf(),
            reason: format!("{} is not a registered addressable type", value),
          });
        }
      };

      let Some(name) = object.name().map(str::to_string) else {
        return Err(MapperError::UnaddressableObject {
          path: path.to_path_buf(),
          reason: format!("{} has no name", object),
        });
      };

      if let Err(e) = validate_name(&name, &name) {
        return Err(MapperError::UnaddressableObject {
          path: path.to_path_buf(),
          reason: e.to_string(),
        });
      }

      match objects_by_name.entry(name) {
        Entry::Occupied(entry) => {
          return Err(MapperError::DuplicateName {
            name: entry.key().clone(),
            first: path.to_path_buf(),
            second: path.to_path_buf(),
            addresses: Vec::new(),
          });
        }
        Entry::Vacant(entry) => {
          entry.insert(object);
        }
      }
    }

    if objects_by_name.is_empty() {
      return Err(MapperError::UnaddressableObject {
        path: path.to_path_buf(),
        reason: "the file declares no addressable objects".to_string(),
      });
    }

    Ok(Self::new(path, objects_by_name))
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn objects_by_name(&self) -> &BTreeMap<String, Struct> {
    &self.objects_by_name
  }

  pub(crate) fn into_parts(self) -> (PathBuf, BTreeMap<String, Struct>) {
    (self.path, self.objects_by_name)
  }
}
