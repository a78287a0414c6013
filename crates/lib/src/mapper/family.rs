//! The merged address space of one namespace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::trace;

use super::map::AddressMap;
use super::types::MapperError;
use crate::address::{Address, namespace_of};
use crate::objects::Struct;

/// All objects declared directly in one directory, keyed by full address.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressFamily {
  namespace: String,
  addressables: BTreeMap<Address, Struct>,
  build_files: BTreeMap<Address, PathBuf>,
}

impl AddressFamily {
  /// Merge the address maps of one namespace.
  ///
  /// Every map must live directly in `namespace`, and no local name may
  /// appear in two maps. The result does not depend on the order of
  /// `address_maps`.
  pub fn create<I>(namespace: &str, address_maps: I) -> Result<Self, MapperError>
  where
    I: IntoIterator<Item = AddressMap>,
  {
    let mut address_maps: Vec<AddressMap> = address_maps.into_iter().collect();
    // Merge in path order so the reported collision is the same for any
    // input order.
    address_maps.sort_by(|a, b| a.path().cmp(b.path()));

    let differing: Vec<PathBuf> = address_maps
      .iter()
      .filter(|map| !lives_in(map.path(), namespace))
      .map(|map| map.path().to_path_buf())
      .collect();
    if !differing.is_empty() {
      return Err(MapperError::DifferingFamilies {
        namespace: namespace.to_string(),
        paths: differing,
      });
    }

    let mut origins: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut addressables = BTreeMap::new();
    let mut build_files = BTreeMap::new();

    for map in address_maps {
      let (path, objects) = map.into_parts();
      for (name, object) in objects {
        let address = Address::new(namespace, name.as_str())?;

        if let Some(previous) = origins.get(&name) {
          let (first, second) = if previous <= &path {
            (previous.clone(), path.clone())
          } else {
            (path.clone(), previous.clone())
          };
          return Err(MapperError::DuplicateName {
            name,
            first,
            second,
            addresses: vec![address],
          });
        }

        origins.insert(name, path.clone());
        build_files.insert(address.clone(), path.clone());
        addressables.insert(address, object);
      }
    }

    trace!(namespace, objects = addressables.len(), "created address family");

    Ok(Self {
      namespace: namespace.to_string(),
      addressables,
      build_files,
    })
  }

  /// A family with no declaration files.
  pub fn empty(namespace: &str) -> Self {
    Self {
      namespace: namespace.to_string(),
      addressables: BTreeMap::new(),
      build_files: BTreeMap::new(),
    }
  }

  pub fn namespace(&self) -> &str {
    &self.namespace
  }

  pub fn addressables(&self) -> &BTreeMap<Address, Struct> {
    &self.addressables
  }

  /// Look up an object by its local name.
  pub fn get(&self, name: &str) -> Option<(&Address, &Struct)> {
    let address = Address::new(self.namespace.as_str(), name).ok()?;
    self.addressables.get_key_value(&address)
  }

  pub fn addresses(&self) -> impl Iterator<Item = &Address> {
    self.addressables.keys()
  }

  /// Local names in sorted order.
  pub fn names(&self) -> Vec<String> {
    self.addressables.keys().map(|a| a.name().to_string()).collect()
  }

  /// The declaration file an address was parsed from.
  pub fn build_file_for(&self, address: &Address) -> Option<&Path> {
    self.build_files.get(address).map(PathBuf::as_path)
  }

  pub fn len(&self) -> usize {
    self.addressables.len()
  }

  pub fn is_empty(&self) -> bool {
    self.addressables.is_empty()
  }
}

/// True when `path` sits directly in the `namespace` directory.
fn lives_in(path: &Path, namespace: &str) -> bool {
  if path.is_absolute() {
    return false;
  }
  let parent = path.parent().unwrap_or_else(|| Path::new(""));
  namespace_of(parent) == namespace
}
