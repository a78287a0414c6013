//! Rules that build the address space on top of the filesystem rules.
//!
//! ```text
//! Specs ─► BuildFileAddresses ─┬─► AddressFamily(dir) ─► BuildFiles(dir) ─► DirectoryListing(dir)
//!                              │                       └► FileContent(file)...
//!                              └─► BuildDirs(root) ─► DirectoryTree(root)
//! Specs ─► UnhydratedStructs ─► UnhydratedStruct(address)...
//! ```

use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::address::{Address, normalize_namespace};
use crate::engine::{Context, EngineError, RuleSet};
use crate::fs::{BuildPatterns, DescendantDirs, Dir, DirectoryListing, DirectoryTree, File, FileContent};
use crate::mapper::{AddressFamily, AddressMap, MapperConfig, MapperError};
use crate::objects::Struct;
use crate::parser::Parser;
use crate::specs::{Spec, Specs};

/// Declaration files directly in one directory, sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildFiles {
  pub dir: String,
  pub files: Vec<PathBuf>,
}

/// Directories at or below a root holding at least one declaration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildDirs {
  pub root: String,
  pub dirs: Vec<String>,
}

/// An address with its raw object and the file declaring it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnhydratedStruct {
  pub address: Address,
  pub object: Struct,
  pub build_file: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnhydratedStructs(pub Vec<UnhydratedStruct>);

/// The de-duplicated addresses a [`Specs`] resolves to, in resolution order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildFileAddresses(pub Vec<Address>);

async fn build_files(ctx: Context, patterns: Arc<BuildPatterns>, dir: Dir) -> Result<BuildFiles, EngineError> {
  let listing = ctx.get::<DirectoryListing, Dir>(dir.clone()).await?;
  let files = listing
    .files
    .iter()
    .filter(|name| patterns.is_build_file(name))
    .map(|name| dir.path().join(name))
    .collect();
  Ok(BuildFiles { dir: dir.0, files })
}

async fn build_dirs(ctx: Context, root: DescendantDirs) -> Result<BuildDirs, EngineError> {
  let tree = ctx.get::<DirectoryTree, DescendantDirs>(root.clone()).await?;
  let per_dir = ctx
    .get_all::<BuildFiles, Dir, _>(tree.dirs.iter().cloned().map(Dir))
    .await?;

  let dirs = per_dir
    .iter()
    .filter(|files| !files.files.is_empty())
    .map(|files| files.dir.clone())
    .collect();
  Ok(BuildDirs { root: root.0, dirs })
}

async fn parse_address_family(ctx: Context, parser: Arc<dyn Parser>, dir: Dir) -> Result<AddressFamily, EngineError> {
  let build_files = ctx.get::<BuildFiles, Dir>(dir.clone()).await?;
  let contents = ctx
    .get_all::<FileContent, File, _>(build_files.files.iter().cloned().map(File))
    .await?;

  let maps = contents
    .iter()
    .map(|file| AddressMap::parse(&file.path, &file.content, parser.as_ref()))
    .collect::<Result<Vec<_>, MapperError>>()?;

  let family = AddressFamily::create(&dir.0, maps)?;
  debug!(namespace = %dir.0, files = build_files.files.len(), objects = family.len(), "parsed address family");
  Ok(family)
}

async fn resolve_unhydrated_struct(ctx: Context, address: Address) -> Result<UnhydratedStruct, EngineError> {
  let family = ctx.get::<AddressFamily, Dir>(Dir::new(address.namespace())).await?;

  let Some((_, object)) = family.get(address.name()) else {
    return Err(not_found(&family, address).into());
  };

  Ok(UnhydratedStruct {
    build_file: family.build_file_for(&address).map(PathBuf::from).unwrap_or_default(),
    object: object.clone(),
    address,
  })
}

/// Resolve one spec, sorted by address.
async fn addresses_for_spec(ctx: &Context, spec: &Spec) -> Result<Vec<Address>, EngineError> {
  let directory = normalize_namespace(&spec.to_string(), spec.directory()).map_err(MapperError::from)?;
  match spec {
    Spec::SingleAddress { name, .. } => {
      let family = ctx.get::<AddressFamily, Dir>(Dir::new(directory.as_str())).await?;
      match family.get(name) {
        Some((address, _)) => Ok(vec![address.clone()]),
        None => {
          let address = Address::new(directory, name.as_str()).map_err(MapperError::from)?;
          Err(not_found(&family, address).into())
        }
      }
    }
    Spec::SiblingAddresses { .. } => {
      let family = ctx.get::<AddressFamily, Dir>(Dir::new(directory)).await?;
      Ok(family.addresses().cloned().collect())
    }
    Spec::DescendantAddresses { .. } => {
      let build_dirs = ctx.get::<BuildDirs, DescendantDirs>(DescendantDirs(directory)).await?;
      let families = ctx
        .get_all::<AddressFamily, Dir, _>(build_dirs.dirs.iter().cloned().map(Dir))
        .await?;
      let addresses: BTreeSet<Address> = families.iter().flat_map(|f| f.addresses().cloned()).collect();
      Ok(addresses.into_iter().collect())
    }
  }
}

async fn addresses_from_specs(ctx: Context, specs: Specs) -> Result<BuildFileAddresses, EngineError> {
  let mut seen = HashSet::new();
  let mut addresses = Vec::new();

  for spec in specs.iter() {
    for address in addresses_for_spec(&ctx, spec).await? {
      if seen.insert(address.clone()) {
        addresses.push(address);
      }
    }
  }

  debug!(specs = %specs, addresses = addresses.len(), "resolved specs");
  Ok(BuildFileAddresses(addresses))
}

async fn unhydrated_structs(ctx: Context, specs: Specs) -> Result<UnhydratedStructs, EngineError> {
  let addresses = ctx.get::<BuildFileAddresses, Specs>(specs).await?;
  let structs = ctx
    .get_all::<UnhydratedStruct, Address, _>(addresses.0.iter().cloned())
    .await?;
  Ok(UnhydratedStructs(structs.iter().map(|s| s.as_ref().clone()).collect()))
}

fn not_found(family: &AddressFamily, address: Address) -> MapperError {
  MapperError::AddressNotFound {
    address,
    available: family.names(),
  }
}

/// Rules turning declaration files into address families and resolving
/// specs against them.
pub fn create_graph_rules(config: Arc<MapperConfig>) -> RuleSet {
  let patterns = config.patterns.clone();
  let parser = config.parser.clone();

  RuleSet::new()
    .rule("build_files", move |ctx: Context, dir: Dir| {
      build_files(ctx, patterns.clone(), dir)
    })
    .rule("build_dirs", build_dirs)
    .rule("parse_address_family", move |ctx: Context, dir: Dir| {
      parse_address_family(ctx, parser.clone(), dir)
    })
    .rule("resolve_unhydrated_struct", resolve_unhydrated_struct)
    .rule("addresses_from_specs", addresses_from_specs)
    .rule("unhydrated_structs", unhydrated_structs)
}
