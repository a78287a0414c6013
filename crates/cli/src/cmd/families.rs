//! Implementation of the `bgraph families` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::json;

use buildgraph_lib::address::Address;

use super::open_mapper;
use crate::output::{OutputFormat, print_address, print_info, print_json};

pub fn cmd_families(root: &Path, dir: &str, output: OutputFormat) -> Result<()> {
  let (_, mapper) = open_mapper(root)?;

  let family = mapper
    .address_family_for(dir)
    .with_context(|| format!("Failed to load namespace '{}'", dir))?;

  let file_of = |address: &Address| {
    family
      .build_file_for(address)
      .map(|p| p.display().to_string())
      .unwrap_or_default()
  };

  if output.is_json() {
    let entries: Vec<_> = family
      .addresses()
      .map(|a| json!({ "address": a.spec(), "build_file": file_of(a) }))
      .collect();
    return print_json(&json!({ "namespace": family.namespace(), "addresses": entries }));
  }

  if family.is_empty() {
    print_info(&format!("No declarations in '{}'", family.namespace()));
    return Ok(());
  }

  for address in family.addresses() {
    print_address(&address.spec(), Some(&file_of(address)));
  }
  Ok(())
}
