//! Implementation of the `bgraph list` command.

use std::path::Path;

use anyhow::{Context, Result};

use super::{open_mapper, parse_specs};
use crate::output::{OutputFormat, print_address, print_json};

pub fn cmd_list(root: &Path, specs: &[String], output: OutputFormat) -> Result<()> {
  let specs = parse_specs(specs)?;
  let (_, mapper) = open_mapper(root)?;

  let addresses = mapper
    .resolve(specs.clone())
    .with_context(|| format!("Failed to resolve {}", specs))?;

  if output.is_json() {
    let specs: Vec<String> = addresses.iter().map(|a| a.spec()).collect();
    return print_json(&specs);
  }

  for address in &addresses {
    print_address(&address.spec(), None);
  }
  Ok(())
}
