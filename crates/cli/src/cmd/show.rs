//! Implementation of the `bgraph show` command.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use buildgraph_lib::graph::UnhydratedStruct;
use buildgraph_lib::objects::Struct;

use super::{open_mapper, parse_specs};
use crate::output::{OutputFormat, print_address, print_json, print_stat};

#[derive(Serialize)]
struct ShownObject<'a> {
  address: String,
  build_file: String,
  object: &'a Struct,
}

impl<'a> From<&'a UnhydratedStruct> for ShownObject<'a> {
  fn from(s: &'a UnhydratedStruct) -> Self {
    Self {
      address: s.address.spec(),
      build_file: s.build_file.display().to_string(),
      object: &s.object,
    }
  }
}

pub fn cmd_show(root: &Path, specs: &[String], output: OutputFormat) -> Result<()> {
  let specs = parse_specs(specs)?;
  let (_, mapper) = open_mapper(root)?;

  let structs = mapper
    .unhydrated_structs(specs.clone())
    .with_context(|| format!("Failed to resolve {}", specs))?;

  if output.is_json() {
    let shown: Vec<ShownObject> = structs.iter().map(ShownObject::from).collect();
    return print_json(&shown);
  }

  for (idx, s) in structs.iter().enumerate() {
    if idx > 0 {
      println!();
    }
    print_address(&s.address.spec(), Some(&s.build_file.display().to_string()));
    print_stat("type", &s.object.type_alias);
    for (field, value) in &s.object.fields {
      print_stat(field, &value.to_string());
    }
  }
  Ok(())
}
