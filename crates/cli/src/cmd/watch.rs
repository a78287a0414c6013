//! Implementation of the `bgraph watch` command.
//!
//! Resolves the specs once, then waits for file changes, invalidates what
//! they touched and resolves again. Runs until interrupted.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use buildgraph_lib::mapper::AddressMapper;
use buildgraph_lib::specs::Specs;
use buildgraph_lib::watch::FileWatcher;

use super::{open_mapper, parse_specs};
use crate::output::{OutputFormat, format_duration, print_address, print_error, print_info, print_json, print_success};

pub fn cmd_watch(root: &Path, specs: &[String], debounce_ms: u64, output: OutputFormat) -> Result<()> {
  let specs = parse_specs(specs)?;
  let (root, mapper) = open_mapper(root)?;

  // Watch before the first resolution so no change slips in between.
  let watcher = FileWatcher::new(&root).context("Failed to start file watcher")?;
  print_info(&format!("Watching {}", root.display()));

  report(&mapper, &specs, output)?;

  loop {
    let changed = watcher
      .next_batch(Duration::from_millis(debounce_ms))
      .context("File watcher stopped")?;
    let evicted = mapper.invalidate(&changed);
    print_info(&format!(
      "{} path(s) changed, {} cached result(s) invalidated",
      changed.len(),
      evicted
    ));
    report(&mapper, &specs, output)?;
  }
}

/// Resolve and print. Resolution errors are printed, not returned, so the
/// loop survives a broken declaration file.
fn report(mapper: &AddressMapper, specs: &Specs, output: OutputFormat) -> Result<()> {
  let started = Instant::now();
  match mapper.resolve(specs.clone()) {
    Ok(addresses) => {
      if output.is_json() {
        let specs: Vec<String> = addresses.iter().map(|a| a.spec()).collect();
        print_json(&specs)?;
      } else {
        for address in &addresses {
          print_address(&address.spec(), None);
        }
      }
      print_success(&format!(
        "{} address(es) in {}",
        addresses.len(),
        format_duration(started.elapsed())
      ));
    }
    Err(e) => print_error(&format!("Failed to resolve {}: {}", specs, e)),
  }
  Ok(())
}
