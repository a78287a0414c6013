mod families;
mod list;
mod show;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use buildgraph_lib::config::GraphConfig;
use buildgraph_lib::mapper::AddressMapper;
use buildgraph_lib::specs::Specs;

pub use families::cmd_families;
pub use list::cmd_list;
pub use show::cmd_show;
pub use watch::cmd_watch;

/// Canonical build root and a mapper configured from its `buildgraph.toml`.
fn open_mapper(root: &Path) -> Result<(PathBuf, AddressMapper)> {
  let root = root
    .canonicalize()
    .with_context(|| format!("Build root not found: {}", root.display()))?;
  let config = GraphConfig::load(&root).context("Failed to load config")?;
  debug!(root = %root.display(), ?config, "opening build root");
  let mapper = config.mapper(&root).context("Failed to set up address mapper")?;
  Ok((root, mapper))
}

fn parse_specs(specs: &[String]) -> Result<Specs> {
  Specs::parse(specs).context("Invalid spec")
}
