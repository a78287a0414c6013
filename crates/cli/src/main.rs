mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use buildgraph_lib::consts::WATCH_DEBOUNCE_MS;

use crate::output::OutputFormat;

/// bgraph - resolve addresses in a tree of JSON declaration files
#[derive(Parser)]
#[command(name = "bgraph")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Build root holding the declaration files
  #[arg(short, long, global = true, default_value = ".")]
  root: PathBuf,

  /// Output format
  #[arg(short = 'o', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print the addresses the specs resolve to
  List {
    /// Specs such as `a/b:c`, `a/b`, `a/b:` or `a/b::`
    #[arg(required = true)]
    specs: Vec<String>,
  },

  /// Print the objects the specs resolve to
  Show {
    #[arg(required = true)]
    specs: Vec<String>,
  },

  /// Print one namespace's addresses and the files declaring them
  Families {
    /// Namespace directory relative to the build root
    #[arg(default_value = "")]
    dir: String,
  },

  /// Resolve the specs again after every batch of file changes
  Watch {
    #[arg(required = true)]
    specs: Vec<String>,

    /// Quiet period in milliseconds before a batch of changes is applied
    #[arg(long, default_value_t = WATCH_DEBOUNCE_MS)]
    debounce_ms: u64,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::List { specs } => cmd::cmd_list(&cli.root, &specs, cli.format),
    Commands::Show { specs } => cmd::cmd_show(&cli.root, &specs, cli.format),
    Commands::Families { dir } => cmd::cmd_families(&cli.root, &dir, cli.format),
    Commands::Watch { specs, debounce_ms } => cmd::cmd_watch(&cli.root, &specs, debounce_ms, cli.format),
  }
}
