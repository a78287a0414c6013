//! Crate-wide defaults.

/// Name of the optional configuration file looked up at the build root.
pub const CONFIG_FILENAME: &str = "buildgraph.toml";

/// Declaration file globs used when the configuration does not name any.
pub const DEFAULT_BUILD_PATTERNS: &[&str] = &["BUILD.json", "*.BUILD.json"];

/// Directory names never descended into when none are configured.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[".git", "target", "node_modules"];

/// Prefix marking a spec or address as relative to the build root.
pub const BUILD_ROOT_PREFIX: &str = "//";

/// Quiet period the watcher waits for before delivering a batch of changes.
pub const WATCH_DEBOUNCE_MS: u64 = 200;
