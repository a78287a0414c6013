//! File-name globs for declaration files and ignored directories.

use regex::Regex;
use thiserror::Error;

use crate::consts::{DEFAULT_BUILD_PATTERNS, DEFAULT_IGNORE_PATTERNS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
  #[error("invalid glob '{pattern}': {message}")]
  InvalidGlob { pattern: String, message: String },
}

/// A single file-name glob supporting `*`, `?` and literal characters.
///
/// Globs match one path component, so `*` never crosses a `/`.
#[derive(Debug, Clone)]
pub struct Glob {
  pattern: String,
  regex: Regex,
}

impl Glob {
  pub fn new(pattern: &str) -> Result<Self, PatternError> {
    if pattern.is_empty() || pattern.contains('/') {
      return Err(PatternError::InvalidGlob {
        pattern: pattern.to_string(),
        message: "globs match a single file or directory name".to_string(),
      });
    }

    let mut source = String::from("^");
    for c in pattern.chars() {
      match c {
        '*' => source.push_str("[^/]*"),
        '?' => source.push_str("[^/]"),
        c => source.push_str(&regex::escape(&c.to_string())),
      }
    }
    source.push('$');

    let regex = Regex::new(&source).map_err(|e| PatternError::InvalidGlob {
      pattern: pattern.to_string(),
      message: e.to_string(),
    })?;

    Ok(Self {
      pattern: pattern.to_string(),
      regex,
    })
  }

  pub fn pattern(&self) -> &str {
    &self.pattern
  }

  pub fn is_match(&self, name: &str) -> bool {
    self.regex.is_match(name)
  }
}

/// Which files declare objects and which directories are never visited.
#[derive(Debug, Clone)]
pub struct BuildPatterns {
  build: Vec<Glob>,
  ignore: Vec<Glob>,
}

impl BuildPatterns {
  /// Compile the given globs.
  ///
  /// # Errors
  ///
  /// `InvalidGlob` for an empty glob or one containing `/`.
  pub fn new<B, I, S, T>(build: B, ignore: I) -> Result<Self, PatternError>
  where
    B: IntoIterator<Item = S>,
    I: IntoIterator<Item = T>,
    S: AsRef<str>,
    T: AsRef<str>,
  {
    Ok(Self {
      build: build.into_iter().map(|p| Glob::new(p.as_ref())).collect::<Result<_, _>>()?,
      ignore: ignore.into_iter().map(|p| Glob::new(p.as_ref())).collect::<Result<_, _>>()?,
    })
  }

  /// True when `file_name` is a declaration file.
  pub fn is_build_file(&self, file_name: &str) -> bool {
    self.build.iter().any(|g| g.is_match(file_name))
  }

  /// True when a directory called `dir_name` must not be descended into.
  pub fn is_ignored(&self, dir_name: &str) -> bool {
    self.ignore.iter().any(|g| g.is_match(dir_name))
  }

  pub fn build_patterns(&self) -> impl Iterator<Item = &str> {
    self.build.iter().map(Glob::pattern)
  }

  pub fn ignore_patterns(&self) -> impl Iterator<Item = &str> {
    self.ignore.iter().map(Glob::pattern)
  }
}

impl Default for BuildPatterns {
  fn default() -> Self {
    Self::new(DEFAULT_BUILD_PATTERNS, DEFAULT_IGNORE_PATTERNS).expect("default patterns are valid globs")
  }
}
