//! Parser and symbol table capabilities.
//!
//! The address model never interprets declaration syntax itself. A [`Parser`]
//! turns raw bytes into a lazy sequence of [`Parsed`] items, consulting a
//! [`SymbolTable`] to decide which items are addressable.

mod json;

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use thiserror::Error;

pub use json::JsonParser;

use crate::objects::Parsed;

/// A syntax error reported by a parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
  pub message: String,
}

impl ParseError {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}

/// Lazy sequence of parsed items.
pub type ParsedItems<'a> = Box<dyn Iterator<Item = Result<Parsed, ParseError>> + 'a>;

/// Turns the content of one declaration file into parsed items.
pub trait Parser: Send + Sync + fmt::Debug {
  fn parse<'a>(&'a self, path: &'a Path, content: &'a [u8]) -> ParsedItems<'a>;
}

/// Decides which type aliases denote addressable objects.
pub trait SymbolTable: Send + Sync + fmt::Debug {
  fn is_addressable(&self, type_alias: &str) -> bool;
}

/// Symbol table backed by an explicit set of aliases.
///
/// An empty table built with [`TypeTable::permissive`] accepts every alias.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
  aliases: BTreeSet<String>,
  permissive: bool,
}

impl TypeTable {
  pub fn new<I, S>(aliases: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      aliases: aliases.into_iter().map(Into::into).collect(),
      permissive: false,
    }
  }

  pub fn permissive() -> Self {
    Self {
      aliases: BTreeSet::new(),
      permissive: true,
    }
  }

  pub fn aliases(&self) -> impl Iterator<Item = &str> {
    self.aliases.iter().map(String::as_str)
  }
}

impl SymbolTable for TypeTable {
  fn is_addressable(&self, type_alias: &str) -> bool {
    self.permissive || self.aliases.contains(type_alias)
  }
}
