//! JSON declaration files: a stream of concatenated JSON objects.

use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::{ParseError, ParsedItems, Parser, SymbolTable};
use crate::objects::{Parsed, Struct, TYPE_ALIAS_FIELD};

/// Parses declaration files holding whitespace-separated JSON objects.
///
/// An object whose `type_alias` is registered becomes a [`Struct`]; anything
/// else (scalars, arrays, objects without a known alias) is yielded as
/// [`Parsed::Unregistered`].
#[derive(Debug, Clone)]
pub struct JsonParser {
  symbol_table: Arc<dyn SymbolTable>,
}

impl JsonParser {
  pub fn new(symbol_table: Arc<dyn SymbolTable>) -> Self {
    Self { symbol_table }
  }

  fn classify(&self, value: Value) -> Parsed {
    let Value::Object(mut fields) = value else {
      return Parsed::Unregistered(value);
    };

    let alias = match fields.get(TYPE_ALIAS_FIELD) {
      Some(Value::String(alias)) if self.symbol_table.is_addressable(alias) => alias.clone(),
      _ => return Parsed::Unregistered(Value::Object(fields)),
    };
    fields.remove(TYPE_ALIAS_FIELD);

    Parsed::Addressable(Struct {
      type_alias: alias,
      fields: into_btree(fields),
    })
  }
}

impl Parser for JsonParser {
  fn parse<'a>(&'a self, _path: &'a Path, content: &'a [u8]) -> ParsedItems<'a> {
    let stream = serde_json::Deserializer::from_slice(content).into_iter::<Value>();
    Box::new(stream.map(move |item| {
      item
        .map(|value| self.classify(value))
        .map_err(|e| ParseError::new(format!("line {} column {}: {}", e.line(), e.column(), e)))
    }))
  }
}

fn into_btree(fields: Map<String, Value>) -> std::collections::BTreeMap<String, Value> {
  fields.into_iter().collect()
}
