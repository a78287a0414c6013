//! Shared helpers for mapper integration tests.

use std::path::Path;

use buildgraph_lib::address::Address;
use buildgraph_lib::config::GraphConfig;
use buildgraph_lib::mapper::AddressMapper;
use buildgraph_lib::objects::Struct;
use serde_json::json;
use tempfile::TempDir;

/// A project tree in a temporary directory.
///
/// [`Project::fixture`] lays out:
///
/// ```text
/// root.BUILD.json     //:root     (struct)
/// a/b/b.BUILD.json    a/b:b       (target with nested fields)
/// a/d/d.BUILD.json    a/d:d       (target)
/// a/d/e/e.BUILD.json  a/d/e:e     (target), a/d/e:e-prime (struct)
/// ```
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn fixture() -> Self {
    let project = Self::empty();
    project.write("root.BUILD.json", r#"{"type_alias": "struct", "name": "root"}"#);
    project.write(
      "a/b/b.BUILD.json",
      r#"{
        "type_alias": "target",
        "name": "b",
        "dependencies": ["//d:e"],
        "configurations": ["//a", {"embedded": "yes"}]
      }"#,
    );
    project.write("a/d/d.BUILD.json", r#"{"type_alias": "target", "name": "d"}"#);
    project.write(
      "a/d/e/e.BUILD.json",
      r#"{"type_alias": "target", "name": "e"}
{"type_alias": "struct", "name": "e-prime"}"#,
    );
    project.write("a/d/e/notes.txt", "not a declaration file");
    project
  }

  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn write(&self, rel: &str, content: &str) {
    let path = self.root().join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
  }

  pub fn mkdir(&self, rel: &str) {
    std::fs::create_dir_all(self.root().join(rel)).unwrap();
  }

  pub fn remove(&self, rel: &str) {
    std::fs::remove_file(self.root().join(rel)).unwrap();
  }

  /// Mapper over `*.BUILD.json` files declaring `target` and `struct`.
  pub fn mapper(&self) -> AddressMapper {
    let config = GraphConfig {
      build_patterns: vec!["*.BUILD.json".to_string()],
      types: vec!["target".to_string(), "struct".to_string()],
      parallelism: 2,
      ..Default::default()
    };
    config.mapper(self.root()).unwrap()
  }
}

pub fn addr(spec: &str) -> Address {
  Address::parse(spec).unwrap()
}

pub fn target(name: &str) -> Struct {
  Struct::new("target").with("name", name)
}

pub fn plain(name: &str) -> Struct {
  Struct::new("struct").with("name", name)
}

pub fn a_b_target() -> Struct {
  target("b")
    .with("dependencies", json!(["//d:e"]))
    .with("configurations", json!(["//a", {"embedded": "yes"}]))
}
