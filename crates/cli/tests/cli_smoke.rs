//! CLI smoke tests for bgraph.
//!
//! These tests run the binary against a small project tree and check output
//! and exit codes.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the bgraph binary.
fn bgraph_cmd() -> Command {
  cargo_bin_cmd!("bgraph")
}

fn write(temp: &TempDir, rel: &str, content: &str) {
  let path = temp.path().join(rel);
  std::fs::create_dir_all(path.parent().unwrap()).unwrap();
  std::fs::write(path, content).unwrap();
}

/// `//:root`, `a/b:b`, `a/d:d`, `a/d/e:e`.
fn project() -> TempDir {
  let temp = TempDir::new().unwrap();
  write(&temp, "BUILD.json", r#"{"type_alias": "struct", "name": "root"}"#);
  write(&temp, "a/b/BUILD.json", r#"{"type_alias": "target", "name": "b", "sources": ["b.rs"]}"#);
  write(&temp, "a/d/BUILD.json", r#"{"type_alias": "target", "name": "d"}"#);
  write(&temp, "a/d/e/e.BUILD.json", r#"{"type_alias": "target", "name": "e"}"#);
  temp
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  bgraph_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  bgraph_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("bgraph"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["list", "show", "families", "watch"] {
    bgraph_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// list
// =============================================================================

#[test]
fn list_descendants() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["list", "::"])
    .assert()
    .success()
    .stdout(predicate::eq("//:root\na/b:b\na/d:d\na/d/e:e\n"));
}

#[test]
fn list_json() {
  let temp = project();

  let output = bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["--format", "json", "list", "a/d:", "a/b"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let specs: Vec<String> = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(specs, vec!["a/b:b", "a/d:d"]);
}

#[test]
fn list_missing_address_fails() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["list", "a/b:nope"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("'nope' was not found in namespace 'a/b'"));
}

#[test]
fn list_invalid_spec_fails() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["list", "a:b/c"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid spec"));
}

// =============================================================================
// show
// =============================================================================

#[test]
fn show_prints_fields() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["show", "a/b"])
    .assert()
    .success()
    .stdout(predicate::str::contains("a/b:b"))
    .stdout(predicate::str::contains("a/b/BUILD.json"))
    .stdout(predicate::str::contains("sources"));
}

#[test]
fn show_json() {
  let temp = project();

  let output = bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["--format", "json", "show", "a/d/e"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let shown: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(shown[0]["address"], "a/d/e:e");
  assert_eq!(shown[0]["build_file"], "a/d/e/e.BUILD.json");
  assert_eq!(shown[0]["object"]["type_alias"], "target");
}

#[test]
fn broken_declaration_file_fails() {
  let temp = project();
  write(&temp, "a/b/BUILD.json", "{\"type_alias\": ");

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["show", "a/b"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to parse"));
}

// =============================================================================
// families
// =============================================================================

#[test]
fn families_lists_build_files() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["families", "a/d"])
    .assert()
    .success()
    .stdout(predicate::str::contains("a/d:d"))
    .stdout(predicate::str::contains("a/d/BUILD.json"));
}

#[test]
fn families_of_empty_namespace() {
  let temp = project();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["families", "a"])
    .assert()
    .success()
    .stderr(predicate::str::contains("No declarations in 'a'"));
}

// =============================================================================
// config
// =============================================================================

#[test]
fn config_restricts_types() {
  let temp = project();
  write(&temp, "buildgraph.toml", "types = [\"target\"]\n");

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path())
    .args(["list", "::"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("unaddressable object"));
}

#[test]
fn missing_root_fails() {
  let temp = TempDir::new().unwrap();

  bgraph_cmd()
    .arg("--root")
    .arg(temp.path().join("nope"))
    .args(["list", "::"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Build root not found"));
}
