//! Spec resolution against the fixture tree.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use buildgraph_lib::engine::EngineError;
use buildgraph_lib::mapper::MapperError;
use buildgraph_lib::specs::{Spec, Specs};

use super::common::{Project, a_b_target, addr, plain, target};

#[test]
fn resolve_single_address() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let structs = mapper.unhydrated_structs(Spec::single("a/b", "b")).unwrap();
  assert_eq!(structs.len(), 1);
  assert_eq!(structs[0].address, addr("a/b"));
  assert_eq!(structs[0].object, a_b_target());
  assert_eq!(structs[0].build_file, PathBuf::from("a/b/b.BUILD.json"));
}

#[test]
fn walk_siblings() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let objects = mapper.resolve_objects(Spec::siblings("a/b")).unwrap();
  assert_eq!(objects, BTreeMap::from([(addr("a/b:b"), a_b_target())]));
}

#[test]
fn walk_descendants() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let objects = mapper.resolve_objects(Spec::descendants("")).unwrap();
  assert_eq!(
    objects,
    BTreeMap::from([
      (addr("//:root"), plain("root")),
      (addr("a/b:b"), a_b_target()),
      (addr("a/d:d"), target("d")),
      (addr("a/d/e:e"), target("e")),
      (addr("a/d/e:e-prime"), plain("e-prime")),
    ])
  );
}

#[test]
fn walk_descendants_rel_path() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let objects = mapper.resolve_objects(Spec::descendants("a/d")).unwrap();
  assert_eq!(
    objects,
    BTreeMap::from([
      (addr("a/d:d"), target("d")),
      (addr("a/d/e:e"), target("e")),
      (addr("a/d/e:e-prime"), plain("e-prime")),
    ])
  );
}

#[test]
fn dot_components_resolve_like_plain_paths() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let specs = Specs::parse(["./a/b:", "./a/./d::", "a/./d/e:e"]).unwrap();
  let addresses: Vec<_> = mapper.resolve(specs).unwrap().into_iter().collect();
  assert_eq!(
    addresses,
    vec![addr("a/b:b"), addr("a/d:d"), addr("a/d/e:e"), addr("a/d/e:e-prime")]
  );

  let siblings = mapper.resolve(Spec::siblings("./a/b")).unwrap();
  assert_eq!(siblings.into_iter().collect::<Vec<_>>(), vec![addr("a/b:b")]);
  assert_eq!(mapper.address_family_for("./a/d").unwrap().namespace(), "a/d");
}

#[test]
fn descendants_skip_ignored_directories() {
  let project = Project::fixture();
  project.write("target/x/x.BUILD.json", r#"{"type_alias": "target", "name": "x"}"#);
  project.write("a/.git/g.BUILD.json", r#"{"type_alias": "target", "name": "g"}"#);
  let mapper = project.mapper();

  let addresses = mapper.resolve(Spec::descendants("")).unwrap();
  assert_eq!(addresses.len(), 5);
  assert!(!addresses.contains(&addr("target/x:x")));
}

#[test]
fn multiple_specs_concatenate_without_duplicates() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let specs = Specs::parse(["a/d/e:e-prime", "a/d::", "a/b"]).unwrap();
  let order: Vec<String> = mapper
    .unhydrated_structs(specs)
    .unwrap()
    .iter()
    .map(|s| s.address.spec())
    .collect();
  assert_eq!(order, vec!["a/d/e:e-prime", "a/d:d", "a/d/e:e", "a/b:b"]);
}

#[test]
fn missing_name_is_recoverable() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let err = mapper.resolve(Spec::single("a/d", "nope")).unwrap_err();
  assert!(err.is_not_found());
  match err {
    EngineError::Mapper(MapperError::AddressNotFound { address, available }) => {
      assert_eq!(address, addr("a/d:nope"));
      assert_eq!(available, vec!["d"]);
    }
    other => panic!("expected AddressNotFound, got {:?}", other),
  }
}

#[test]
fn empty_and_missing_directories_look_the_same() {
  let project = Project::fixture();
  project.mkdir("a/empty");
  let mapper = project.mapper();

  for dir in ["a/empty", "a/missing"] {
    assert!(mapper.resolve(Spec::siblings(dir)).unwrap().is_empty(), "{}", dir);
    assert!(mapper.resolve(Spec::descendants(dir)).unwrap().is_empty(), "{}", dir);
    assert!(mapper.address_family_for(dir).unwrap().is_empty(), "{}", dir);
    assert!(mapper.resolve(Spec::single(dir, "x")).unwrap_err().is_not_found(), "{}", dir);
  }
}

#[test]
fn address_family_for_is_memoized() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let first = mapper.address_family_for("a/d/e").unwrap();
  let second = mapper.address_family_for("//a/d/e/").unwrap();
  assert!(Arc::ptr_eq(&first, &second));
  assert_eq!(first.names(), vec!["e", "e-prime"]);
  assert_eq!(mapper.scheduler().rule_runs("parse_address_family"), 1);
}

#[test]
fn duplicate_names_across_files_fail() {
  let project = Project::fixture();
  project.write("a/d/other.BUILD.json", r#"{"type_alias": "target", "name": "d"}"#);
  let mapper = project.mapper();

  let err = mapper.resolve(Spec::siblings("a/d")).unwrap_err();
  assert!(!err.is_not_found());
  match &err {
    EngineError::Mapper(MapperError::DuplicateName {
      name, first, second, ..
    }) => {
      assert_eq!(name, "d");
      assert_eq!(first, &PathBuf::from("a/d/d.BUILD.json"));
      assert_eq!(second, &PathBuf::from("a/d/other.BUILD.json"));
    }
    other => panic!("expected DuplicateName, got {:?}", other),
  }
  assert!(err.to_string().contains("a/d:d"), "{}", err);
}

#[test]
fn structural_errors_surface_through_descendants() {
  let project = Project::fixture();
  project.write("a/d/e/bad.BUILD.json", "{\"type_alias\": \"target\", ");
  let mapper = project.mapper();

  let err = mapper.resolve(Spec::descendants("a")).unwrap_err();
  assert!(
    matches!(&err, EngineError::Mapper(MapperError::Parse { path, .. }) if path == &PathBuf::from("a/d/e/bad.BUILD.json")),
    "{:?}",
    err
  );

  // Unrelated namespaces still resolve.
  assert_eq!(mapper.resolve(Spec::siblings("a/b")).unwrap().len(), 1);
}

#[test]
fn unregistered_types_are_unaddressable() {
  let project = Project::fixture();
  project.write("a/b/extra.BUILD.json", r#"{"type_alias": "mystery", "name": "m"}"#);
  let mapper = project.mapper();

  let err = mapper.resolve(Spec::siblings("a/b")).unwrap_err();
  assert!(matches!(err, EngineError::Mapper(MapperError::UnaddressableObject { .. })), "{:?}", err);
}
