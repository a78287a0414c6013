//! Cached resolution and its invalidation.

use buildgraph_lib::specs::Spec;

use super::common::{Project, addr, plain, target};

#[test]
fn no_address_no_family() {
  let project = Project::fixture();
  let mapper = project.mapper();
  let spec = Spec::single("a/c", "c");

  // Does not exist.
  assert!(mapper.resolve_objects(spec.clone()).unwrap_err().is_not_found());

  project.write("a/c/c.BUILD.json", r#"{"type_alias": "struct", "name": "c"}"#);

  // On disk, but the cached family is still empty.
  assert!(mapper.resolve_objects(spec.clone()).is_err());

  mapper.invalidate(["a/c"]);

  let resolved = mapper.unhydrated_structs(spec).unwrap();
  assert_eq!(resolved.len(), 1);
  assert_eq!(resolved[0].object, plain("c"));
}

#[test]
fn repeated_requests_run_no_rule_twice() {
  let project = Project::fixture();
  let mapper = project.mapper();

  let first = mapper.resolve_objects(Spec::descendants("")).unwrap();
  let runs = mapper.scheduler().stats();
  let second = mapper.resolve_objects(Spec::descendants("")).unwrap();

  assert_eq!(first, second);
  assert_eq!(mapper.scheduler().stats().rule_runs, runs.rule_runs);
  assert_eq!(runs.runs("parse_address_family"), 4);
}

#[test]
fn edit_reparses_only_its_namespace() {
  let project = Project::fixture();
  let mapper = project.mapper();
  mapper.resolve(Spec::descendants("")).unwrap();
  let before = mapper.scheduler().stats();

  project.write("a/d/d.BUILD.json", r#"{"type_alias": "target", "name": "d2"}"#);
  assert!(mapper.invalidate(["a/d/d.BUILD.json"]) > 0);

  let addresses = mapper.resolve(Spec::descendants("")).unwrap();
  assert!(addresses.contains(&addr("a/d:d2")));
  assert!(!addresses.contains(&addr("a/d:d")));

  let after = mapper.scheduler().stats();
  assert_eq!(after.runs("parse_address_family"), before.runs("parse_address_family") + 1);
  assert_eq!(after.runs("read_file"), before.runs("read_file") + 1);
}

#[test]
fn absolute_paths_are_accepted() {
  let project = Project::fixture();
  let mapper = project.mapper();
  assert_eq!(mapper.resolve(Spec::siblings("a/b")).unwrap().len(), 1);

  project.write("a/b/more.BUILD.json", r#"{"type_alias": "target", "name": "more"}"#);
  mapper.invalidate([project.root().join("a/b/more.BUILD.json")]);

  assert_eq!(mapper.resolve(Spec::siblings("a/b")).unwrap().len(), 2);
}

#[test]
fn changes_outside_the_root_are_ignored() {
  let project = Project::fixture();
  let mapper = project.mapper();
  mapper.resolve(Spec::descendants("")).unwrap();

  assert_eq!(mapper.invalidate(["/definitely/not/the/root/BUILD.json"]), 0);
  assert_eq!(mapper.scheduler().stats().runs("parse_address_family"), 4);
}

#[test]
fn removed_files_disappear() {
  let project = Project::fixture();
  let mapper = project.mapper();
  assert!(mapper.resolve(Spec::single("a/d", "d")).is_ok());

  project.remove("a/d/d.BUILD.json");
  mapper.invalidate(["a/d/d.BUILD.json"]);

  assert!(mapper.resolve(Spec::single("a/d", "d")).unwrap_err().is_not_found());
  assert_eq!(
    mapper.resolve_objects(Spec::descendants("a/d")).unwrap().into_iter().collect::<Vec<_>>(),
    vec![(addr("a/d/e:e"), target("e")), (addr("a/d/e:e-prime"), plain("e-prime"))]
  );
}

#[test]
fn new_directories_join_descendant_walks() {
  let project = Project::fixture();
  let mapper = project.mapper();
  assert_eq!(mapper.resolve(Spec::descendants("a")).unwrap().len(), 4);

  project.write("a/f/g/g.BUILD.json", r#"{"type_alias": "target", "name": "g"}"#);
  mapper.invalidate(["a/f"]);

  let addresses = mapper.resolve(Spec::descendants("a")).unwrap();
  assert_eq!(addresses.len(), 5);
  assert!(addresses.contains(&addr("a/f/g")));
}

#[test]
fn nested_new_file_alone_reaches_descendant_walks() {
  let project = Project::fixture();
  let mapper = project.mapper();
  assert_eq!(mapper.resolve(Spec::descendants("a/b")).unwrap().len(), 1);

  project.write("a/b/f/g/g.BUILD.json", r#"{"type_alias": "target", "name": "g"}"#);
  assert!(mapper.invalidate(["a/b/f/g/g.BUILD.json"]) > 0);

  let addresses = mapper.resolve(Spec::descendants("a/b")).unwrap();
  assert_eq!(addresses.into_iter().collect::<Vec<_>>(), vec![addr("a/b:b"), addr("a/b/f/g")]);
}

#[test]
fn changes_in_ignored_directories_evict_nothing() {
  let project = Project::fixture();
  let mapper = project.mapper();
  mapper.resolve(Spec::descendants("")).unwrap();

  project.write(".git/index", "binary");
  assert_eq!(mapper.invalidate([".git/index"]), 0);
  assert_eq!(mapper.invalidate(["../elsewhere/x.BUILD.json"]), 0);
  assert!(mapper.scheduler().stats().cached_nodes > 0);
}

#[test]
fn invalidate_all_forces_a_full_rebuild() {
  let project = Project::fixture();
  let mapper = project.mapper();
  mapper.resolve(Spec::descendants("")).unwrap();

  assert!(mapper.invalidate_all() > 0);
  assert_eq!(mapper.scheduler().stats().cached_nodes, 0);

  mapper.resolve(Spec::descendants("")).unwrap();
  assert_eq!(mapper.scheduler().stats().runs("parse_address_family"), 8);
}
