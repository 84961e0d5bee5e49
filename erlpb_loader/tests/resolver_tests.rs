use erlpb_loader::DependencyResolver;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write descriptor");
}

#[test]
fn loads_dependencies_before_dependents() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "common.yaml",
        "name: common.proto\npackage: common\nenums:\n  - name: Color\n    values: [{name: RED, number: 0}]\n",
    );
    write(
        dir.path(),
        "shapes.yaml",
        "name: shapes.proto\npackage: shapes\ndependencies: [common.yaml]\nmessages:\n  - name: Square\n",
    );

    let mut resolver = DependencyResolver::new(vec![]);
    resolver
        .load_file_with_dependencies(&dir.path().join("shapes.yaml"))
        .expect("load should succeed");

    assert_eq!(resolver.loaded_file_count(), 2);
    let units = resolver.into_units();
    let names: Vec<&str> = units.iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["common.proto", "shapes.proto"]);
    assert_eq!(units[1].dependencies, vec!["common.proto".to_string()]);
}

#[test]
fn shared_dependency_is_loaded_once() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "base.yaml", "name: base.proto\n");
    write(dir.path(), "a.yaml", "name: a.proto\ndependencies: [base.yaml]\n");
    write(dir.path(), "b.yaml", "name: b.proto\ndependencies: [base.yaml]\n");

    let mut resolver = DependencyResolver::new(vec![]);
    resolver.load_file_with_dependencies(&dir.path().join("a.yaml")).unwrap();
    resolver.load_file_with_dependencies(&dir.path().join("b.yaml")).unwrap();

    let units = resolver.into_units();
    let names: Vec<&str> = units.iter().map(|u| u.name()).collect();
    assert_eq!(names, vec!["base.proto", "a.proto", "b.proto"]);
}

#[test]
fn include_dirs_are_searched() {
    let root = TempDir::new().unwrap();
    let include = TempDir::new().unwrap();
    write(include.path(), "lib.yaml", "name: lib.proto\n");
    write(root.path(), "main.yaml", "name: main.proto\ndependencies: [lib.yaml]\n");

    let mut resolver = DependencyResolver::new(vec![include.path().to_path_buf()]);
    resolver
        .load_file_with_dependencies(&root.path().join("main.yaml"))
        .expect("dependency should be found in the include dir");
    assert_eq!(resolver.into_units().len(), 2);
}

#[test]
fn missing_dependency_is_reported() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.yaml", "name: main.proto\ndependencies: [nowhere.yaml]\n");

    let mut resolver = DependencyResolver::new(vec![]);
    let err = resolver
        .load_file_with_dependencies(&dir.path().join("main.yaml"))
        .unwrap_err();
    assert!(err.to_string().contains("nowhere.yaml"));
}

#[test]
fn dependency_cycles_are_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.yaml", "name: a.proto\ndependencies: [b.yaml]\n");
    write(dir.path(), "b.yaml", "name: b.proto\ndependencies: [a.yaml]\n");

    let mut resolver = DependencyResolver::new(vec![]);
    let err = resolver
        .load_file_with_dependencies(&dir.path().join("a.yaml"))
        .unwrap_err();
    assert!(err.to_string().contains("circular dependency"), "got: {}", err);
}

#[test]
fn duplicate_unit_names_are_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "one.yaml", "name: same.proto\n");
    write(dir.path(), "two.yaml", "name: same.proto\n");

    let mut resolver = DependencyResolver::new(vec![]);
    resolver.load_file_with_dependencies(&dir.path().join("one.yaml")).unwrap();
    let err = resolver
        .load_file_with_dependencies(&dir.path().join("two.yaml"))
        .unwrap_err();
    assert!(err.to_string().contains("same.proto"));
}
