/* Common utilities shared between analyze and codegen commands */

use crate::config::GeneratorOptions;
use crate::schema::{ResolvedUnit, TypeResolver};
use erlpb_loader::{DependencyResolver, LoadedUnit};
use std::path::{Path, PathBuf};

/* Load every requested descriptor file and its dependencies, dependencies first */
pub fn load_units(files: &[PathBuf], include_dirs: Vec<PathBuf>) -> anyhow::Result<Vec<LoadedUnit>> {
    let mut resolver = DependencyResolver::new(include_dirs);
    for file in files {
        resolver.load_file_with_dependencies(file)?;
    }
    tracing::info!(files = resolver.loaded_file_count(), "loaded descriptor files");
    Ok(resolver.into_units())
}

/* Link loaded units and resolve every one of them */
pub fn resolve_units(units: Vec<LoadedUnit>) -> anyhow::Result<Vec<ResolvedUnit>> {
    let mut resolver = TypeResolver::new();
    for unit in units {
        let name = unit.name().to_string();
        resolver
            .add_unit(unit)
            .map_err(|e| anyhow::anyhow!("failed to register '{}': {}", name, e))?;
    }
    resolver
        .resolve_all()
        .map_err(|e| anyhow::anyhow!("Type resolution failed: {}", e))
}

pub fn load_and_resolve(files: &[PathBuf], include_dirs: Vec<PathBuf>) -> anyhow::Result<Vec<ResolvedUnit>> {
    resolve_units(load_units(files, include_dirs)?)
}

/* Defaults, then the optional config file */
pub fn load_options(config: Option<&Path>) -> anyhow::Result<GeneratorOptions> {
    match config {
        Some(path) => {
            tracing::debug!(path = %path.display(), "reading generator config");
            GeneratorOptions::from_yaml_file(path)
        }
        None => Ok(GeneratorOptions::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_and_resolves_dependency_chain() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("common.yaml"),
            "name: common.proto\npackage: common\nenums:\n  - name: Color\n    values: [{ name: RED, number: 0 }]\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("shapes.yaml"),
            "name: shapes.proto\ndependencies: [common.yaml]\nmessages:\n  - name: Shape\n    fields:\n      - { name: color, number: 1, type: enum, type-name: .common.Color }\n",
        )
        .unwrap();

        let units = load_and_resolve(&[dir.path().join("shapes.yaml")], vec![]).unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["common.proto", "shapes.proto"]);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        assert!(load_options(Some(Path::new("/nonexistent/erlpb.yaml"))).is_err());
        assert_eq!(load_options(None).unwrap(), GeneratorOptions::default());
    }
}
