use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::file::{load_unit, LoadedUnit};

/* Loads descriptor files and, recursively, the files they depend on */
pub struct DependencyResolver {
    /* Canonical paths of fully loaded files */
    loaded_files: HashMap<PathBuf, String>,

    /* Files currently being loaded, outermost first (cycle detection) */
    in_progress: Vec<PathBuf>,

    /* Include directories for searching dependencies */
    include_dirs: Vec<PathBuf>,

    /* All loaded units, dependencies before their dependents */
    units: Vec<LoadedUnit>,

    /* Unit names already taken, to reject two files claiming one name */
    unit_names: HashSet<String>,
}

impl DependencyResolver {
    /* Create a new resolver with the given include directories */
    pub fn new(include_dirs: Vec<PathBuf>) -> Self {
        Self {
            loaded_files: HashMap::new(),
            in_progress: Vec::new(),
            include_dirs,
            units: Vec::new(),
            unit_names: HashSet::new(),
        }
    }

    /* Resolve a dependency path relative to the depending file or include directories */
    fn resolve_dependency_path(&self, dependency: &str, base_file: &Path) -> anyhow::Result<PathBuf> {
        /* First try relative to the base file's directory */
        if let Some(parent) = base_file.parent() {
            let relative_path = parent.join(dependency);
            if relative_path.exists() {
                return Ok(relative_path.canonicalize()?);
            }
        }

        /* Then try each include directory */
        for include_dir in &self.include_dirs {
            let include_path = include_dir.join(dependency);
            if include_path.exists() {
                return Ok(include_path.canonicalize()?);
            }
        }

        anyhow::bail!(
            "Dependency '{}' not found relative to '{}' or in include directories",
            dependency,
            base_file.display()
        )
    }

    /* Load a descriptor file and recursively load its dependencies */
    pub fn load_file_with_dependencies(&mut self, file_path: &Path) -> anyhow::Result<()> {
        self.load_internal(file_path).map(|_| ())
    }

    /* Returns the unit name of the loaded file */
    fn load_internal(&mut self, file_path: &Path) -> anyhow::Result<String> {
        let canonical_path = file_path
            .canonicalize()
            .map_err(|e| anyhow::anyhow!("cannot access '{}': {}", file_path.display(), e))?;

        if let Some(name) = self.loaded_files.get(&canonical_path) {
            tracing::debug!(path = %file_path.display(), "skipping already loaded file");
            return Ok(name.clone());
        }

        if let Some(pos) = self.in_progress.iter().position(|p| p == &canonical_path) {
            let chain: Vec<String> = self.in_progress[pos..]
                .iter()
                .chain(std::iter::once(&canonical_path))
                .map(|p| p.display().to_string())
                .collect();
            anyhow::bail!("circular dependency: {}", chain.join(" -> "));
        }

        tracing::info!(path = %file_path.display(), "loading descriptor file");
        let unit = load_unit(&canonical_path)?;
        tracing::debug!(
            unit = %unit.name,
            package = unit.package.as_deref().unwrap_or(""),
            dependencies = unit.dependencies.len(),
            "parsed descriptor"
        );

        self.in_progress.push(canonical_path.clone());
        let dependency_names = self.load_dependencies(&unit.dependencies, &canonical_path);
        self.in_progress.pop();
        let dependency_names = dependency_names?;

        if !self.unit_names.insert(unit.name.clone()) {
            anyhow::bail!(
                "unit name '{}' declared by '{}' is already used by another file",
                unit.name,
                file_path.display()
            );
        }

        let name = unit.name.clone();
        self.loaded_files.insert(canonical_path.clone(), name.clone());
        self.units.push(LoadedUnit {
            path: Some(canonical_path),
            unit,
            dependencies: dependency_names,
        });

        Ok(name)
    }

    fn load_dependencies(&mut self, dependencies: &[String], base_file: &Path) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            tracing::debug!(dependency = %dependency, "resolving dependency");
            let dependency_path = self.resolve_dependency_path(dependency, base_file)?;
            names.push(self.load_internal(&dependency_path)?);
        }
        Ok(names)
    }

    /* All loaded units, every dependency ahead of the units using it */
    pub fn into_units(self) -> Vec<LoadedUnit> {
        self.units
    }

    /* Get the number of loaded files */
    pub fn loaded_file_count(&self) -> usize {
        self.loaded_files.len()
    }
}
