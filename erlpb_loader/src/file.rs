use erlpb_types::FileUnit;
use std::path::{Path, PathBuf};

/* ============================================================================
   Loaded Units
   ============================================================================ */

/* A descriptor file after loading, with its dependencies expressed as unit
 * names rather than the paths written in the file */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedUnit {
    /* Where the unit was read from (None for units received from protoc) */
    pub path: Option<PathBuf>,
    pub unit: FileUnit,
    /* `FileUnit::name` of every dependency, in declaration order */
    pub dependencies: Vec<String>,
}

impl LoadedUnit {
    /* Wrap a unit whose dependency entries already are unit names */
    pub fn from_unit(unit: FileUnit) -> Self {
        let dependencies = unit.dependencies.clone();
        Self {
            path: None,
            unit,
            dependencies,
        }
    }

    pub fn name(&self) -> &str {
        &self.unit.name
    }
}

/* Parse a descriptor document */
pub fn parse_unit(contents: &str) -> anyhow::Result<FileUnit> {
    let unit: FileUnit = serde_yml::from_str(contents)?;
    if unit.name.trim().is_empty() {
        anyhow::bail!("descriptor file has an empty 'name'");
    }
    Ok(unit)
}

/* Read and parse a descriptor file from disk */
pub fn load_unit(path: &Path) -> anyhow::Result<FileUnit> {
    let file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("failed to open '{}': {}", path.display(), e))?;
    let contents = std::io::read_to_string(file)?;
    parse_unit(&contents).map_err(|e| anyhow::anyhow!("failed to parse '{}': {}", path.display(), e))
}
