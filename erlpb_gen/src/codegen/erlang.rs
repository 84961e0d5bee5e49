use crate::codegen::erlang_gen::{emit_record_header, emit_unit};
use crate::codegen::shared::builder::PlanBuilder;
use crate::codegen::shared::naming::{ErlangNames, SymbolNames, unquote_atom};
use crate::codegen::shared::plan::UnitPlan;
use crate::config::GeneratorOptions;
use crate::errors::GenError;
use crate::schema::ResolvedUnit;
use std::fs;
use std::path::{Path, PathBuf};

/// Source text generated for one schema unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedUnit {
    pub unit_name: String,
    /// Erlang module name (as an atom).
    pub module: String,
    /// Contents of `<module>.erl`.
    pub source: String,
    /// Contents of `<module>.hrl`, when headers are enabled.
    pub header: Option<String>,
}

impl GeneratedUnit {
    /// File stem shared by the `.erl` and `.hrl` outputs.
    pub fn file_stem(&self) -> String {
        unquote_atom(&self.module)
    }

    pub fn source_file_name(&self) -> String {
        format!("{}.erl", self.file_stem())
    }

    pub fn header_file_name(&self) -> String {
        format!("{}.hrl", self.file_stem())
    }

    /// (file name, contents) pairs in write order.
    pub fn files(&self) -> Vec<(String, &str)> {
        let mut files = vec![(self.source_file_name(), self.source.as_str())];
        if let Some(header) = &self.header {
            files.push((self.header_file_name(), header.as_str()));
        }
        files
    }

    /// Write the generated files into `dir`, creating it if needed.
    pub fn write_to(&self, dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("failed to create '{}': {}", dir.display(), e))?;
        let mut written = Vec::new();
        for (name, contents) in self.files() {
            let path = dir.join(name);
            fs::write(&path, contents)
                .map_err(|e| anyhow::anyhow!("failed to write '{}': {}", path.display(), e))?;
            tracing::debug!(path = %path.display(), "wrote generated file");
            written.push(path);
        }
        Ok(written)
    }
}

/// Generates Erlang codec modules from resolved units.
pub struct ErlangCodeGenerator {
    options: GeneratorOptions,
    names: Box<dyn SymbolNames>,
}

impl ErlangCodeGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        let names = Box::new(ErlangNames::new(options.module_suffix.clone()));
        Self { options, names }
    }

    /// Use a custom naming scheme instead of `ErlangNames`.
    pub fn with_names(options: GeneratorOptions, names: Box<dyn SymbolNames>) -> Self {
        Self { options, names }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Run the field dispatch for `unit` without rendering.
    pub fn plan(&self, unit: &ResolvedUnit) -> Result<UnitPlan, GenError> {
        PlanBuilder::new(self.names.as_ref(), &self.options).build_unit(unit)
    }

    /// Render an already built plan.
    pub fn render(&self, plan: &UnitPlan) -> Result<GeneratedUnit, GenError> {
        let source = emit_unit(plan)?;
        let header = if self.options.emit_header {
            Some(emit_record_header(plan)?)
        } else {
            None
        };
        Ok(GeneratedUnit {
            unit_name: plan.unit_name.clone(),
            module: plan.module.clone(),
            source,
            header,
        })
    }

    pub fn generate(&self, unit: &ResolvedUnit) -> Result<GeneratedUnit, GenError> {
        let plan = self.plan(unit)?;
        let generated = self.render(&plan)?;
        tracing::info!(
            unit = %unit.name,
            module = %generated.module,
            bytes = generated.source.len(),
            "generated module"
        );
        Ok(generated)
    }

    /// Generate every unit, stopping at the first failure.
    pub fn generate_all(&self, units: &[ResolvedUnit]) -> Result<Vec<GeneratedUnit>, GenError> {
        units.iter().map(|unit| self.generate(unit)).collect()
    }
}

impl Default for ErlangCodeGenerator {
    fn default() -> Self {
        Self::new(GeneratorOptions::default())
    }
}
