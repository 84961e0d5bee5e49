/* Codegen command - write one Erlang module (and header) per descriptor file */

use super::common::{load_and_resolve, load_options};
use crate::codegen::ErlangCodeGenerator;
use crate::config::GroupPolicy;
use std::path::PathBuf;

/* Command-line overrides applied on top of the config file */
#[derive(Debug, Default, Clone)]
pub struct CodegenOverrides {
    pub output_dir: Option<PathBuf>,
    pub module_suffix: Option<String>,
    pub group_policy: Option<GroupPolicy>,
    pub strict_fields: bool,
    pub no_header: bool,
}

/* Execute the codegen command */
pub fn run(
    files: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
    config: Option<PathBuf>,
    overrides: CodegenOverrides,
) -> anyhow::Result<()> {
    let mut options = load_options(config.as_deref())?;
    if let Some(dir) = overrides.output_dir {
        options.output_dir = dir;
    }
    if let Some(suffix) = overrides.module_suffix {
        options.module_suffix = suffix;
    }
    if let Some(policy) = overrides.group_policy {
        options.group_policy = policy;
    }
    if overrides.strict_fields {
        options.skip_unknown_fields = false;
    }
    if overrides.no_header {
        options.emit_header = false;
    }
    tracing::debug!(?options, "effective generator options");

    let units = load_and_resolve(&files, include_dirs)?;
    let generator = ErlangCodeGenerator::new(options);
    let output_dir = generator.options().output_dir.clone();

    println!("[*] Generating Erlang code for {} unit(s)...", units.len());
    for unit in &units {
        let generated = generator
            .generate(unit)
            .map_err(|e| anyhow::anyhow!("code generation failed for '{}': {}", unit.name, e))?;
        for path in generated.write_to(&output_dir)? {
            println!("[✓] {}", path.display());
        }
    }
    Ok(())
}
