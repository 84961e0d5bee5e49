/* Generator configuration: defaults, optional YAML file, CLI overrides */

use clap::ValueEnum;
use serde_derive::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "generated";
pub const DEFAULT_MODULE_SUFFIX: &str = "_pb";

/// What to do with fields of the (unsupported) group wire type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GroupPolicy {
    /// Leave the field out of decode dispatch and encode output.
    #[default]
    Ignore,
    /// Leave it out, and log a warning naming the field.
    Warn,
    /// Abort generation of the unit.
    Reject,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct GeneratorOptions {
    pub output_dir: PathBuf,
    /// Appended to the schema file stem to form the Erlang module name.
    pub module_suffix: String,
    pub group_policy: GroupPolicy,
    /// End every decode dispatch with a wildcard clause that skips unknown field numbers.
    pub skip_unknown_fields: bool,
    /// Write the `.hrl` record header next to each module.
    pub emit_header: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            module_suffix: DEFAULT_MODULE_SUFFIX.to_string(),
            group_policy: GroupPolicy::Ignore,
            skip_unknown_fields: true,
            emit_header: true,
        }
    }
}

impl GeneratorOptions {
    pub fn from_yaml_str(contents: &str) -> anyhow::Result<Self> {
        Ok(serde_yml::from_str(contents)?)
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config '{}': {}", path.display(), e))?;
        Self::from_yaml_str(&contents)
            .map_err(|e| anyhow::anyhow!("invalid config '{}': {}", path.display(), e))
    }

    /* Parse protoc's `--erl_opt=` parameter string: comma-separated key=value pairs */
    pub fn apply_plugin_parameter(&mut self, parameter: &str) -> anyhow::Result<()> {
        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, "true"));
            match key {
                "module_suffix" | "module-suffix" => self.module_suffix = value.to_string(),
                "group_policy" | "group-policy" => {
                    self.group_policy = GroupPolicy::from_str(value, true)
                        .map_err(|e| anyhow::anyhow!("invalid group policy '{}': {}", value, e))?;
                }
                "skip_unknown_fields" | "skip-unknown-fields" => {
                    self.skip_unknown_fields = parse_bool(key, value)?;
                }
                "emit_header" | "emit-header" => self.emit_header = parse_bool(key, value)?,
                _ => anyhow::bail!("unknown plugin parameter '{}'", key),
            }
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    match value {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => anyhow::bail!("parameter '{}' expects a boolean, got '{}'", key, value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_given_keys() {
        let options = GeneratorOptions::from_yaml_str("group-policy: warn\nmodule-suffix: _proto\n").unwrap();
        assert_eq!(options.group_policy, GroupPolicy::Warn);
        assert_eq!(options.module_suffix, "_proto");
        assert!(options.skip_unknown_fields);
        assert_eq!(options.output_dir, PathBuf::from(DEFAULT_OUTPUT_DIR));
    }

    #[test]
    fn plugin_parameters() {
        let mut options = GeneratorOptions::default();
        options
            .apply_plugin_parameter("group_policy=reject, skip_unknown_fields=false,emit_header")
            .unwrap();
        assert_eq!(options.group_policy, GroupPolicy::Reject);
        assert!(!options.skip_unknown_fields);
        assert!(options.emit_header);

        assert!(options.apply_plugin_parameter("colour=blue").is_err());
        assert!(options.apply_plugin_parameter("emit_header=maybe").is_err());
    }
}
