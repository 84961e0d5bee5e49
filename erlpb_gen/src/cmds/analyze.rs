/* Analyze command - report resolved types and optionally dump the codec plan */

use super::common::{load_and_resolve, load_options};
use crate::codegen::ErlangCodeGenerator;
use crate::schema::{FieldKind, ResolvedField, ResolvedMessage, ResolvedUnit};
use std::path::PathBuf;

/* Execute the analyze command */
pub fn run(
    files: Vec<PathBuf>,
    include_dirs: Vec<PathBuf>,
    config: Option<PathBuf>,
    print_plan: bool,
) -> anyhow::Result<()> {
    let options = load_options(config.as_deref())?;
    let units = load_and_resolve(&files, include_dirs)?;

    println!("Erlang Codec Generator - Schema Analysis");
    println!("========================================\n");
    for unit in &units {
        print_unit(unit);
    }

    let generator = ErlangCodeGenerator::new(options);
    let mut plans = Vec::with_capacity(units.len());
    for unit in &units {
        let plan = generator
            .plan(unit)
            .map_err(|e| anyhow::anyhow!("dispatch failed for '{}': {}", unit.name, e))?;
        println!(
            "[✓] {} -> {} ({} exported function(s))",
            unit.name,
            plan.module,
            plan.exports.len()
        );
        plans.push(plan);
    }

    if print_plan {
        println!("\n{}", serde_json::to_string_pretty(&plans)?);
    }
    Ok(())
}

fn print_unit(unit: &ResolvedUnit) {
    println!("[~] {}", unit.name);
    if let Some(package) = &unit.package {
        println!("    package: {}", package);
    }
    if !unit.dependencies.is_empty() {
        println!("    depends on: {}", unit.dependencies.join(", "));
    }
    for enum_type in &unit.enums {
        println!("    enum {} ({} values)", enum_type.full_name, enum_type.values.len());
    }
    for message in &unit.messages {
        print_message(message, 4);
    }
    println!();
}

fn print_message(message: &ResolvedMessage, indent: usize) {
    let pad = " ".repeat(indent);
    println!("{}message {}", pad, message.full_name);
    for field in &message.fields {
        println!("{}  {}", pad, field_summary(field));
    }
    for enum_type in &message.nested_enums {
        println!("{}  enum {} ({} values)", pad, enum_type.full_name, enum_type.values.len());
    }
    for nested in &message.nested_messages {
        print_message(nested, indent + 2);
    }
}

/* One report line per field: number, cardinality, kind and notes */
fn field_summary(field: &ResolvedField) -> String {
    let kind = match &field.kind {
        FieldKind::Scalar { scalar, packable } => {
            format!("{}{}", scalar.runtime_name(), if *packable { " (packable)" } else { "" })
        }
        FieldKind::String => "string".to_string(),
        FieldKind::Bytes => "bytes".to_string(),
        FieldKind::Message(target) => format!("message {}", target.full_name),
        FieldKind::Enum(target) => format!("enum {}", target.full_name),
        FieldKind::Group(_) => "group (unsupported)".to_string(),
    };
    let repeated = if field.is_repeated() { "repeated " } else { "" };
    let mut line = format!("{} = {}: {}{}", field.name, field.number, repeated, kind);
    if field.declared_packed {
        line.push_str(" [packed]");
    }
    if field.is_repeated() && matches!(field.kind, FieldKind::Enum(_)) {
        line.push_str(" - packed entries are skipped when decoding");
    }
    line
}
