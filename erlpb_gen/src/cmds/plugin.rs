/* Plugin command - protoc plugin protocol over stdin/stdout */

use super::common::resolve_units;
use crate::codegen::ErlangCodeGenerator;
use crate::config::GeneratorOptions;
use erlpb_loader::{decode_request, units_from_request};
use prost::Message;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use std::io::{Read, Write};

/* Execute the plugin command: request on stdin, response on stdout */
pub fn run() -> anyhow::Result<()> {
    let mut input = Vec::new();
    std::io::stdin().read_to_end(&mut input)?;
    let request = decode_request(&input)?;

    let response = respond(&request);
    if let Some(error) = &response.error {
        tracing::error!(%error, "generation failed");
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&response.encode_to_vec())?;
    stdout.flush()?;
    Ok(())
}

/* Build the response for a request; failures are reported in `error` */
pub fn respond(request: &CodeGeneratorRequest) -> CodeGeneratorResponse {
    /* proto3 `optional` fields are plain singular fields here */
    let supported_features = Some(Feature::Proto3Optional as u64);
    match generate_files(request) {
        Ok(file) => CodeGeneratorResponse {
            file,
            supported_features,
            ..Default::default()
        },
        Err(e) => CodeGeneratorResponse {
            error: Some(format!("{:#}", e)),
            supported_features,
            ..Default::default()
        },
    }
}

fn generate_files(request: &CodeGeneratorRequest) -> anyhow::Result<Vec<File>> {
    let mut options = GeneratorOptions::default();
    if let Some(parameter) = request.parameter.as_deref() {
        options.apply_plugin_parameter(parameter)?;
    }

    let units = resolve_units(units_from_request(request)?)?;
    let generator = ErlangCodeGenerator::new(options);

    let mut files = Vec::new();
    for name in &request.file_to_generate {
        let unit = units
            .iter()
            .find(|unit| &unit.name == name)
            .ok_or_else(|| anyhow::anyhow!("file to generate '{}' is not in the request", name))?;
        let generated = generator
            .generate(unit)
            .map_err(|e| anyhow::anyhow!("code generation failed for '{}': {}", name, e))?;
        for (file_name, contents) in generated.files() {
            files.push(File {
                name: Some(file_name),
                content: Some(contents.to_string()),
                ..Default::default()
            });
        }
    }
    Ok(files)
}
