//! Conversion from protoc descriptors (`prost_types`) into the descriptor
//! model, used when running as a protoc plugin.

use erlpb_types::{Cardinality, EnumType, EnumValue, Field, FileUnit, MessageType, WireType};
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use crate::file::LoadedUnit;

fn wire_type_from_proto(ty: Type) -> WireType {
    match ty {
        Type::Double => WireType::Double,
        Type::Float => WireType::Float,
        Type::Int64 => WireType::Int64,
        Type::Uint64 => WireType::Uint64,
        Type::Int32 => WireType::Int32,
        Type::Fixed64 => WireType::Fixed64,
        Type::Fixed32 => WireType::Fixed32,
        Type::Bool => WireType::Bool,
        Type::String => WireType::String,
        Type::Group => WireType::Group,
        Type::Message => WireType::Message,
        Type::Bytes => WireType::Bytes,
        Type::Uint32 => WireType::Uint32,
        Type::Enum => WireType::Enum,
        Type::Sfixed32 => WireType::Sfixed32,
        Type::Sfixed64 => WireType::Sfixed64,
        Type::Sint32 => WireType::Sint32,
        Type::Sint64 => WireType::Sint64,
    }
}

fn field_from_proto(field: &FieldDescriptorProto, scope: &str) -> anyhow::Result<Field> {
    if field.r#type.is_none() {
        anyhow::bail!("field '{}.{}' has no resolved type", scope, field.name());
    }
    let number = u32::try_from(field.number())
        .map_err(|_| anyhow::anyhow!("field '{}.{}' has negative number {}", scope, field.name(), field.number()))?;
    let cardinality = match field.label() {
        Label::Repeated => Cardinality::Repeated,
        Label::Optional | Label::Required => Cardinality::Singular,
    };
    Ok(Field {
        name: field.name().to_string(),
        number,
        wire_type: wire_type_from_proto(field.r#type()),
        cardinality,
        type_name: field.type_name.clone().filter(|name| !name.is_empty()),
        packed: field.options.as_ref().and_then(|o| o.packed).unwrap_or(false),
    })
}

fn enum_from_proto(descriptor: &EnumDescriptorProto) -> EnumType {
    EnumType {
        name: descriptor.name().to_string(),
        values: descriptor
            .value
            .iter()
            .map(|value| EnumValue {
                name: value.name().to_string(),
                number: value.number(),
            })
            .collect(),
    }
}

fn message_from_proto(descriptor: &DescriptorProto, parent_scope: &str) -> anyhow::Result<MessageType> {
    let scope = format!("{}.{}", parent_scope, descriptor.name());
    let fields = descriptor
        .field
        .iter()
        .map(|field| field_from_proto(field, &scope))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let nested_messages = descriptor
        .nested_type
        .iter()
        .map(|nested| message_from_proto(nested, &scope))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(MessageType {
        name: descriptor.name().to_string(),
        fields,
        nested_messages,
        nested_enums: descriptor.enum_type.iter().map(enum_from_proto).collect(),
    })
}

/* Convert one protoc file descriptor; dependencies stay protoc file names */
pub fn file_unit_from_proto(file: &FileDescriptorProto) -> anyhow::Result<FileUnit> {
    let package = file.package.clone().filter(|pkg| !pkg.is_empty());
    let scope = package.as_deref().map(|pkg| format!(".{}", pkg)).unwrap_or_default();
    let messages = file
        .message_type
        .iter()
        .map(|message| message_from_proto(message, &scope))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(FileUnit {
        name: file.name().to_string(),
        package,
        dependencies: file.dependency.clone(),
        enums: file.enum_type.iter().map(enum_from_proto).collect(),
        messages,
    })
}

/* Decode the request protoc writes to a plugin's stdin */
pub fn decode_request(bytes: &[u8]) -> anyhow::Result<CodeGeneratorRequest> {
    CodeGeneratorRequest::decode(bytes)
        .map_err(|e| anyhow::anyhow!("invalid CodeGeneratorRequest: {}", e))
}

/* Convert every file in a plugin request. protoc sends files in dependency
 * order, which is preserved. */
pub fn units_from_request(request: &CodeGeneratorRequest) -> anyhow::Result<Vec<LoadedUnit>> {
    request
        .proto_file
        .iter()
        .map(|file| {
            tracing::debug!(file = file.name(), "converting file descriptor");
            file_unit_from_proto(file).map(LoadedUnit::from_unit)
        })
        .collect()
}
