/* Type resolution: links loaded descriptor files into trees whose fields
 * carry a closed FieldKind, with every type reference resolved */

use crate::errors::ResolveError;
use erlpb_loader::LoadedUnit;
use erlpb_types::{Cardinality, EnumType, EnumValue, Field, MessageType, WireType};
use serde_derive::{Deserialize, Serialize};
use std::collections::HashMap;

/* Highest field number protobuf accepts (2^29 - 1) */
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;
/* Range reserved for the protobuf implementation itself */
pub const RESERVED_FIELD_NUMBERS: std::ops::RangeInclusive<u32> = 19_000..=19_999;

/* How a scalar travels on the wire */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarEncoding {
    Varint,
    Fixed32,
    Fixed64,
}

/* Numeric, boolean and fixed-width wire types */
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    Uint32,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

impl ScalarType {
    pub fn runtime_name(self) -> &'static str {
        match self {
            ScalarType::Double => "double",
            ScalarType::Float => "float",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Int32 => "int32",
            ScalarType::Fixed64 => "fixed64",
            ScalarType::Fixed32 => "fixed32",
            ScalarType::Bool => "bool",
            ScalarType::Uint32 => "uint32",
            ScalarType::Sfixed32 => "sfixed32",
            ScalarType::Sfixed64 => "sfixed64",
            ScalarType::Sint32 => "sint32",
            ScalarType::Sint64 => "sint64",
        }
    }

    pub fn encoding(self) -> ScalarEncoding {
        match self {
            ScalarType::Int64
            | ScalarType::Uint64
            | ScalarType::Int32
            | ScalarType::Bool
            | ScalarType::Uint32
            | ScalarType::Sint32
            | ScalarType::Sint64 => ScalarEncoding::Varint,
            ScalarType::Float | ScalarType::Fixed32 | ScalarType::Sfixed32 => ScalarEncoding::Fixed32,
            ScalarType::Double | ScalarType::Fixed64 | ScalarType::Sfixed64 => ScalarEncoding::Fixed64,
        }
    }

    pub fn is_packable(self) -> bool {
        match self.encoding() {
            ScalarEncoding::Varint | ScalarEncoding::Fixed32 | ScalarEncoding::Fixed64 => true,
        }
    }
}

/* A resolved reference to a message or enum */
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /* Fully-qualified name with leading dot, e.g. ".tutorial.Person" */
    pub full_name: String,
    /* Name path below the package, e.g. ["Person", "PhoneType"] */
    pub scope: Vec<String>,
    /* Unit that declares the type */
    pub unit: String,
}

/* Field taxonomy used by the dispatch */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    Scalar { scalar: ScalarType, packable: bool },
    String,
    Bytes,
    Message(TypeRef),
    Enum(TypeRef),
    /* Unsupported; the reference is kept only for diagnostics */
    Group(Option<TypeRef>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub name: String,
    pub number: u32,
    pub cardinality: Cardinality,
    pub kind: FieldKind,
    pub declared_packed: bool,
}

impl ResolvedField {
    pub fn is_repeated(&self) -> bool {
        self.cardinality.is_repeated()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEnum {
    pub full_name: String,
    pub scope: Vec<String>,
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMessage {
    pub full_name: String,
    pub scope: Vec<String>,
    pub fields: Vec<ResolvedField>,
    pub nested_enums: Vec<ResolvedEnum>,
    pub nested_messages: Vec<ResolvedMessage>,
}

impl ResolvedMessage {
    /* Number of message and enum types in this subtree, self included */
    pub fn type_count(&self) -> usize {
        1 + self.nested_enums.len() + self.nested_messages.iter().map(|m| m.type_count()).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub name: String,
    pub package: Option<String>,
    /* Unit names this unit depends on, in declaration order */
    pub dependencies: Vec<String>,
    pub enums: Vec<ResolvedEnum>,
    pub messages: Vec<ResolvedMessage>,
    /* Messages declared by the direct dependencies, whose records share the
     * generated module's compile scope through the included headers */
    pub included_messages: Vec<TypeRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolKind {
    Message,
    Enum,
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    kind: SymbolKind,
    unit: String,
    scope: Vec<String>,
}

/* Per-field context threaded through reference resolution */
struct FieldContext<'a> {
    unit: &'a LoadedUnit,
    message: &'a str,
    field: &'a Field,
}

pub struct TypeResolver {
    symbols: HashMap<String, SymbolEntry>,
    units: Vec<LoadedUnit>,
    unit_index: HashMap<String, usize>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeResolver {
    pub fn new() -> Self {
        Self {
            symbols: HashMap::new(),
            units: Vec::new(),
            unit_index: HashMap::new(),
        }
    }

    /* Register a unit's declarations in the symbol table */
    pub fn add_unit(&mut self, loaded: LoadedUnit) -> Result<(), ResolveError> {
        let prefix = loaded.unit.package_prefix();
        let unit_name = loaded.unit.name.clone();
        for enum_type in &loaded.unit.enums {
            self.register(&prefix, &[], &enum_type.name, SymbolKind::Enum, &unit_name)?;
        }
        for message in &loaded.unit.messages {
            self.register_message(&prefix, &[], message, &unit_name)?;
        }
        self.unit_index.insert(unit_name, self.units.len());
        self.units.push(loaded);
        Ok(())
    }

    fn register(
        &mut self,
        prefix: &str,
        parent_scope: &[String],
        name: &str,
        kind: SymbolKind,
        unit: &str,
    ) -> Result<(), ResolveError> {
        let mut scope = parent_scope.to_vec();
        scope.push(name.to_string());
        let full_name = format!("{}.{}", prefix, scope.join("."));
        if self.symbols.contains_key(&full_name) {
            return Err(ResolveError::DuplicateType { name: full_name });
        }
        self.symbols.insert(
            full_name,
            SymbolEntry {
                kind,
                unit: unit.to_string(),
                scope,
            },
        );
        Ok(())
    }

    fn register_message(
        &mut self,
        prefix: &str,
        parent_scope: &[String],
        message: &MessageType,
        unit: &str,
    ) -> Result<(), ResolveError> {
        self.register(prefix, parent_scope, &message.name, SymbolKind::Message, unit)?;
        let mut scope = parent_scope.to_vec();
        scope.push(message.name.clone());
        for enum_type in &message.nested_enums {
            self.register(prefix, &scope, &enum_type.name, SymbolKind::Enum, unit)?;
        }
        for nested in &message.nested_messages {
            self.register_message(prefix, &scope, nested, unit)?;
        }
        Ok(())
    }

    /* Resolve every registered unit, in registration order */
    pub fn resolve_all(&self) -> Result<Vec<ResolvedUnit>, ResolveError> {
        self.units.iter().map(|unit| self.resolve_loaded(unit)).collect()
    }

    /* Resolve a single unit by name */
    pub fn resolve_unit(&self, name: &str) -> Result<ResolvedUnit, ResolveError> {
        let index = self
            .unit_index
            .get(name)
            .ok_or_else(|| ResolveError::UnknownUnit { unit: name.to_string() })?;
        self.resolve_loaded(&self.units[*index])
    }

    fn resolve_loaded(&self, loaded: &LoadedUnit) -> Result<ResolvedUnit, ResolveError> {
        for dependency in &loaded.dependencies {
            if !self.unit_index.contains_key(dependency) {
                return Err(ResolveError::UnknownDependency {
                    unit: loaded.unit.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        let prefix = loaded.unit.package_prefix();
        let enums = loaded
            .unit
            .enums
            .iter()
            .map(|e| resolve_enum(&prefix, &[], e))
            .collect();
        let messages = loaded
            .unit
            .messages
            .iter()
            .map(|m| self.resolve_message(loaded, &prefix, &[], m))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(unit = %loaded.unit.name, "resolved unit");
        Ok(ResolvedUnit {
            name: loaded.unit.name.clone(),
            package: loaded.unit.package.clone(),
            dependencies: loaded.dependencies.clone(),
            enums,
            messages,
            included_messages: self.messages_of(&loaded.dependencies),
        })
    }

    /* Every message declared by `units`, per unit in the given order, then by full name */
    fn messages_of(&self, units: &[String]) -> Vec<TypeRef> {
        let mut included = Vec::new();
        for unit in units {
            let mut declared: Vec<TypeRef> = self
                .symbols
                .iter()
                .filter(|(_, entry)| entry.kind == SymbolKind::Message && &entry.unit == unit)
                .map(|(full_name, entry)| TypeRef {
                    full_name: full_name.clone(),
                    scope: entry.scope.clone(),
                    unit: entry.unit.clone(),
                })
                .collect();
            declared.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            included.extend(declared);
        }
        included
    }

    fn resolve_message(
        &self,
        loaded: &LoadedUnit,
        prefix: &str,
        parent_scope: &[String],
        message: &MessageType,
    ) -> Result<ResolvedMessage, ResolveError> {
        let mut scope = parent_scope.to_vec();
        scope.push(message.name.clone());
        let full_name = format!("{}.{}", prefix, scope.join("."));

        let mut seen_numbers: HashMap<u32, &str> = HashMap::new();
        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            if field.number == 0
                || field.number > MAX_FIELD_NUMBER
                || RESERVED_FIELD_NUMBERS.contains(&field.number)
            {
                return Err(ResolveError::InvalidFieldNumber {
                    message: full_name.clone(),
                    field: field.name.clone(),
                    number: field.number,
                });
            }
            if let Some(first) = seen_numbers.insert(field.number, &field.name) {
                return Err(ResolveError::DuplicateFieldNumber {
                    message: full_name.clone(),
                    number: field.number,
                    first: first.to_string(),
                    second: field.name.clone(),
                });
            }
            let ctx = FieldContext {
                unit: loaded,
                message: &full_name,
                field,
            };
            fields.push(ResolvedField {
                name: field.name.clone(),
                number: field.number,
                cardinality: field.cardinality,
                kind: self.field_kind(&ctx)?,
                declared_packed: field.packed,
            });
        }

        let nested_enums = message
            .nested_enums
            .iter()
            .map(|e| resolve_enum(prefix, &scope, e))
            .collect();
        let nested_messages = message
            .nested_messages
            .iter()
            .map(|m| self.resolve_message(loaded, prefix, &scope, m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResolvedMessage {
            full_name,
            scope,
            fields,
            nested_enums,
            nested_messages,
        })
    }

    fn field_kind(&self, ctx: &FieldContext<'_>) -> Result<FieldKind, ResolveError> {
        let scalar = |scalar: ScalarType| FieldKind::Scalar {
            scalar,
            packable: scalar.is_packable(),
        };
        Ok(match ctx.field.wire_type {
            WireType::Double => scalar(ScalarType::Double),
            WireType::Float => scalar(ScalarType::Float),
            WireType::Int64 => scalar(ScalarType::Int64),
            WireType::Uint64 => scalar(ScalarType::Uint64),
            WireType::Int32 => scalar(ScalarType::Int32),
            WireType::Fixed64 => scalar(ScalarType::Fixed64),
            WireType::Fixed32 => scalar(ScalarType::Fixed32),
            WireType::Bool => scalar(ScalarType::Bool),
            WireType::Uint32 => scalar(ScalarType::Uint32),
            WireType::Sfixed32 => scalar(ScalarType::Sfixed32),
            WireType::Sfixed64 => scalar(ScalarType::Sfixed64),
            WireType::Sint32 => scalar(ScalarType::Sint32),
            WireType::Sint64 => scalar(ScalarType::Sint64),
            WireType::String => FieldKind::String,
            WireType::Bytes => FieldKind::Bytes,
            WireType::Message => FieldKind::Message(self.resolve_ref(ctx, SymbolKind::Message)?),
            WireType::Enum => FieldKind::Enum(self.resolve_ref(ctx, SymbolKind::Enum)?),
            /* Groups never reach generated code, so a dangling reference is tolerated */
            WireType::Group => FieldKind::Group(self.resolve_ref(ctx, SymbolKind::Message).ok()),
        })
    }

    fn resolve_ref(&self, ctx: &FieldContext<'_>, expected: SymbolKind) -> Result<TypeRef, ResolveError> {
        let type_name = ctx
            .field
            .type_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| ResolveError::MissingTypeName {
                message: ctx.message.to_string(),
                field: ctx.field.name.clone(),
            })?;

        let (full_name, entry) =
            self.lookup(type_name, ctx.message)
                .ok_or_else(|| ResolveError::UnresolvedType {
                    message: ctx.message.to_string(),
                    field: ctx.field.name.clone(),
                    type_name: type_name.to_string(),
                })?;

        if entry.kind != expected {
            return Err(ResolveError::WrongTypeKind {
                message: ctx.message.to_string(),
                field: ctx.field.name.clone(),
                type_name: full_name,
                expected: match expected {
                    SymbolKind::Message => "a message",
                    SymbolKind::Enum => "an enum",
                },
            });
        }

        if entry.unit != ctx.unit.unit.name && !ctx.unit.dependencies.contains(&entry.unit) {
            return Err(ResolveError::NotImported {
                message: ctx.message.to_string(),
                field: ctx.field.name.clone(),
                type_name: full_name,
                owner: entry.unit.clone(),
            });
        }

        Ok(TypeRef {
            full_name,
            scope: entry.scope.clone(),
            unit: entry.unit.clone(),
        })
    }

    /* Look a name up the way protoc does: fully-qualified names directly,
     * relative names from the innermost scope outwards */
    fn lookup(&self, type_name: &str, scope: &str) -> Option<(String, &SymbolEntry)> {
        if type_name.starts_with('.') {
            return self.symbols.get(type_name).map(|entry| (type_name.to_string(), entry));
        }

        let mut scope = scope.to_string();
        loop {
            let candidate = format!("{}.{}", scope, type_name);
            if let Some(entry) = self.symbols.get(&candidate) {
                return Some((candidate, entry));
            }
            if scope.is_empty() {
                return None;
            }
            match scope.rfind('.') {
                Some(pos) => scope.truncate(pos),
                None => scope.clear(),
            }
        }
    }
}

fn resolve_enum(prefix: &str, parent_scope: &[String], enum_type: &EnumType) -> ResolvedEnum {
    let mut scope = parent_scope.to_vec();
    scope.push(enum_type.name.clone());
    ResolvedEnum {
        full_name: format!("{}.{}", prefix, scope.join(".")),
        scope,
        values: enum_type.values.clone(),
    }
}
