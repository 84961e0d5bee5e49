//! Codec plan shared by the Erlang renderer and the plan interpreter.
//!
//! The plan records every per-field decision the dispatch makes (which
//! decode clauses, which encode expression) together with the resolved
//! names, so rendering is a mechanical walk and the interpreter can execute
//! exactly what the generated module would do.
//!
//! # Example
//! ```
//! use erlpb_gen::codegen::shared::plan::*;
//!
//! let plan = UnitPlan::new("empty.proto".into(), "empty_pb".into(), vec![], vec![], vec![]);
//! assert_eq!(plan.version, PLAN_SCHEMA_VERSION);
//! assert!(plan.exports.is_empty());
//! ```

use serde_derive::{Deserialize, Serialize};

use super::naming::FunctionRef;
use crate::schema::ScalarType;

/// Schema version used for every serialized plan export.
pub const PLAN_SCHEMA_VERSION: u32 = 1;

/// Everything generated for one schema unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitPlan {
    /// Plan schema version (mirrors `PLAN_SCHEMA_VERSION`).
    pub version: u32,
    pub unit_name: String,
    pub module: String,
    /// Modules whose headers the generated module includes, dependencies first.
    pub includes: Vec<String>,
    /// Exported functions, in emission order.
    pub exports: Vec<ExportedSymbol>,
    /// Top-level enums of the unit.
    pub enums: Vec<EnumPlan>,
    /// Top-level messages of the unit, each carrying its nested types.
    pub messages: Vec<MessagePlan>,
}

impl UnitPlan {
    pub fn new(
        unit_name: String,
        module: String,
        includes: Vec<String>,
        enums: Vec<EnumPlan>,
        messages: Vec<MessagePlan>,
    ) -> Self {
        let mut exports = Vec::new();
        for enum_plan in &enums {
            enum_plan.collect_exports(&mut exports);
        }
        for message in &messages {
            message.collect_exports(&mut exports);
        }
        Self {
            version: PLAN_SCHEMA_VERSION,
            unit_name,
            module,
            includes,
            exports,
            enums,
            messages,
        }
    }

    /// Every message plan of the unit, nested types before their container.
    pub fn messages_preorder(&self) -> Vec<&MessagePlan> {
        let mut out = Vec::new();
        for message in &self.messages {
            message.collect_preorder(&mut out);
        }
        out
    }

    /// Every enum plan of the unit, top-level first, then nested ones in emission order.
    pub fn all_enums(&self) -> Vec<&EnumPlan> {
        let mut out: Vec<&EnumPlan> = self.enums.iter().collect();
        for message in self.messages_preorder() {
            out.extend(message.nested_enums.iter());
        }
        out
    }
}

/// One entry of the `-export` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedSymbol {
    pub name: String,
    pub arity: u8,
}

impl ExportedSymbol {
    pub fn unary(name: &str) -> Self {
        Self {
            name: name.to_string(),
            arity: 1,
        }
    }
}

/// Mapping functions for one enum type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumPlan {
    pub full_name: String,
    pub to_symbol: String,
    pub from_symbol: String,
    /// Declared values, in declaration order.
    pub cases: Vec<EnumCase>,
}

impl EnumPlan {
    fn collect_exports(&self, out: &mut Vec<ExportedSymbol>) {
        out.push(ExportedSymbol::unary(&self.to_symbol));
        out.push(ExportedSymbol::unary(&self.from_symbol));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumCase {
    pub symbol: String,
    pub number: i32,
}

/// Codec for one message type plus its nested types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePlan {
    pub full_name: String,
    pub record: String,
    pub encode_fn: String,
    pub decode_fn: String,
    pub nested_enums: Vec<EnumPlan>,
    pub nested_messages: Vec<MessagePlan>,
    pub fields: Vec<FieldPlan>,
    /// Whether the decode dispatch ends with a clause that skips unmatched entries.
    pub skip_unmatched: bool,
}

impl MessagePlan {
    fn collect_exports(&self, out: &mut Vec<ExportedSymbol>) {
        for enum_plan in &self.nested_enums {
            enum_plan.collect_exports(out);
        }
        for nested in &self.nested_messages {
            nested.collect_exports(out);
        }
        out.push(ExportedSymbol::unary(&self.encode_fn));
        out.push(ExportedSymbol::unary(&self.decode_fn));
    }

    fn collect_preorder<'a>(&'a self, out: &mut Vec<&'a MessagePlan>) {
        for nested in &self.nested_messages {
            nested.collect_preorder(out);
        }
        out.push(self);
    }

    /// Decode clauses of all fields, in dispatch order.
    pub fn decode_clauses(&self) -> impl Iterator<Item = (&FieldPlan, &DecodeClause)> {
        self.fields
            .iter()
            .flat_map(|field| field.decode.iter().map(move |clause| (field, clause)))
    }

    /// Encode operations of all fields, in declaration order.
    pub fn encode_ops(&self) -> impl Iterator<Item = (&FieldPlan, &EncodeOp)> {
        self.fields
            .iter()
            .filter_map(|field| field.encode.as_ref().map(|op| (field, op)))
    }
}

/// Per-field result of the dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPlan {
    pub name: String,
    pub accessor: String,
    pub number: u32,
    pub repeated: bool,
    /// Empty for excluded fields.
    pub decode: Vec<DecodeClause>,
    /// `None` for excluded fields.
    pub encode: Option<EncodeOp>,
    /// Set when the field was left out of the codec.
    #[serde(default)]
    pub excluded: Option<Exclusion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Exclusion {
    Group,
}

/// Shape of the payload a clause matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PayloadShape {
    Any,
    LengthEncoded,
    Varint,
}

/// How a decoded value updates the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodeAction {
    /// Overwrite the field.
    Replace,
    /// Append one element to the list.
    Append,
    /// Concatenate a decoded list onto the list.
    Concat,
}

/// Value types `protocol_buffers:cast/2` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scalar", rename_all = "kebab-case")]
pub enum CastTarget {
    Scalar(ScalarType),
    String,
    Bytes,
}

impl CastTarget {
    pub fn runtime_name(self) -> &'static str {
        match self {
            CastTarget::Scalar(scalar) => scalar.runtime_name(),
            CastTarget::String => "string",
            CastTarget::Bytes => "bytes",
        }
    }
}

/// Turns a wire payload into a field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DecodeConversion {
    Cast { target: CastTarget },
    DecodeMessage { type_name: String, function: FunctionRef },
    ToSymbol { type_name: String, function: FunctionRef },
}

/// One clause of the decode dispatch `fun`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeClause {
    pub number: u32,
    pub shape: PayloadShape,
    /// Clause only applies while the field holds a list (repeated fields).
    pub requires_list: bool,
    pub action: DecodeAction,
    pub conversion: DecodeConversion,
}

/// Wire type tag handed to `protocol_buffers:encode/3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "scalar", rename_all = "kebab-case")]
pub enum EncodeWire {
    Scalar(ScalarType),
    LengthEncoded,
}

impl EncodeWire {
    pub fn runtime_name(self) -> &'static str {
        match self {
            EncodeWire::Scalar(scalar) => scalar.runtime_name(),
            EncodeWire::LengthEncoded => "length_encoded",
        }
    }
}

/// Turns a field value into what gets framed on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum EncodeConversion {
    Identity,
    EncodeMessage { type_name: String, function: FunctionRef },
    FromSymbol { type_name: String, function: FunctionRef },
}

/// The encode expression for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOp {
    pub number: u32,
    /// One entry per list element instead of one for the whole value.
    pub per_element: bool,
    pub wire: EncodeWire,
    pub conversion: EncodeConversion,
}
