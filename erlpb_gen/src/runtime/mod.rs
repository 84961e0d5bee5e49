//! Reference runtime for codec plans.
//!
//! Executes a [`UnitPlan`](crate::codegen::shared::plan::UnitPlan) over real
//! protobuf wire bytes the way the generated Erlang module does on top of
//! `protocol_buffers`: `wire` provides the primitive `decode/3`, `encode/3`
//! and `cast/2` operations, `interpreter` the per-message dispatch.

pub mod interpreter;
pub mod value;
pub mod wire;

pub use interpreter::PlanInterpreter;
pub use value::{Record, Value};
pub use wire::Payload;

use thiserror::Error;

/// Result alias used across the runtime.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failures the generated code would hit at run time (a crash in Erlang).
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeError {
    /// Wire bytes ended or were framed inconsistently.
    #[error("malformed wire data: {0}")]
    Malformed(String),

    /// Wire type the runtime does not support (groups are skipped, not decoded).
    #[error("unsupported wire type {wire_type} for field {number}")]
    UnsupportedWireType { number: u32, wire_type: u8 },

    /// `cast/2` got a payload whose shape does not fit the requested type.
    #[error("cannot cast {payload} payload to {target}")]
    BadCast { target: &'static str, payload: &'static str },

    /// A value handed to `encode/3` does not fit the wire type.
    #[error("value {value} cannot be encoded as {wire}")]
    BadValue { wire: &'static str, value: String },

    /// No decode clause matched and the message has no catch-all clause.
    #[error("no clause of '{message}' matches field {number}")]
    NoMatchingClause { message: String, number: u32 },

    /// `to_X/1` or `from_X/1` got an input with no clause.
    #[error("enum '{enum_name}' has no case for {input}")]
    UnknownEnumCase { enum_name: String, input: String },

    /// The encode guard `is_record(R, X)` failed.
    #[error("encode of '{message}' expects a #{record}{{}} record, got {found}")]
    NotARecord {
        message: String,
        record: String,
        found: String,
    },

    /// A repeated field did not hold a list.
    #[error("field '{field}' of '{message}' must hold a list")]
    NotAList { message: String, field: String },

    /// A plan references a type that none of the loaded plans declares.
    #[error("type '{type_name}' is not part of the loaded plans")]
    UnknownType { type_name: String },
}
