//! Erlang protobuf codec generator.
//!
//! Turns resolved schema descriptors into an Erlang module per schema file
//! (`<module>.erl`) plus its record header (`<module>.hrl`). The generated
//! code calls the `protocol_buffers` runtime for primitive wire work; this
//! crate only decides, per field, which decode clauses and which encode
//! expression to emit.
//!
//! The flow is:
//! 1. `schema::resolved::TypeResolver` links loaded descriptor files.
//! 2. `codegen::shared::builder::PlanBuilder` runs the field dispatch and
//!    produces a serialisable `UnitPlan`.
//! 3. `codegen::erlang::ErlangCodeGenerator` renders the plan to text.
//!
//! `runtime::PlanInterpreter` executes the same plans over real wire bytes,
//! which is how the generated dispatch is exercised from Rust.

pub mod cmds;
pub mod codegen;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod schema;
