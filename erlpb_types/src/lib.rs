//! Schema Descriptor Types
//!
//! This crate contains the descriptor data model consumed by the Erlang
//! protobuf generator. It provides pure data structures for representing
//! schema files, messages, enums and fields without any file I/O or code
//! generation logic.

pub mod types;

// Re-export commonly used types at the crate root
pub use types::*;
