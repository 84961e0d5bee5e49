//! Descriptor File Loading and Dependency Resolution
//!
//! This crate provides functionality for loading schema descriptor files
//! from disk, following their dependencies through include directories,
//! and converting protoc descriptor sets into the same model so the
//! generator sees one representation regardless of where it came from.

pub mod descriptor_proto;
pub mod file;
pub mod resolver;

// Re-export commonly used types at the crate root
pub use descriptor_proto::{decode_request, file_unit_from_proto, units_from_request};
pub use file::{load_unit, parse_unit, LoadedUnit};
pub use resolver::DependencyResolver;

// Re-export erlpb_types for convenience
pub use erlpb_types;
