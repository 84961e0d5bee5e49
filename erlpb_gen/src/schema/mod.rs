pub mod resolved;

pub use resolved::{
    FieldKind, ResolvedEnum, ResolvedField, ResolvedMessage, ResolvedUnit, ScalarEncoding,
    ScalarType, TypeRef, TypeResolver,
};
