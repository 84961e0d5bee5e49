use thiserror::Error;

/// Contract violations found while linking descriptor files.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Two declarations share one fully-qualified name.
    #[error("type '{name}' is declared more than once")]
    DuplicateType { name: String },

    /// A unit lists a dependency that was never loaded.
    #[error("unit '{unit}' depends on unknown unit '{dependency}'")]
    UnknownDependency { unit: String, dependency: String },

    /// Requested unit is not known to the resolver.
    #[error("unit '{unit}' was not loaded")]
    UnknownUnit { unit: String },

    #[error("message '{message}' uses field number {number} for both '{first}' and '{second}'")]
    DuplicateFieldNumber {
        message: String,
        number: u32,
        first: String,
        second: String,
    },

    #[error("field '{message}.{field}' has invalid number {number}")]
    InvalidFieldNumber {
        message: String,
        field: String,
        number: u32,
    },

    #[error("field '{message}.{field}' is missing 'type-name'")]
    MissingTypeName { message: String, field: String },

    #[error("field '{message}.{field}' references unknown type '{type_name}'")]
    UnresolvedType {
        message: String,
        field: String,
        type_name: String,
    },

    /// The reference resolved, but to a message where an enum was required (or vice versa).
    #[error("field '{message}.{field}' expects {expected} but '{type_name}' is not one")]
    WrongTypeKind {
        message: String,
        field: String,
        type_name: String,
        expected: &'static str,
    },

    /// The referenced type lives in a unit that is not a dependency.
    #[error("field '{message}.{field}' references '{type_name}' from unit '{owner}', which is not a dependency")]
    NotImported {
        message: String,
        field: String,
        type_name: String,
        owner: String,
    },
}

/// Errors that abort generation of a unit.
#[derive(Debug, Error)]
pub enum GenError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A group field was found while the group policy is `reject`.
    #[error("field '{message}.{field}' uses the unsupported group wire type")]
    UnsupportedGroup { message: String, field: String },

    /// Two schema names map onto one generated identifier.
    #[error("'{first}' and '{second}' both map to generated name '{generated}' in {scope}")]
    NameCollision {
        scope: String,
        first: String,
        second: String,
        generated: String,
    },

    #[error("failed to format generated source: {0}")]
    Format(#[from] std::fmt::Error),
}
