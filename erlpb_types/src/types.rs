use serde_derive::{Deserialize, Serialize};

/// Declared wire type of a field, mirroring the closed set protoc reports.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WireType {
    Double,
    Float,
    Int64,
    Uint64,
    Int32,
    Fixed64,
    Fixed32,
    Bool,
    String,
    Group,
    Message,
    Bytes,
    Uint32,
    Enum,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    #[default]
    Singular,
    Repeated,
}

impl Cardinality {
    pub fn is_repeated(self) -> bool {
        matches!(self, Cardinality::Repeated)
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct Field {
    pub name: String,
    pub number: u32,
    #[serde(rename = "type")]
    pub wire_type: WireType,
    #[serde(default)]
    pub cardinality: Cardinality,
    /// Referenced message/enum for `message`, `enum` and `group` fields.
    /// Either fully-qualified (leading `.`) or relative to the enclosing scope.
    #[serde(default)]
    pub type_name: Option<String>,
    /// The `[packed = true]` option as declared. Decoding accepts both shapes
    /// regardless, so this is informational.
    #[serde(default)]
    pub packed: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumValue {
    pub name: String,
    pub number: i32,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct EnumType {
    pub name: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct MessageType {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub nested_messages: Vec<MessageType>,
    #[serde(default)]
    pub nested_enums: Vec<EnumType>,
}

/// One schema file: top-level declarations plus the files it depends on.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct FileUnit {
    pub name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub enums: Vec<EnumType>,
    #[serde(default)]
    pub messages: Vec<MessageType>,
}

impl FileUnit {
    /* Package prefix used for full names, e.g. ".tutorial" (empty when unset) */
    pub fn package_prefix(&self) -> String {
        match self.package.as_deref() {
            Some(pkg) if !pkg.is_empty() => format!(".{}", pkg),
            _ => String::new(),
        }
    }
}
