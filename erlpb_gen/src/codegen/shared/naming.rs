//! Identifier derivation shared by every emitter.
//!
//! The export list, the decode dispatch and the encode bodies all reference
//! the same functions, so they must all obtain names from one
//! [`SymbolNames`] value.

use convert_case::{Case, Casing};
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::config::DEFAULT_MODULE_SUFFIX;
use crate::schema::TypeRef;

/* Words that cannot be bare atoms in Erlang */
const ERLANG_RESERVED: &[&str] = &[
    "after", "and", "andalso", "band", "begin", "bnot", "bor", "bsl", "bsr", "bxor", "case",
    "catch", "cond", "div", "else", "end", "fun", "if", "let", "maybe", "not", "of", "or",
    "orelse", "receive", "rem", "try", "when", "xor",
];

/// A function name, optionally qualified by the module that defines it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    #[serde(default)]
    pub module: Option<String>,
    pub name: String,
}

impl FunctionRef {
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            module: None,
            name: name.into(),
        }
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}:{}", module, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Deterministic naming rules for generated Erlang.
pub trait SymbolNames {
    /// Module name for a schema unit (`addressbook.proto` -> `addressbook_pb`).
    fn module_name(&self, unit_name: &str) -> String;

    /// Unquoted identifier stem for a type path below the package.
    fn type_stem(&self, scope: &[String]) -> String;

    /// Atom naming a record field.
    fn field_accessor(&self, field_name: &str) -> String;

    /// Atom naming an enum value.
    fn enum_symbol(&self, value_name: &str) -> String;

    /// Record name for a type path below the package.
    fn record_name(&self, scope: &[String]) -> String {
        to_atom(&self.type_stem(scope))
    }

    fn encode_fn(&self, scope: &[String]) -> String {
        to_atom(&format!("encode_{}", self.type_stem(scope)))
    }

    fn decode_fn(&self, scope: &[String]) -> String {
        to_atom(&format!("decode_{}", self.type_stem(scope)))
    }

    fn to_symbol_fn(&self, scope: &[String]) -> String {
        to_atom(&format!("to_{}", self.type_stem(scope)))
    }

    fn from_symbol_fn(&self, scope: &[String]) -> String {
        to_atom(&format!("from_{}", self.type_stem(scope)))
    }

    /// Reference to a function of `target`, qualified when `target` lives in
    /// another unit than `current_unit`.
    fn function_ref(&self, target: &TypeRef, current_unit: &str, name: String) -> FunctionRef {
        FunctionRef {
            module: (target.unit != current_unit).then(|| self.module_name(&target.unit)),
            name,
        }
    }
}

/// Default naming: snake_case identifiers, quoted when they are not bare atoms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErlangNames {
    pub module_suffix: String,
}

impl Default for ErlangNames {
    fn default() -> Self {
        Self {
            module_suffix: DEFAULT_MODULE_SUFFIX.to_string(),
        }
    }
}

impl ErlangNames {
    pub fn new(module_suffix: impl Into<String>) -> Self {
        Self {
            module_suffix: module_suffix.into(),
        }
    }
}

impl SymbolNames for ErlangNames {
    fn module_name(&self, unit_name: &str) -> String {
        let stem = Path::new(unit_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(unit_name);
        to_atom(&format!("{}{}", stem.to_case(Case::Snake), self.module_suffix))
    }

    fn type_stem(&self, scope: &[String]) -> String {
        scope
            .iter()
            .map(|segment| segment.to_case(Case::Snake))
            .collect::<Vec<_>>()
            .join("_")
    }

    fn field_accessor(&self, field_name: &str) -> String {
        to_atom(&field_name.to_case(Case::Snake))
    }

    fn enum_symbol(&self, value_name: &str) -> String {
        to_atom(&value_name.to_case(Case::Snake))
    }
}

/* True when `name` can be written as an unquoted atom */
pub fn is_bare_atom(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '@')
        && !ERLANG_RESERVED.contains(&name)
}

/* Render `name` as an Erlang atom, quoting it when needed */
pub fn to_atom(name: &str) -> String {
    if is_bare_atom(name) {
        return name.to_string();
    }
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('\'');
    for c in name.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/* Text of an atom as written by `to_atom`, without the quotes (used for file names) */
pub fn unquote_atom(atom: &str) -> String {
    match atom.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')) {
        Some(inner) => inner.replace("\\'", "'").replace("\\\\", "\\"),
        None => atom.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn derives_function_names_from_scope() {
        let names = ErlangNames::default();
        let person_phone = scope(&["Person", "PhoneNumber"]);
        assert_eq!(names.record_name(&person_phone), "person_phone_number");
        assert_eq!(names.encode_fn(&person_phone), "encode_person_phone_number");
        assert_eq!(names.decode_fn(&person_phone), "decode_person_phone_number");
        assert_eq!(names.to_symbol_fn(&scope(&["Color"])), "to_color");
        assert_eq!(names.from_symbol_fn(&scope(&["Color"])), "from_color");
    }

    #[test]
    fn module_name_uses_file_stem_and_suffix() {
        assert_eq!(ErlangNames::default().module_name("protos/addressbook.proto"), "addressbook_pb");
        assert_eq!(ErlangNames::new("_proto").module_name("common.proto"), "common_proto");
    }

    #[test]
    fn reserved_words_and_odd_names_are_quoted() {
        let names = ErlangNames::default();
        assert_eq!(names.field_accessor("end"), "'end'");
        assert_eq!(names.field_accessor("when"), "'when'");
        assert_eq!(names.field_accessor("id"), "id");
        assert_eq!(names.record_name(&scope(&["End"])), "'end'");
        assert_eq!(names.encode_fn(&scope(&["End"])), "encode_end");
        assert_eq!(names.enum_symbol("MOBILE"), "mobile");
        assert_eq!(to_atom("it's"), "'it\\'s'");
        assert_eq!(to_atom("Upper"), "'Upper'");
        assert_eq!(unquote_atom(&to_atom("it's")), "it's");
        assert_eq!(unquote_atom("plain_pb"), "plain_pb");
    }

    #[test]
    fn cross_unit_references_are_module_qualified() {
        let names = ErlangNames::default();
        let target = TypeRef {
            full_name: ".common.Color".into(),
            scope: scope(&["Color"]),
            unit: "common.proto".into(),
        };
        let remote = names.function_ref(&target, "shapes.proto", names.to_symbol_fn(&target.scope));
        assert_eq!(remote.to_string(), "common_pb:to_color");
        let local = names.function_ref(&target, "common.proto", names.to_symbol_fn(&target.scope));
        assert_eq!(local.to_string(), "to_color");
    }
}
