use super::banner;
use crate::codegen::shared::plan::{MessagePlan, UnitPlan};
use std::fmt::{self, Write};

/* Emit the `.hrl` with one `-record` per message, nested records first.
 * Repeated fields default to `[]` so the `is_list/1` decode guards match. */
pub fn emit_record_header(plan: &UnitPlan) -> Result<String, fmt::Error> {
    let guard = guard_macro(&plan.module);
    let mut out = banner(&plan.unit_name);
    writeln!(out, "-ifndef({}).", guard)?;
    writeln!(out, "-define({}, true).\n", guard)?;
    for message in plan.messages_preorder() {
        emit_record(&mut out, message)?;
    }
    writeln!(out, "\n-endif.")?;
    Ok(out)
}

fn emit_record(out: &mut String, message: &MessagePlan) -> fmt::Result {
    let fields: Vec<String> = message
        .fields
        .iter()
        .map(|field| {
            if field.repeated {
                format!("{} = []", field.accessor)
            } else {
                field.accessor.clone()
            }
        })
        .collect();
    writeln!(out, "-record({}, {{{}}}).", message.record, fields.join(", "))
}

fn guard_macro(module: &str) -> String {
    let mut guard: String = module
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    guard.push_str("_HRL");
    guard.trim_start_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::plan::FieldPlan;

    fn field(accessor: &str, repeated: bool) -> FieldPlan {
        FieldPlan {
            name: accessor.into(),
            accessor: accessor.into(),
            number: 1,
            repeated,
            decode: vec![],
            encode: None,
            excluded: None,
        }
    }

    #[test]
    fn records_default_repeated_fields_to_empty_list() {
        let inner = MessagePlan {
            full_name: ".Person.PhoneNumber".into(),
            record: "person_phone_number".into(),
            encode_fn: "encode_person_phone_number".into(),
            decode_fn: "decode_person_phone_number".into(),
            nested_enums: vec![],
            nested_messages: vec![],
            fields: vec![field("number", false)],
            skip_unmatched: true,
        };
        let person = MessagePlan {
            full_name: ".Person".into(),
            record: "person".into(),
            encode_fn: "encode_person".into(),
            decode_fn: "decode_person".into(),
            nested_enums: vec![],
            nested_messages: vec![inner],
            fields: vec![field("name", false), field("'end'", false), field("phones", true)],
            skip_unmatched: true,
        };
        let plan = UnitPlan::new("addressbook.proto".into(), "addressbook_pb".into(), vec![], vec![], vec![person]);
        assert_eq!(
            emit_record_header(&plan).unwrap(),
            "%% Generated by erlpb-gen from addressbook.proto. Do not edit.\n\
             -ifndef(ADDRESSBOOK_PB_HRL).\n-define(ADDRESSBOOK_PB_HRL, true).\n\n\
             -record(person_phone_number, {number}).\n\
             -record(person, {name, 'end', phones = []}).\n\n-endif.\n"
        );
    }

    #[test]
    fn guard_macro_from_quoted_module() {
        assert_eq!(guard_macro("'my-file_pb'"), "MY_FILE_PB__HRL");
    }
}
