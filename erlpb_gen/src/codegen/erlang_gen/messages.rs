use super::enums::emit_enum_codec;
use super::fields::{emit_decode_clause, emit_encode_expr};
use crate::codegen::shared::plan::MessagePlan;
use std::fmt::{self, Write};

const CLAUSE_INDENT: &str = "        ";

/* Emit codecs for the nested enums, then the nested messages, then
 * `decode_X/1` and `encode_X/1` of the message itself */
pub fn emit_message_codec(out: &mut String, plan: &MessagePlan) -> fmt::Result {
    for enum_plan in &plan.nested_enums {
        emit_enum_codec(out, enum_plan)?;
    }
    for nested in &plan.nested_messages {
        emit_message_codec(out, nested)?;
    }
    emit_decode_fn(out, plan)?;
    emit_encode_fn(out, plan)
}

fn emit_decode_fn(out: &mut String, plan: &MessagePlan) -> fmt::Result {
    let record = &plan.record;
    writeln!(out, "{}(<<>>) -> #{}{{}};", plan.decode_fn, record)?;
    writeln!(out, "{}(Binary) ->", plan.decode_fn)?;
    writeln!(out, "  protocol_buffers:decode(Binary,#{}{{}},", record)?;

    let mut clauses: Vec<String> = plan
        .decode_clauses()
        .map(|(field, clause)| emit_decode_clause(record, field, clause))
        .collect();
    if plan.skip_unmatched {
        clauses.push("(_,_,Rec) -> Rec".to_string());
    }

    for (i, clause) in clauses.iter().enumerate() {
        let lead = if i == 0 { "     fun" } else { CLAUSE_INDENT };
        let sep = if i + 1 < clauses.len() { ";" } else { "" };
        writeln!(out, "{}{}{}", lead, clause, sep)?;
    }
    writeln!(out, "     end).\n")
}

fn emit_encode_fn(out: &mut String, plan: &MessagePlan) -> fmt::Result {
    let record = &plan.record;
    writeln!(out, "{}(undefined) -> undefined;", plan.encode_fn)?;
    writeln!(out, "{}(R) when is_record(R,{}) ->", plan.encode_fn, record)?;

    let exprs: Vec<String> = plan
        .encode_ops()
        .map(|(field, op)| emit_encode_expr(record, field, op))
        .collect();
    if exprs.is_empty() {
        return writeln!(out, "  [].\n");
    }
    writeln!(out, "  [")?;
    writeln!(out, "    {}", exprs.join(",\n    "))?;
    writeln!(out, "  ].\n")
}
