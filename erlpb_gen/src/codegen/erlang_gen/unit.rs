use super::banner;
use super::enums::emit_enum_codec;
use super::messages::emit_message_codec;
use crate::codegen::shared::naming::unquote_atom;
use crate::codegen::shared::plan::UnitPlan;
use std::fmt::{self, Write};

/* Emit the whole `.erl` module: attributes, export list, enum codecs of the
 * file, then message codecs, all in declaration order */
pub fn emit_unit(plan: &UnitPlan) -> Result<String, fmt::Error> {
    let mut out = banner(&plan.unit_name);
    writeln!(out, "-module({}).", plan.module)?;
    for include in &plan.includes {
        writeln!(out, "-include(\"{}.hrl\").", unquote_atom(include))?;
    }
    out.push('\n');

    emit_exports(&mut out, plan)?;

    for enum_plan in &plan.enums {
        emit_enum_codec(&mut out, enum_plan)?;
    }
    for message in &plan.messages {
        emit_message_codec(&mut out, message)?;
    }
    Ok(out)
}

/* One line per type: `to`/`from` or `encode`/`decode` pairs stay together */
fn emit_exports(out: &mut String, plan: &UnitPlan) -> fmt::Result {
    if plan.exports.is_empty() {
        return writeln!(out, "-export([]).\n");
    }
    let lines: Vec<String> = plan
        .exports
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|symbol| format!("{}/{}", symbol.name, symbol.arity))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect();
    writeln!(out, "-export([\n  {}\n]).\n", lines.join(",\n  "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::plan::{EnumPlan, MessagePlan};

    #[test]
    fn empty_unit() {
        let plan = UnitPlan::new("none.proto".into(), "none_pb".into(), vec!["none_pb".into()], vec![], vec![]);
        assert_eq!(
            emit_unit(&plan).unwrap(),
            "%% Generated by erlpb-gen from none.proto. Do not edit.\n\
             -module(none_pb).\n-include(\"none_pb.hrl\").\n\n-export([]).\n\n"
        );
    }

    #[test]
    fn exports_pair_symbols_per_line() {
        let color = EnumPlan {
            full_name: ".Color".into(),
            to_symbol: "to_color".into(),
            from_symbol: "from_color".into(),
            cases: vec![],
        };
        let shape = MessagePlan {
            full_name: ".Shape".into(),
            record: "shape".into(),
            encode_fn: "encode_shape".into(),
            decode_fn: "decode_shape".into(),
            nested_enums: vec![],
            nested_messages: vec![],
            fields: vec![],
            skip_unmatched: true,
        };
        let plan = UnitPlan::new(
            "shapes.proto".into(),
            "shapes_pb".into(),
            vec!["common_pb".into(), "shapes_pb".into()],
            vec![color],
            vec![shape],
        );
        let out = emit_unit(&plan).unwrap();
        assert!(out.contains("-include(\"common_pb.hrl\").\n-include(\"shapes_pb.hrl\").\n"));
        assert!(out.contains("-export([\n  to_color/1,from_color/1,\n  encode_shape/1,decode_shape/1\n]).\n"));
        assert!(out.find("to_color(undefined)").unwrap() < out.find("decode_shape(<<>>)").unwrap());
    }
}
