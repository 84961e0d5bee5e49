use crate::codegen::shared::plan::EnumPlan;
use std::fmt::{self, Write};

/* Emit `to_X/1` and `from_X/1` for one enum: one clause per declared value
 * in declaration order, then the `undefined` pass-through */
pub fn emit_enum_codec(out: &mut String, plan: &EnumPlan) -> fmt::Result {
    for case in &plan.cases {
        writeln!(out, "{}({}) -> {};", plan.to_symbol, case.number, case.symbol)?;
    }
    writeln!(out, "{}(undefined) -> undefined.\n", plan.to_symbol)?;

    for case in &plan.cases {
        writeln!(out, "{}({}) -> {};", plan.from_symbol, case.symbol, case.number)?;
    }
    writeln!(out, "{}(undefined) -> undefined.\n", plan.from_symbol)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::plan::EnumCase;

    #[test]
    fn emits_both_directions_with_sentinel_last() {
        let plan = EnumPlan {
            full_name: ".tutorial.Person.PhoneType".into(),
            to_symbol: "to_person_phone_type".into(),
            from_symbol: "from_person_phone_type".into(),
            cases: vec![
                EnumCase {
                    symbol: "mobile".into(),
                    number: 0,
                },
                EnumCase {
                    symbol: "work".into(),
                    number: -2,
                },
            ],
        };
        let mut out = String::new();
        emit_enum_codec(&mut out, &plan).unwrap();
        assert_eq!(
            out,
            "to_person_phone_type(0) -> mobile;\n\
             to_person_phone_type(-2) -> work;\n\
             to_person_phone_type(undefined) -> undefined.\n\n\
             from_person_phone_type(mobile) -> 0;\n\
             from_person_phone_type(work) -> -2;\n\
             from_person_phone_type(undefined) -> undefined.\n\n"
        );
    }

    #[test]
    fn empty_enum_still_has_sentinel_clause() {
        let plan = EnumPlan {
            full_name: ".E".into(),
            to_symbol: "to_e".into(),
            from_symbol: "from_e".into(),
            cases: vec![],
        };
        let mut out = String::new();
        emit_enum_codec(&mut out, &plan).unwrap();
        assert_eq!(out, "to_e(undefined) -> undefined.\n\nfrom_e(undefined) -> undefined.\n\n");
    }
}
