/* Field taxonomy dispatch: which decode clauses and which encode expression
 * a field gets, keyed on {kind, cardinality, packability} */

use super::naming::SymbolNames;
use super::plan::{
    CastTarget, DecodeAction, DecodeClause, DecodeConversion, EncodeConversion, EncodeOp, EncodeWire,
    PayloadShape,
};
use crate::schema::{FieldKind, ResolvedField, ScalarType};

/* Resolved context a field is dispatched in */
pub struct DispatchContext<'a> {
    pub names: &'a dyn SymbolNames,
    /* Unit being generated; references into other units get module-qualified */
    pub unit: &'a str,
}

/* Decode clauses for one field, in the order they must be tried.
 * Group fields get none. */
pub fn decode_clauses(ctx: &DispatchContext<'_>, field: &ResolvedField) -> Vec<DecodeClause> {
    let repeated = field.is_repeated();
    let single = |shape: PayloadShape, conversion: DecodeConversion| DecodeClause {
        number: field.number,
        shape,
        requires_list: repeated,
        action: if repeated { DecodeAction::Append } else { DecodeAction::Replace },
        conversion,
    };

    match &field.kind {
        FieldKind::Scalar { scalar, packable } => {
            let cast = DecodeConversion::Cast {
                target: CastTarget::Scalar(*scalar),
            };
            if repeated && *packable {
                /* The sender picks packed or unpacked, so accept both */
                vec![
                    DecodeClause {
                        number: field.number,
                        shape: PayloadShape::LengthEncoded,
                        requires_list: true,
                        action: DecodeAction::Concat,
                        conversion: cast.clone(),
                    },
                    single(PayloadShape::Any, cast),
                ]
            } else {
                vec![single(PayloadShape::Any, cast)]
            }
        }
        FieldKind::String => vec![single(
            PayloadShape::Any,
            DecodeConversion::Cast {
                target: CastTarget::String,
            },
        )],
        FieldKind::Bytes => vec![single(
            PayloadShape::Any,
            DecodeConversion::Cast {
                target: CastTarget::Bytes,
            },
        )],
        FieldKind::Message(target) => vec![single(
            PayloadShape::LengthEncoded,
            DecodeConversion::DecodeMessage {
                type_name: target.full_name.clone(),
                function: ctx
                    .names
                    .function_ref(target, ctx.unit, ctx.names.decode_fn(&target.scope)),
            },
        )],
        FieldKind::Enum(target) => vec![single(
            PayloadShape::Varint,
            DecodeConversion::ToSymbol {
                type_name: target.full_name.clone(),
                function: ctx
                    .names
                    .function_ref(target, ctx.unit, ctx.names.to_symbol_fn(&target.scope)),
            },
        )],
        FieldKind::Group(_) => Vec::new(),
    }
}

/* Encode expression for one field; `None` for group fields */
pub fn encode_op(ctx: &DispatchContext<'_>, field: &ResolvedField) -> Option<EncodeOp> {
    let (wire, conversion) = match &field.kind {
        /* Packing is never attempted on the encode side */
        FieldKind::Scalar { scalar, .. } => (EncodeWire::Scalar(*scalar), EncodeConversion::Identity),
        FieldKind::String | FieldKind::Bytes => (EncodeWire::LengthEncoded, EncodeConversion::Identity),
        FieldKind::Message(target) => (
            EncodeWire::LengthEncoded,
            EncodeConversion::EncodeMessage {
                type_name: target.full_name.clone(),
                function: ctx
                    .names
                    .function_ref(target, ctx.unit, ctx.names.encode_fn(&target.scope)),
            },
        ),
        FieldKind::Enum(target) => (
            EncodeWire::Scalar(ScalarType::Int32),
            EncodeConversion::FromSymbol {
                type_name: target.full_name.clone(),
                function: ctx
                    .names
                    .function_ref(target, ctx.unit, ctx.names.from_symbol_fn(&target.scope)),
            },
        ),
        FieldKind::Group(_) => return None,
    };
    Some(EncodeOp {
        number: field.number,
        per_element: field.is_repeated(),
        wire,
        conversion,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::naming::ErlangNames;
    use crate::schema::TypeRef;
    use erlpb_types::Cardinality;

    fn field(kind: FieldKind, cardinality: Cardinality) -> ResolvedField {
        ResolvedField {
            name: "f".into(),
            number: 7,
            cardinality,
            kind,
            declared_packed: false,
        }
    }

    fn type_ref(name: &str, unit: &str) -> TypeRef {
        TypeRef {
            full_name: format!(".pkg.{}", name),
            scope: vec![name.to_string()],
            unit: unit.into(),
        }
    }

    #[test]
    fn repeated_packable_scalar_accepts_packed_before_single() {
        let names = ErlangNames::default();
        let ctx = DispatchContext { names: &names, unit: "u.proto" };
        let f = field(
            FieldKind::Scalar {
                scalar: ScalarType::Int32,
                packable: true,
            },
            Cardinality::Repeated,
        );
        let clauses = decode_clauses(&ctx, &f);
        assert_eq!(clauses.len(), 2);
        assert_eq!(clauses[0].shape, PayloadShape::LengthEncoded);
        assert_eq!(clauses[0].action, DecodeAction::Concat);
        assert_eq!(clauses[1].shape, PayloadShape::Any);
        assert_eq!(clauses[1].action, DecodeAction::Append);
        assert!(clauses.iter().all(|c| c.requires_list));

        let op = encode_op(&ctx, &f).unwrap();
        assert!(op.per_element);
        assert_eq!(op.wire, EncodeWire::Scalar(ScalarType::Int32));
    }

    #[test]
    fn singular_scalar_replaces() {
        let names = ErlangNames::default();
        let ctx = DispatchContext { names: &names, unit: "u.proto" };
        let f = field(
            FieldKind::Scalar {
                scalar: ScalarType::Double,
                packable: true,
            },
            Cardinality::Singular,
        );
        let clauses = decode_clauses(&ctx, &f);
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].action, DecodeAction::Replace);
        assert!(!clauses[0].requires_list);
        assert!(!encode_op(&ctx, &f).unwrap().per_element);
    }

    #[test]
    fn repeated_strings_append_single_clause() {
        let names = ErlangNames::default();
        let ctx = DispatchContext { names: &names, unit: "u.proto" };
        let clauses = decode_clauses(&ctx, &field(FieldKind::String, Cardinality::Repeated));
        assert_eq!(clauses.len(), 1);
        assert_eq!(clauses[0].action, DecodeAction::Append);
        let op = encode_op(&ctx, &field(FieldKind::Bytes, Cardinality::Repeated)).unwrap();
        assert_eq!(op.wire, EncodeWire::LengthEncoded);
        assert!(op.per_element);
    }

    #[test]
    fn message_and_enum_reference_generated_functions() {
        let names = ErlangNames::default();
        let ctx = DispatchContext { names: &names, unit: "u.proto" };

        let msg = field(FieldKind::Message(type_ref("Inner", "u.proto")), Cardinality::Singular);
        match &decode_clauses(&ctx, &msg)[0].conversion {
            DecodeConversion::DecodeMessage { function, .. } => assert_eq!(function.to_string(), "decode_inner"),
            other => panic!("unexpected {:?}", other),
        }

        let color = field(FieldKind::Enum(type_ref("Color", "common.proto")), Cardinality::Singular);
        let clause = &decode_clauses(&ctx, &color)[0];
        assert_eq!(clause.shape, PayloadShape::Varint);
        match &clause.conversion {
            DecodeConversion::ToSymbol { function, .. } => assert_eq!(function.to_string(), "common_pb:to_color"),
            other => panic!("unexpected {:?}", other),
        }
        let op = encode_op(&ctx, &color).unwrap();
        assert_eq!(op.wire, EncodeWire::Scalar(ScalarType::Int32));
        assert!(matches!(op.conversion, EncodeConversion::FromSymbol { ref function, .. } if function.to_string() == "common_pb:from_color"));
    }

    #[test]
    fn groups_are_excluded() {
        let names = ErlangNames::default();
        let ctx = DispatchContext { names: &names, unit: "u.proto" };
        let g = field(FieldKind::Group(None), Cardinality::Repeated);
        assert!(decode_clauses(&ctx, &g).is_empty());
        assert!(encode_op(&ctx, &g).is_none());
    }
}
