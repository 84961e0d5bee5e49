/* Per-field fragments: one decode-dispatch clause and one encode expression */

use crate::codegen::shared::plan::{
    DecodeAction, DecodeClause, DecodeConversion, EncodeConversion, EncodeOp, FieldPlan, PayloadShape,
};

/* Clause of the `fun` passed to `protocol_buffers:decode/3`, without the
 * leading `fun`/indent and without the trailing separator */
pub fn emit_decode_clause(record: &str, field: &FieldPlan, clause: &DecodeClause) -> String {
    let (payload, expr) = match &clause.conversion {
        /* Sub-messages bind the raw payload directly */
        DecodeConversion::DecodeMessage { function, .. } => {
            ("{length_encoded,Bin}".to_string(), format!("{}(Bin)", function))
        }
        DecodeConversion::Cast { target } => (
            payload_pattern(clause.shape),
            format!("protocol_buffers:cast({},Val)", target.runtime_name()),
        ),
        DecodeConversion::ToSymbol { function, .. } => (
            payload_pattern(clause.shape),
            format!("{}(protocol_buffers:cast(int32,Val))", function),
        ),
    };

    let accessor = &field.accessor;
    if clause.requires_list {
        let value = match clause.action {
            DecodeAction::Concat => expr,
            DecodeAction::Append | DecodeAction::Replace => format!("[{}]", expr),
        };
        format!(
            "({},{},#{rec}{{{acc}=F}}=Rec) when is_list(F) -> Rec#{rec}{{{acc} = F ++ {}}}",
            clause.number,
            payload,
            value,
            rec = record,
            acc = accessor
        )
    } else {
        format!(
            "({},{},Rec) -> Rec#{}{{{} = {}}}",
            clause.number, payload, record, accessor, expr
        )
    }
}

fn payload_pattern(shape: PayloadShape) -> String {
    match shape {
        PayloadShape::Any => "Val".to_string(),
        PayloadShape::LengthEncoded => "{length_encoded,_}=Val".to_string(),
        PayloadShape::Varint => "{varint,_}=Val".to_string(),
    }
}

/* Element of the list returned by `encode_X/1` */
pub fn emit_encode_expr(record: &str, field: &FieldPlan, op: &EncodeOp) -> String {
    let wire = op.wire.runtime_name();
    let source = if op.per_element {
        "X".to_string()
    } else {
        format!("R#{}.{}", record, field.accessor)
    };
    let value = match &op.conversion {
        EncodeConversion::Identity => source,
        EncodeConversion::EncodeMessage { function, .. } | EncodeConversion::FromSymbol { function, .. } => {
            format!("{}({})", function, source)
        }
    };
    let encode = format!("protocol_buffers:encode({},{},{})", op.number, wire, value);
    if op.per_element {
        format!("[{} || X <- R#{}.{}]", encode, record, field.accessor)
    } else {
        encode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::shared::naming::FunctionRef;
    use crate::codegen::shared::plan::{CastTarget, EncodeWire};
    use crate::schema::ScalarType;

    fn field(accessor: &str, repeated: bool) -> FieldPlan {
        FieldPlan {
            name: accessor.into(),
            accessor: accessor.into(),
            number: 3,
            repeated,
            decode: vec![],
            encode: None,
            excluded: None,
        }
    }

    #[test]
    fn packed_and_single_clauses() {
        let f = field("ids", true);
        let cast = DecodeConversion::Cast {
            target: CastTarget::Scalar(ScalarType::Uint32),
        };
        let packed = DecodeClause {
            number: 3,
            shape: PayloadShape::LengthEncoded,
            requires_list: true,
            action: DecodeAction::Concat,
            conversion: cast.clone(),
        };
        let single = DecodeClause {
            number: 3,
            shape: PayloadShape::Any,
            requires_list: true,
            action: DecodeAction::Append,
            conversion: cast,
        };
        assert_eq!(
            emit_decode_clause("msg", &f, &packed),
            "(3,{length_encoded,_}=Val,#msg{ids=F}=Rec) when is_list(F) -> Rec#msg{ids = F ++ protocol_buffers:cast(uint32,Val)}"
        );
        assert_eq!(
            emit_decode_clause("msg", &f, &single),
            "(3,Val,#msg{ids=F}=Rec) when is_list(F) -> Rec#msg{ids = F ++ [protocol_buffers:cast(uint32,Val)]}"
        );
    }

    #[test]
    fn message_and_enum_clauses() {
        let f = field("inner", false);
        let clause = DecodeClause {
            number: 3,
            shape: PayloadShape::LengthEncoded,
            requires_list: false,
            action: DecodeAction::Replace,
            conversion: DecodeConversion::DecodeMessage {
                type_name: ".Inner".into(),
                function: FunctionRef::local("decode_inner"),
            },
        };
        assert_eq!(
            emit_decode_clause("outer", &f, &clause),
            "(3,{length_encoded,Bin},Rec) -> Rec#outer{inner = decode_inner(Bin)}"
        );

        let clause = DecodeClause {
            number: 3,
            shape: PayloadShape::Varint,
            requires_list: false,
            action: DecodeAction::Replace,
            conversion: DecodeConversion::ToSymbol {
                type_name: ".Color".into(),
                function: FunctionRef {
                    module: Some("common_pb".into()),
                    name: "to_color".into(),
                },
            },
        };
        assert_eq!(
            emit_decode_clause("outer", &f, &clause),
            "(3,{varint,_}=Val,Rec) -> Rec#outer{inner = common_pb:to_color(protocol_buffers:cast(int32,Val))}"
        );
    }

    #[test]
    fn encode_expressions() {
        let op = EncodeOp {
            number: 3,
            per_element: true,
            wire: EncodeWire::Scalar(ScalarType::Sint64),
            conversion: EncodeConversion::Identity,
        };
        assert_eq!(
            emit_encode_expr("msg", &field("ids", true), &op),
            "[protocol_buffers:encode(3,sint64,X) || X <- R#msg.ids]"
        );

        let op = EncodeOp {
            number: 1,
            per_element: false,
            wire: EncodeWire::Scalar(ScalarType::Int32),
            conversion: EncodeConversion::FromSymbol {
                type_name: ".Color".into(),
                function: FunctionRef::local("from_color"),
            },
        };
        assert_eq!(
            emit_encode_expr("msg", &field("color", false), &op),
            "protocol_buffers:encode(1,int32,from_color(R#msg.color))"
        );

        let op = EncodeOp {
            number: 2,
            per_element: false,
            wire: EncodeWire::LengthEncoded,
            conversion: EncodeConversion::Identity,
        };
        assert_eq!(
            emit_encode_expr("msg", &field("name", false), &op),
            "protocol_buffers:encode(2,length_encoded,R#msg.name)"
        );
    }
}
