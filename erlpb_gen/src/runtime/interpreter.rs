use super::value::{Record, Value};
use super::wire::{self, Payload};
use super::{RuntimeError, RuntimeResult};
use crate::codegen::shared::plan::{
    CastTarget, DecodeAction, DecodeClause, DecodeConversion, EncodeConversion, EncodeOp, EnumPlan,
    FieldPlan, MessagePlan, UnitPlan,
};
use crate::schema::ScalarType;
use std::collections::HashMap;

/// Executes codec plans the way the generated Erlang functions behave.
///
/// Holds every message and enum of the given plans by full name, so
/// references between units resolve the same way module-qualified calls do.
pub struct PlanInterpreter<'a> {
    messages: HashMap<&'a str, &'a MessagePlan>,
    enums: HashMap<&'a str, &'a EnumPlan>,
}

impl<'a> PlanInterpreter<'a> {
    pub fn new<I>(plans: I) -> Self
    where
        I: IntoIterator<Item = &'a UnitPlan>,
    {
        let mut messages = HashMap::new();
        let mut enums = HashMap::new();
        for plan in plans {
            for message in plan.messages_preorder() {
                messages.insert(message.full_name.as_str(), message);
            }
            for enum_plan in plan.all_enums() {
                enums.insert(enum_plan.full_name.as_str(), enum_plan);
            }
        }
        Self { messages, enums }
    }

    pub fn message(&self, full_name: &str) -> RuntimeResult<&'a MessagePlan> {
        self.messages
            .get(full_name)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownType {
                type_name: full_name.to_string(),
            })
    }

    pub fn enum_plan(&self, full_name: &str) -> RuntimeResult<&'a EnumPlan> {
        self.enums
            .get(full_name)
            .copied()
            .ok_or_else(|| RuntimeError::UnknownType {
                type_name: full_name.to_string(),
            })
    }

    /// `#X{}`: singular fields `undefined`, repeated fields `[]`.
    pub fn default_value(&self, message: &MessagePlan) -> Value {
        Value::Record(default_record(message))
    }

    /// `decode_X/1`.
    pub fn decode(&self, full_name: &str, bytes: &[u8]) -> RuntimeResult<Value> {
        let message = self.message(full_name)?;
        self.decode_message(message, bytes)
    }

    fn decode_message(&self, message: &MessagePlan, bytes: &[u8]) -> RuntimeResult<Value> {
        let mut record = default_record(message);
        if bytes.is_empty() {
            return Ok(Value::Record(record));
        }
        for (number, payload) in wire::decode_entries(bytes)? {
            self.dispatch(message, &mut record, number, &payload)?;
        }
        Ok(Value::Record(record))
    }

    /* One call of the decode `fun`: first matching clause wins */
    fn dispatch(&self, message: &MessagePlan, record: &mut Record, number: u32, payload: &Payload) -> RuntimeResult<()> {
        let matched = message.decode_clauses().find(|(field, clause)| {
            clause.number == number
                && payload.matches(clause.shape)
                && (!clause.requires_list || record.get(&field.accessor).as_list().is_some())
        });
        match matched {
            Some((field, clause)) => self.apply(record, field, clause, payload),
            None if message.skip_unmatched => {
                tracing::trace!(message = %message.full_name, number, "skipped entry");
                Ok(())
            }
            None => Err(RuntimeError::NoMatchingClause {
                message: message.full_name.clone(),
                number,
            }),
        }
    }

    fn apply(&self, record: &mut Record, field: &FieldPlan, clause: &DecodeClause, payload: &Payload) -> RuntimeResult<()> {
        let decoded = self.convert_payload(&clause.conversion, payload)?;
        let updated = match clause.action {
            DecodeAction::Replace => decoded,
            DecodeAction::Append | DecodeAction::Concat => {
                let mut items = record.get(&field.accessor).as_list().map(<[Value]>::to_vec).unwrap_or_default();
                match (clause.action, decoded) {
                    (DecodeAction::Concat, Value::List(more)) => items.extend(more),
                    (DecodeAction::Concat, other) => {
                        return Err(RuntimeError::BadValue {
                            wire: "packed",
                            value: other.to_string(),
                        });
                    }
                    (_, one) => items.push(one),
                }
                Value::List(items)
            }
        };
        record.set(&field.accessor, updated);
        Ok(())
    }

    fn convert_payload(&self, conversion: &DecodeConversion, payload: &Payload) -> RuntimeResult<Value> {
        match conversion {
            DecodeConversion::Cast { target } => wire::cast(*target, payload),
            DecodeConversion::DecodeMessage { type_name, .. } => match payload {
                Payload::LengthEncoded(bytes) => self.decode(type_name, bytes),
                other => Err(RuntimeError::BadCast {
                    target: "message",
                    payload: other.kind(),
                }),
            },
            DecodeConversion::ToSymbol { type_name, .. } => {
                let number = wire::cast(CastTarget::Scalar(ScalarType::Int32), payload)?;
                self.to_symbol(type_name, &number)
            }
        }
    }

    /// `encode_X/1`. `Ok(None)` is the `undefined` result for an absent message.
    pub fn encode(&self, full_name: &str, value: &Value) -> RuntimeResult<Option<Vec<u8>>> {
        let message = self.message(full_name)?;
        self.encode_message(message, value)
    }

    fn encode_message(&self, message: &MessagePlan, value: &Value) -> RuntimeResult<Option<Vec<u8>>> {
        let record = match value {
            Value::Undefined => return Ok(None),
            Value::Record(record) if record.name == message.record => record,
            other => {
                return Err(RuntimeError::NotARecord {
                    message: message.full_name.clone(),
                    record: message.record.clone(),
                    found: other.to_string(),
                });
            }
        };

        let mut out = Vec::new();
        for (field, op) in message.encode_ops() {
            let current = record.get(&field.accessor);
            if op.per_element {
                let items = current.as_list().ok_or_else(|| RuntimeError::NotAList {
                    message: message.full_name.clone(),
                    field: field.name.clone(),
                })?;
                for item in items {
                    self.encode_one(&mut out, op, item)?;
                }
            } else {
                self.encode_one(&mut out, op, current)?;
            }
        }
        Ok(Some(out))
    }

    fn encode_one(&self, out: &mut Vec<u8>, op: &EncodeOp, value: &Value) -> RuntimeResult<()> {
        let converted = match &op.conversion {
            EncodeConversion::Identity => value.clone(),
            EncodeConversion::EncodeMessage { type_name, .. } => match self.encode(type_name, value)? {
                Some(bytes) => Value::Bytes(bytes),
                None => Value::Undefined,
            },
            EncodeConversion::FromSymbol { type_name, .. } => self.from_symbol(type_name, value)?,
        };
        wire::encode(out, op.number, op.wire, &converted)
    }

    /// `to_X/1`: wire integer to symbol, `undefined` passes through.
    pub fn to_symbol(&self, full_name: &str, input: &Value) -> RuntimeResult<Value> {
        let enum_plan = self.enum_plan(full_name)?;
        /* Declared clauses first, the sentinel clause last */
        match enum_plan
            .cases
            .iter()
            .find(|case| matches!(input, Value::Int(n) if *n == i128::from(case.number)))
        {
            Some(case) => Ok(symbol_value(&case.symbol)),
            None if input.is_undefined() => Ok(Value::Undefined),
            None => Err(unknown_case(enum_plan, input)),
        }
    }

    /// `from_X/1`: symbol to wire integer, `undefined` passes through.
    pub fn from_symbol(&self, full_name: &str, input: &Value) -> RuntimeResult<Value> {
        let enum_plan = self.enum_plan(full_name)?;
        match enum_plan
            .cases
            .iter()
            .find(|case| symbol_value(&case.symbol) == *input)
        {
            Some(case) => Ok(Value::Int(case.number.into())),
            None if input.is_undefined() => Ok(Value::Undefined),
            None => Err(unknown_case(enum_plan, input)),
        }
    }
}

/* `#X{}` with singular fields `undefined` and repeated fields `[]` */
fn default_record(message: &MessagePlan) -> Record {
    let mut record = Record::new(message.record.clone());
    for field in &message.fields {
        let initial = if field.repeated {
            Value::List(Vec::new())
        } else {
            Value::Undefined
        };
        record.set(&field.accessor, initial);
    }
    record
}

/* The atom `undefined` is the sentinel itself */
fn symbol_value(symbol: &str) -> Value {
    if symbol == "undefined" {
        Value::Undefined
    } else {
        Value::Atom(symbol.to_string())
    }
}

fn unknown_case(enum_plan: &EnumPlan, input: &Value) -> RuntimeError {
    RuntimeError::UnknownEnumCase {
        enum_name: enum_plan.full_name.clone(),
        input: input.to_string(),
    }
}
