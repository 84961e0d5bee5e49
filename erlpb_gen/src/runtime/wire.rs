/* Primitive wire codec: the decode/3, encode/3 and cast/2 operations the
 * generated code relies on, over prost's encoding helpers */

use super::value::Value;
use super::{RuntimeError, RuntimeResult};
use crate::codegen::shared::plan::{CastTarget, EncodeWire, PayloadShape};
use crate::schema::{ScalarEncoding, ScalarType};
use prost::bytes::{Buf, BufMut};
use prost::encoding::{WireType, decode_key, decode_varint, encode_key, encode_varint};

/* Tagged payload of one wire entry, before any cast */
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Varint(u64),
    Fixed32(u32),
    Fixed64(u64),
    LengthEncoded(Vec<u8>),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Varint(_) => "varint",
            Payload::Fixed32(_) => "fixed32",
            Payload::Fixed64(_) => "fixed64",
            Payload::LengthEncoded(_) => "length_encoded",
        }
    }

    /* Whether a decode clause with this payload pattern matches */
    pub fn matches(&self, shape: PayloadShape) -> bool {
        match shape {
            PayloadShape::Any => true,
            PayloadShape::LengthEncoded => matches!(self, Payload::LengthEncoded(_)),
            PayloadShape::Varint => matches!(self, Payload::Varint(_)),
        }
    }
}

fn malformed(err: impl std::fmt::Display) -> RuntimeError {
    RuntimeError::Malformed(err.to_string())
}

/* Split a message body into (field number, payload) entries, in wire order.
 * Group-delimited entries are skipped. */
pub fn decode_entries(mut buf: &[u8]) -> RuntimeResult<Vec<(u32, Payload)>> {
    let mut entries = Vec::new();
    while buf.has_remaining() {
        let (number, wire_type) = decode_key(&mut buf).map_err(malformed)?;
        match wire_type {
            WireType::StartGroup => {
                skip_group(number, &mut buf)?;
                tracing::trace!(number, "skipped group entry");
            }
            WireType::EndGroup => {
                return Err(RuntimeError::Malformed(format!("unexpected end of group {}", number)));
            }
            _ => entries.push((number, read_payload(number, wire_type, &mut buf)?)),
        }
    }
    Ok(entries)
}

fn read_payload(number: u32, wire_type: WireType, buf: &mut &[u8]) -> RuntimeResult<Payload> {
    match wire_type {
        WireType::Varint => Ok(Payload::Varint(decode_varint(buf).map_err(malformed)?)),
        WireType::ThirtyTwoBit => {
            need(buf, 4)?;
            Ok(Payload::Fixed32(buf.get_u32_le()))
        }
        WireType::SixtyFourBit => {
            need(buf, 8)?;
            Ok(Payload::Fixed64(buf.get_u64_le()))
        }
        WireType::LengthDelimited => {
            let len = decode_varint(buf).map_err(malformed)?;
            let len = usize::try_from(len).map_err(malformed)?;
            need(buf, len)?;
            let current: &[u8] = *buf;
            let (data, rest) = current.split_at(len);
            *buf = rest;
            Ok(Payload::LengthEncoded(data.to_vec()))
        }
        WireType::StartGroup | WireType::EndGroup => Err(RuntimeError::UnsupportedWireType {
            number,
            wire_type: wire_type as u8,
        }),
    }
}

fn skip_group(number: u32, buf: &mut &[u8]) -> RuntimeResult<()> {
    loop {
        if !buf.has_remaining() {
            return Err(RuntimeError::Malformed(format!("group {} is not terminated", number)));
        }
        let (inner, wire_type) = decode_key(buf).map_err(malformed)?;
        match wire_type {
            WireType::EndGroup if inner == number => return Ok(()),
            WireType::EndGroup => {
                return Err(RuntimeError::Malformed(format!(
                    "group {} closed by end of group {}",
                    number, inner
                )));
            }
            WireType::StartGroup => skip_group(inner, buf)?,
            _ => {
                read_payload(inner, wire_type, buf)?;
            }
        }
    }
}

fn need(buf: &[u8], len: usize) -> RuntimeResult<()> {
    if buf.len() < len {
        return Err(RuntimeError::Malformed(format!(
            "need {} bytes, have {}",
            len,
            buf.len()
        )));
    }
    Ok(())
}

/* Normalise a payload to the declared type. A length-encoded payload cast to
 * a scalar type is a packed run and yields a list. */
pub fn cast(target: CastTarget, payload: &Payload) -> RuntimeResult<Value> {
    match (target, payload) {
        (CastTarget::String, Payload::LengthEncoded(data)) => String::from_utf8(data.clone())
            .map(Value::String)
            .map_err(|e| malformed(format!("invalid utf-8 in string: {}", e))),
        (CastTarget::Bytes, Payload::LengthEncoded(data)) => Ok(Value::Bytes(data.clone())),
        (CastTarget::Scalar(scalar), Payload::LengthEncoded(data)) => unpack(scalar, data),
        (CastTarget::Scalar(scalar), Payload::Varint(v)) => from_varint(scalar, *v),
        (CastTarget::Scalar(scalar), Payload::Fixed32(v)) => from_fixed32(scalar, *v),
        (CastTarget::Scalar(scalar), Payload::Fixed64(v)) => from_fixed64(scalar, *v),
        (CastTarget::String | CastTarget::Bytes, other) => Err(RuntimeError::BadCast {
            target: target.runtime_name(),
            payload: other.kind(),
        }),
    }
}

fn unpack(scalar: ScalarType, mut data: &[u8]) -> RuntimeResult<Value> {
    let mut items = Vec::new();
    while data.has_remaining() {
        let item = match scalar.encoding() {
            ScalarEncoding::Varint => from_varint(scalar, decode_varint(&mut data).map_err(malformed)?)?,
            ScalarEncoding::Fixed32 => {
                need(data, 4)?;
                from_fixed32(scalar, data.get_u32_le())?
            }
            ScalarEncoding::Fixed64 => {
                need(data, 8)?;
                from_fixed64(scalar, data.get_u64_le())?
            }
        };
        items.push(item);
    }
    Ok(Value::List(items))
}

fn bad_cast(scalar: ScalarType, payload: &'static str) -> RuntimeError {
    RuntimeError::BadCast {
        target: scalar.runtime_name(),
        payload,
    }
}

fn from_varint(scalar: ScalarType, v: u64) -> RuntimeResult<Value> {
    Ok(match scalar {
        ScalarType::Int32 => Value::Int((v as i32).into()),
        ScalarType::Int64 => Value::Int((v as i64).into()),
        ScalarType::Uint32 => Value::Int((v as u32).into()),
        ScalarType::Uint64 => Value::Int(v.into()),
        ScalarType::Sint32 => {
            let n = v as u32;
            Value::Int((((n >> 1) as i32) ^ -((n & 1) as i32)).into())
        }
        ScalarType::Sint64 => Value::Int((((v >> 1) as i64) ^ -((v & 1) as i64)).into()),
        ScalarType::Bool => Value::Bool(v != 0),
        _ => return Err(bad_cast(scalar, "varint")),
    })
}

fn from_fixed32(scalar: ScalarType, v: u32) -> RuntimeResult<Value> {
    Ok(match scalar {
        ScalarType::Fixed32 => Value::Int(v.into()),
        ScalarType::Sfixed32 => Value::Int((v as i32).into()),
        ScalarType::Float => Value::Float(f32::from_bits(v).into()),
        _ => return Err(bad_cast(scalar, "fixed32")),
    })
}

fn from_fixed64(scalar: ScalarType, v: u64) -> RuntimeResult<Value> {
    Ok(match scalar {
        ScalarType::Fixed64 => Value::Int(v.into()),
        ScalarType::Sfixed64 => Value::Int((v as i64).into()),
        ScalarType::Double => Value::Float(f64::from_bits(v)),
        _ => return Err(bad_cast(scalar, "fixed64")),
    })
}

/* Append one framed entry to `out`. `undefined` contributes nothing. */
pub fn encode(out: &mut Vec<u8>, number: u32, wire: EncodeWire, value: &Value) -> RuntimeResult<()> {
    if value.is_undefined() {
        return Ok(());
    }
    match wire {
        EncodeWire::LengthEncoded => {
            let data: &[u8] = match value {
                Value::String(s) => s.as_bytes(),
                Value::Bytes(b) => b,
                other => return Err(bad_value("length_encoded", other)),
            };
            encode_key(number, WireType::LengthDelimited, out);
            encode_varint(data.len() as u64, out);
            out.put_slice(data);
        }
        EncodeWire::Scalar(scalar) => encode_scalar(out, number, scalar, value)?,
    }
    Ok(())
}

fn bad_value(wire: &'static str, value: &Value) -> RuntimeError {
    RuntimeError::BadValue {
        wire,
        value: value.to_string(),
    }
}

fn int_in<T: TryFrom<i128>>(scalar: ScalarType, value: &Value) -> RuntimeResult<T> {
    match value {
        Value::Int(n) => T::try_from(*n).map_err(|_| bad_value(scalar.runtime_name(), value)),
        other => Err(bad_value(scalar.runtime_name(), other)),
    }
}

fn float_in(scalar: ScalarType, value: &Value) -> RuntimeResult<f64> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Int(n) => Ok(*n as f64),
        other => Err(bad_value(scalar.runtime_name(), other)),
    }
}

fn encode_scalar(out: &mut Vec<u8>, number: u32, scalar: ScalarType, value: &Value) -> RuntimeResult<()> {
    let wire_type = match scalar.encoding() {
        ScalarEncoding::Varint => WireType::Varint,
        ScalarEncoding::Fixed32 => WireType::ThirtyTwoBit,
        ScalarEncoding::Fixed64 => WireType::SixtyFourBit,
    };
    /* Validate before writing the key so a bad value leaves `out` untouched */
    let mut body = Vec::with_capacity(10);
    match scalar {
        ScalarType::Int32 => encode_varint(int_in::<i32>(scalar, value)? as i64 as u64, &mut body),
        ScalarType::Int64 => encode_varint(int_in::<i64>(scalar, value)? as u64, &mut body),
        ScalarType::Uint32 => encode_varint(int_in::<u32>(scalar, value)?.into(), &mut body),
        ScalarType::Uint64 => encode_varint(int_in::<u64>(scalar, value)?, &mut body),
        ScalarType::Sint32 => {
            let n = int_in::<i32>(scalar, value)?;
            encode_varint(((n << 1) ^ (n >> 31)) as u32 as u64, &mut body)
        }
        ScalarType::Sint64 => {
            let n = int_in::<i64>(scalar, value)?;
            encode_varint(((n << 1) ^ (n >> 63)) as u64, &mut body)
        }
        ScalarType::Bool => match value {
            Value::Bool(b) => encode_varint(u64::from(*b), &mut body),
            other => return Err(bad_value("bool", other)),
        },
        ScalarType::Fixed32 => body.put_u32_le(int_in::<u32>(scalar, value)?),
        ScalarType::Sfixed32 => body.put_i32_le(int_in::<i32>(scalar, value)?),
        ScalarType::Float => body.put_f32_le(float_in(scalar, value)? as f32),
        ScalarType::Fixed64 => body.put_u64_le(int_in::<u64>(scalar, value)?),
        ScalarType::Sfixed64 => body.put_i64_le(int_in::<i64>(scalar, value)?),
        ScalarType::Double => body.put_f64_le(float_in(scalar, value)?),
    }
    encode_key(number, wire_type, out);
    out.put_slice(&body);
    Ok(())
}
