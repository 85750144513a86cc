//! Leaf encoding contract
//!
//! The tree only ever sees already-encoded scalar payloads. Turning
//! application values into those bytes is the job of a [`LeafEncoder`].
//! [`TaggedEncoder`] is the bundled encoding: one tag byte followed by a
//! fixed, big-endian or UTF-8 payload. No tag is zero, so an encoded scalar
//! can never equal the empty-leaf sentinel.

use crate::model::Value;
use crate::{Error, Result};
use bytes::Bytes;

/// A borrowed application scalar
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Scalar<'a> {
    Bool(bool),
    Integer(i64),
    Unsigned(u64),
    Float(f64),
    Text(&'a str),
    Bytes(&'a [u8]),
}

/// Produces the canonical bytes hashed by a leaf
///
/// Distinct scalars must encode to distinct byte strings.
pub trait LeafEncoder {
    fn encode(&self, scalar: Scalar<'_>) -> Bytes;
}

pub mod tag {
    pub const BOOL: u8 = 0x01;
    pub const INTEGER: u8 = 0x02;
    pub const UNSIGNED: u8 = 0x03;
    pub const FLOAT: u8 = 0x04;
    pub const TEXT: u8 = 0x05;
    pub const BYTES: u8 = 0x06;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedEncoder;

impl LeafEncoder for TaggedEncoder {
    fn encode(&self, scalar: Scalar<'_>) -> Bytes {
        let mut out = Vec::with_capacity(9);
        match scalar {
            Scalar::Bool(b) => {
                out.push(tag::BOOL);
                out.push(b as u8);
            }
            // Non-negative integers that fit i64 always take the signed form
            // so that 5i64 and 5u64 encode identically.
            Scalar::Unsigned(n) if n <= i64::MAX as u64 => {
                out.push(tag::INTEGER);
                out.extend_from_slice(&(n as i64).to_be_bytes());
            }
            Scalar::Integer(n) => {
                out.push(tag::INTEGER);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Scalar::Unsigned(n) => {
                out.push(tag::UNSIGNED);
                out.extend_from_slice(&n.to_be_bytes());
            }
            Scalar::Float(f) => {
                out.push(tag::FLOAT);
                out.extend_from_slice(&f.to_bits().to_be_bytes());
            }
            Scalar::Text(s) => {
                out.reserve(s.len());
                out.push(tag::TEXT);
                out.extend_from_slice(s.as_bytes());
            }
            Scalar::Bytes(b) => {
                out.reserve(b.len());
                out.push(tag::BYTES);
                out.extend_from_slice(b);
            }
        }
        Bytes::from(out)
    }
}

impl Value {
    /// Encode a single scalar into a leaf value
    pub fn from_scalar(encoder: &impl LeafEncoder, scalar: Scalar<'_>) -> Self {
        Value::Scalar(encoder.encode(scalar))
    }

    /// Convert a JSON document into a value, encoding scalars with `encoder`
    ///
    /// JSON `null` becomes [`Value::Null`]; objects become maps, arrays stay
    /// arrays. Numbers that are neither i64 nor u64 are encoded as floats.
    pub fn from_json(json: &serde_json::Value, encoder: &impl LeafEncoder) -> Result<Self> {
        use serde_json::Value as Json;

        Ok(match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::from_scalar(encoder, Scalar::Bool(*b)),
            Json::Number(n) => {
                let scalar = if let Some(i) = n.as_i64() {
                    Scalar::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    Scalar::Unsigned(u)
                } else if let Some(f) = n.as_f64() {
                    Scalar::Float(f)
                } else {
                    return Err(Error::Corruption(format!("unrepresentable number: {}", n)));
                };
                Value::from_scalar(encoder, scalar)
            }
            Json::String(s) => Value::from_scalar(encoder, Scalar::Text(s)),
            Json::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| Value::from_json(item, encoder))
                    .collect::<Result<_>>()?,
            ),
            Json::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v, encoder)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }
}
