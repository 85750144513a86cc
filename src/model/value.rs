//! Generic nested value model (GTV-style)

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// The shape of input data hashed by the tree builder
///
/// Scalars are already encoded: the tree layer never looks inside them.
/// Maps are kept as a list of entries so that duplicate keys survive until
/// the builder can reject them; entry order is irrelevant to the digest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Scalar(Bytes),
    Array(Vec<Value>),
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Create a scalar from already-encoded bytes
    pub fn scalar(bytes: impl Into<Bytes>) -> Self {
        Value::Scalar(bytes.into())
    }

    /// Create a map from key/value pairs
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Look up a map entry by key (first match)
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up an array element by index
    pub fn index(&self, idx: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(idx),
            _ => None,
        }
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
