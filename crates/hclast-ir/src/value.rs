//! Fully-evaluated structural values and their type descriptors.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

/// A known value of the expression language.
///
/// Only structural collection types exist: a `Tuple` has one type per element
/// and an `Object` one type per attribute. Object attributes iterate in
/// sorted key order.
///
/// Serializes as the plain JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Tuple(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

/// Type descriptor of a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// The type of `null`, which carries no more specific type.
    Dynamic,
    Bool,
    Number,
    String,
    Tuple(Vec<ValueType>),
    Object(BTreeMap<String, ValueType>),
}

impl Value {
    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Dynamic,
            Value::Bool(_) => ValueType::Bool,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Tuple(items) => ValueType::Tuple(items.iter().map(Value::value_type).collect()),
            Value::Object(attrs) => ValueType::Object(
                attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), value.value_type()))
                    .collect(),
            ),
        }
    }

    /// Iterates the `(key, element)` pairs of a tuple or object.
    ///
    /// Tuple keys are the element indices as numbers, object keys are the
    /// attribute names as strings. Primitive values have no elements.
    pub fn elements(&self) -> Box<dyn Iterator<Item = (Value, &Value)> + '_> {
        match self {
            Value::Tuple(items) => Box::new(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| (Value::Number(index as f64), item)),
            ),
            Value::Object(attrs) => Box::new(
                attrs
                    .iter()
                    .map(|(name, value)| (Value::String(name.clone()), value)),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }
}

impl fmt::Display for Value {
    /// Renders primitives the way string interpolation does.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Tuple(_) => f.write_str("tuple"),
            Value::Object(_) => f.write_str("object"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Tuple(value)
    }
}

impl ValueType {
    /// Short name used in diagnostics, e.g. "number" or "tuple".
    pub fn friendly_name(&self) -> &'static str {
        match self {
            ValueType::Dynamic => "dynamic",
            ValueType::Bool => "bool",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Tuple(_) => "tuple",
            ValueType::Object(_) => "object",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.friendly_name())
    }
}

// Primitive types encode as their name, structural types as a
// `[kind, element-types]` pair.
impl Serialize for ValueType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ValueType::Dynamic | ValueType::Bool | ValueType::Number | ValueType::String => {
                serializer.serialize_str(self.friendly_name())
            }
            ValueType::Tuple(elements) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("tuple")?;
                seq.serialize_element(elements)?;
                seq.end()
            }
            ValueType::Object(attrs) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element("object")?;
                seq.serialize_element(attrs)?;
                seq.end()
            }
        }
    }
}
