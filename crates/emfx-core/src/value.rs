//! Storable feature values
//!
//! `Value` is the closed set of things a feature can hold: primitive
//! literals, object references, ordered multi-values and not-yet-resolved
//! cross-document references.

use chrono::{DateTime, Utc};
use emfx_core_types::Identifier;
use std::fmt;

use crate::proxy::UnresolvedReference;

/// High-precision decimal: `mantissa * 10^exponent`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decimal {
    pub mantissa: i128,
    pub exponent: i32,
}

impl Decimal {
    pub fn new(mantissa: i128, exponent: i32) -> Self {
        Self { mantissa, exponent }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exponent >= 0 {
            write!(f, "{}", self.mantissa)?;
            for _ in 0..self.exponent {
                f.write_str("0")?;
            }
            return Ok(());
        }

        let digits = self.mantissa.unsigned_abs().to_string();
        let scale = self.exponent.unsigned_abs() as usize;
        let sign = if self.mantissa < 0 { "-" } else { "" };
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{}{}", sign, "0".repeat(scale - digits.len()), digits)
        }
    }
}

/// Anything storable in a feature
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Char(char),
    String(String),
    Date(DateTime<Utc>),
    Decimal(Decimal),
    /// Link to another object (same or other resource)
    Object(Identifier),
    /// Ordered contents of a multi-valued feature
    Many(Vec<Value>),
    /// Cross-document link that has not been dereferenced yet
    Proxy(UnresolvedReference),
}

impl Value {
    /// True for literal kinds (everything except links and sequences)
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Object(_) | Value::Many(_) | Value::Proxy(_))
    }

    /// Variant name, e.g. `"I64"` or `"String"`
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::I8(_) => "I8",
            Value::I16(_) => "I16",
            Value::I32(_) => "I32",
            Value::I64(_) => "I64",
            Value::U8(_) => "U8",
            Value::U16(_) => "U16",
            Value::U32(_) => "U32",
            Value::U64(_) => "U64",
            Value::F32(_) => "F32",
            Value::F64(_) => "F64",
            Value::Bool(_) => "Bool",
            Value::Char(_) => "Char",
            Value::String(_) => "String",
            Value::Date(_) => "Date",
            Value::Decimal(_) => "Decimal",
            Value::Object(_) => "Object",
            Value::Many(_) => "Many",
            Value::Proxy(_) => "Proxy",
        }
    }

    pub fn as_object(&self) -> Option<Identifier> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Widen any integer kind to i64 when it fits
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I8(v) => Some(v.into()),
            Value::I16(v) => Some(v.into()),
            Value::I32(v) => Some(v.into()),
            Value::I64(v) => Some(v),
            Value::U8(v) => Some(v.into()),
            Value::U16(v) => Some(v.into()),
            Value::U32(v) => Some(v.into()),
            Value::U64(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F32(v) => Some(v.into()),
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_many(&self) -> Option<&[Value]> {
        match self {
            Value::Many(values) => Some(values),
            _ => None,
        }
    }

    /// View single and multi-valued contents uniformly
    pub fn items(&self) -> &[Value] {
        match self {
            Value::Many(values) => values,
            single => std::slice::from_ref(single),
        }
    }

    /// Object identifiers held directly or inside a sequence
    pub fn object_ids(&self) -> Vec<Identifier> {
        self.items().iter().filter_map(Value::as_object).collect()
    }

    /// Collapse a list into the stored shape: one element stays single,
    /// more become `Many`, none yields `None`.
    pub fn from_items(mut items: Vec<Value>) -> Option<Value> {
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Value::Many(items)),
        }
    }

    /// Append to an existing value, promoting a single value to `Many`
    pub fn append(existing: Option<Value>, item: Value) -> Value {
        match existing {
            None => item,
            Some(Value::Many(mut values)) => {
                values.push(item);
                Value::Many(values)
            }
            Some(single) => Value::Many(vec![single, item]),
        }
    }

    /// Canonical document text for a primitive value
    ///
    /// Floats always keep a fraction or exponent so the text infers back
    /// to a float. Returns `None` for links and sequences.
    pub fn to_literal(&self) -> Option<String> {
        let text = match self {
            Value::I8(v) => v.to_string(),
            Value::I16(v) => v.to_string(),
            Value::I32(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::U8(v) => v.to_string(),
            Value::U16(v) => v.to_string(),
            Value::U32(v) => v.to_string(),
            Value::U64(v) => v.to_string(),
            Value::F32(v) => format!("{:?}", v),
            Value::F64(v) => format!("{:?}", v),
            Value::Bool(v) => v.to_string(),
            Value::Char(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Date(v) => v.to_rfc3339(),
            Value::Decimal(v) => v.to_string(),
            Value::Object(_) | Value::Many(_) | Value::Proxy(_) => return None,
        };
        Some(text)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<Identifier> for Value {
    fn from(id: Identifier) -> Self {
        Value::Object(id)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}
