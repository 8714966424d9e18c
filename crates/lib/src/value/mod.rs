//! The element type stored in a [`ValueList`](crate::ValueList).
//!
//! [`Value`] is a closed variant over every supported kind. Conversions into a `Value` are plain
//! `From` impls; conversions out of one go through [`FromValue`] so that the rules for widening,
//! narrowing and parsing live in a single place (see [`convert`]).
//!
//! Arbitrary Rust types can still be stored through [`Opaque`], which keeps a serde JSON payload
//! next to a caller-chosen type name. Opaque payloads round-trip through this crate's storage
//! adapters, but their layout is whatever the type's `Serialize` impl produces and is not meant
//! to be read by other languages.

mod convert;
mod errors;
mod kind;

use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, TimeDelta, TimeZone};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

pub use convert::FromValue;
pub use errors::ValueError;
pub use kind::ValueKind;

/// A single element of a [`ValueList`](crate::ValueList).
///
/// # Equality
///
/// Equality is structural and kind-sensitive: `Value::I32(1) != Value::I64(1)`. Floats follow
/// IEEE rules, so a `NaN` element never equals anything, itself included.
///
/// # Direct Comparisons
///
/// ```
/// # use dynattr::Value;
/// let text = Value::from("hello");
/// let number = Value::from(42i32);
///
/// assert!(text == "hello");
/// assert!(number == 42i64);
/// assert!("hello" == text);
/// assert!(!(number == "42"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(char),
    Text(String),
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
    /// Fixed-point decimal
    Decimal(Decimal),
    /// Timestamp with its original UTC offset
    DateTime(DateTime<FixedOffset>),
    /// Signed duration
    Duration(TimeDelta),
    Uuid(Uuid),
    /// Serialized payload of a type outside the closed set
    Opaque(Opaque),
}

impl Value {
    /// The kind tag of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Char(_) => ValueKind::Char,
            Value::Text(_) => ValueKind::Text,
            Value::I8(_) => ValueKind::I8,
            Value::I16(_) => ValueKind::I16,
            Value::I32(_) => ValueKind::I32,
            Value::I64(_) => ValueKind::I64,
            Value::U8(_) => ValueKind::U8,
            Value::U16(_) => ValueKind::U16,
            Value::U32(_) => ValueKind::U32,
            Value::U64(_) => ValueKind::U64,
            Value::F32(_) => ValueKind::F32,
            Value::F64(_) => ValueKind::F64,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Duration(_) => ValueKind::Duration,
            Value::Uuid(_) => ValueKind::Uuid,
            Value::Opaque(_) => ValueKind::Opaque,
        }
    }

    /// Returns the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Equality used for change detection: like `==`, but floats compare by bit pattern, so a
    /// NaN is the same as an identical NaN and `0.0` differs from `-0.0`.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            _ => self == other,
        }
    }

    /// Converts to any [`FromValue`] type using the crate-wide conversion rules.
    pub fn try_as<T: FromValue>(&self) -> Result<T, ValueError> {
        T::from_value(self)
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the text if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is any integer kind and it fits in an `i64`.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::I8(n) => Some(n.into()),
            Value::I16(n) => Some(n.into()),
            Value::I32(n) => Some(n.into()),
            Value::I64(n) => Some(n),
            Value::U8(n) => Some(n.into()),
            Value::U16(n) => Some(n.into()),
            Value::U32(n) => Some(n.into()),
            Value::U64(n) => i64::try_from(n).ok(),
            _ => None,
        }
    }

    /// Returns the number as `f64` if this is a float kind.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::F32(f) => Some(f.into()),
            Value::F64(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_opaque(&self) -> Option<&Opaque> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Store any serializable value as an opaque payload.
    pub fn opaque<T: Serialize>(value: &T) -> Result<Self, ValueError> {
        Opaque::encode(value).map(Value::Opaque)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Char(c) => write!(f, "{c}"),
            Value::Text(s) => f.write_str(s),
            Value::I8(n) => write!(f, "{n}"),
            Value::I16(n) => write!(f, "{n}"),
            Value::I32(n) => write!(f, "{n}"),
            Value::I64(n) => write!(f, "{n}"),
            Value::U8(n) => write!(f, "{n}"),
            Value::U16(n) => write!(f, "{n}"),
            Value::U32(n) => write!(f, "{n}"),
            Value::U64(n) => write!(f, "{n}"),
            Value::F32(n) => write!(f, "{n}"),
            Value::F64(n) => write!(f, "{n}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            Value::Duration(d) => write!(f, "{d}"),
            Value::Uuid(id) => write!(f, "{id}"),
            Value::Opaque(o) => write!(f, "{}({})", o.type_name, o.payload),
        }
    }
}

/// A value of a type outside [`Value`]'s closed set, kept as a serde JSON payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Opaque {
    type_name: String,
    payload: serde_json::Value,
}

impl Opaque {
    /// Wrap an already-serialized payload.
    pub fn new(type_name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            type_name: type_name.into(),
            payload,
        }
    }

    /// Serialize `value`, recording its Rust type name.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, ValueError> {
        let type_name = std::any::type_name::<T>();
        let payload = serde_json::to_value(value).map_err(|e| ValueError::OpaquePayload {
            type_name: type_name.to_string(),
            source: e,
        })?;
        Ok(Self::new(type_name, payload))
    }

    /// Deserialize the payload into `T`.
    ///
    /// The recorded type name is informational and is not checked against `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ValueError> {
        T::deserialize(&self.payload).map_err(|e| ValueError::OpaquePayload {
            type_name: self.type_name.clone(),
            source: e,
        })
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    char => Char,
    String => Text,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    TimeDelta => Duration,
    Uuid => Uuid,
    Opaque => Opaque,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Value {
    fn from(value: DateTime<Tz>) -> Self {
        Value::DateTime(value.fixed_offset())
    }
}

impl TryFrom<std::time::Duration> for Value {
    type Error = ValueError;

    fn try_from(value: std::time::Duration) -> Result<Self, Self::Error> {
        TimeDelta::from_std(value)
            .map(Value::Duration)
            .map_err(|e| ValueError::parse("duration", &format!("{value:?}"), e))
    }
}

// Comparisons against plain Rust values

impl PartialEq<str> for Value {
    fn eq(&self, other: &str) -> bool {
        self.as_text() == Some(other)
    }
}

impl PartialEq<&str> for Value {
    fn eq(&self, other: &&str) -> bool {
        self.as_text() == Some(*other)
    }
}

impl PartialEq<String> for Value {
    fn eq(&self, other: &String) -> bool {
        self.as_text() == Some(other.as_str())
    }
}

impl PartialEq<bool> for Value {
    fn eq(&self, other: &bool) -> bool {
        self.as_bool() == Some(*other)
    }
}

/// Matches any integer kind holding the same number.
impl PartialEq<i64> for Value {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

impl PartialEq<Value> for &str {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for bool {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}

impl PartialEq<Value> for i64 {
    fn eq(&self, other: &Value) -> bool {
        other == self
    }
}
