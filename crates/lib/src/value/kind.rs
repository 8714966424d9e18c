//! Stable identifiers for every [`Value`] variant.

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Opaque, Value, ValueError};

/// The kind of a [`Value`], used as the type tag in persisted data.
///
/// The serialized names are lowercase and stable: `bool`, `char`, `text`, `i8` through `u64`,
/// `f32`, `f64`, `decimal`, `datetime`, `duration`, `uuid` and `opaque`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Char,
    Text,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    DateTime,
    Duration,
    Uuid,
    Opaque,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 18] = [
        ValueKind::Bool,
        ValueKind::Char,
        ValueKind::Text,
        ValueKind::I8,
        ValueKind::I16,
        ValueKind::I32,
        ValueKind::I64,
        ValueKind::U8,
        ValueKind::U16,
        ValueKind::U32,
        ValueKind::U64,
        ValueKind::F32,
        ValueKind::F64,
        ValueKind::Decimal,
        ValueKind::DateTime,
        ValueKind::Duration,
        ValueKind::Uuid,
        ValueKind::Opaque,
    ];

    /// The wire name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Char => "char",
            ValueKind::Text => "text",
            ValueKind::I8 => "i8",
            ValueKind::I16 => "i16",
            ValueKind::I32 => "i32",
            ValueKind::I64 => "i64",
            ValueKind::U8 => "u8",
            ValueKind::U16 => "u16",
            ValueKind::U32 => "u32",
            ValueKind::U64 => "u64",
            ValueKind::F32 => "f32",
            ValueKind::F64 => "f64",
            ValueKind::Decimal => "decimal",
            ValueKind::DateTime => "datetime",
            ValueKind::Duration => "duration",
            ValueKind::Uuid => "uuid",
            ValueKind::Opaque => "opaque",
        }
    }

    /// Build a value of this kind from user-entered text.
    ///
    /// Durations are read as a (possibly fractional) number of seconds and opaque values as a
    /// JSON document tagged `json`. Everything else uses the same parser as [`FromValue`] does
    /// for text input.
    ///
    /// [`FromValue`]: super::FromValue
    pub fn parse_text(self, input: &str) -> Result<Value, ValueError> {
        let text = Value::Text(input.to_string());
        Ok(match self {
            ValueKind::Text => text,
            ValueKind::Bool => Value::Bool(text.try_as()?),
            ValueKind::Char => Value::Char(text.try_as()?),
            ValueKind::I8 => Value::I8(text.try_as()?),
            ValueKind::I16 => Value::I16(text.try_as()?),
            ValueKind::I32 => Value::I32(text.try_as()?),
            ValueKind::I64 => Value::I64(text.try_as()?),
            ValueKind::U8 => Value::U8(text.try_as()?),
            ValueKind::U16 => Value::U16(text.try_as()?),
            ValueKind::U32 => Value::U32(text.try_as()?),
            ValueKind::U64 => Value::U64(text.try_as()?),
            ValueKind::F32 => Value::F32(text.try_as()?),
            ValueKind::F64 => Value::F64(text.try_as()?),
            ValueKind::Decimal => Value::Decimal(text.try_as::<Decimal>()?),
            ValueKind::DateTime => Value::DateTime(text.try_as::<DateTime<chrono::FixedOffset>>()?),
            ValueKind::Uuid => Value::Uuid(text.try_as::<Uuid>()?),
            ValueKind::Duration => {
                let secs: f64 = text.try_as()?;
                let nanos = secs * 1e9;
                if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
                    return Err(ValueError::parse("duration", input, "out of range"));
                }
                Value::Duration(TimeDelta::nanoseconds(nanos.round() as i64))
            }
            ValueKind::Opaque => {
                let payload: serde_json::Value = serde_json::from_str(input).map_err(|e| {
                    ValueError::OpaquePayload {
                        type_name: "json".to_string(),
                        source: e,
                    }
                })?;
                Value::Opaque(Opaque::new("json", payload))
            }
        })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown value kind '{s}'"))
    }
}
