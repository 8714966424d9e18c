//! Conversion rules out of [`Value`].
//!
//! | Target            | Accepted sources                                                   |
//! |-------------------|--------------------------------------------------------------------|
//! | integers          | any integer in range, `bool`, integral finite floats and decimals, text |
//! | `f32` / `f64`     | floats, integers, decimals, text                                   |
//! | `Decimal`         | decimals, integers, finite floats, text                            |
//! | `bool`            | booleans, integers (non-zero is true), `"true"` / `"false"` text   |
//! | `char`            | characters, single-character text                                  |
//! | `String`          | everything, through `Display`                                      |
//! | `DateTime`        | timestamps, RFC 3339 text                                          |
//! | `TimeDelta`       | durations                                                          |
//! | `std::time::Duration` | non-negative durations                                         |
//! | `Uuid`            | UUIDs, text                                                        |
//! | `Opaque`          | opaque values                                                      |
//!
//! Every value converts back to the type it was stored as without loss. Anything not in the
//! table is a [`ValueError::TypeMismatch`].

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use uuid::Uuid;

use super::{Opaque, Value, ValueError};

/// Types that can be read out of a [`Value`].
///
/// Implement this for your own types to use them with the typed casts on
/// [`ValueList`](crate::ValueList). Types stored through [`Opaque`] usually implement it with
/// [`Opaque::decode`]:
///
/// ```
/// # use dynattr::{FromValue, Value, value::ValueError};
/// #[derive(Default, serde::Serialize, serde::Deserialize)]
/// struct Album {
///     title: String,
///     year: u16,
/// }
///
/// impl FromValue for Album {
///     const TYPE_NAME: &'static str = "Album";
///
///     fn from_value(value: &Value) -> Result<Self, ValueError> {
///         value.try_as::<dynattr::value::Opaque>()?.decode()
///     }
///
///     fn empty() -> Self {
///         Album::default()
///     }
/// }
/// ```
pub trait FromValue: Sized {
    /// Name used in error messages.
    const TYPE_NAME: &'static str;

    /// Convert, or explain why the value has no representation as `Self`.
    fn from_value(value: &Value) -> Result<Self, ValueError>;

    /// The value a cast produces when the list is empty.
    fn empty() -> Self;
}

/// Integral view of a numeric value, if it has one.
fn integral(value: &Value) -> Option<i128> {
    match *value {
        Value::Bool(b) => Some(i128::from(b)),
        Value::I8(n) => Some(n.into()),
        Value::I16(n) => Some(n.into()),
        Value::I32(n) => Some(n.into()),
        Value::I64(n) => Some(n.into()),
        Value::U8(n) => Some(n.into()),
        Value::U16(n) => Some(n.into()),
        Value::U32(n) => Some(n.into()),
        Value::U64(n) => Some(n.into()),
        Value::F32(f) => integral_float(f.into()),
        Value::F64(f) => integral_float(f),
        Value::Decimal(d) if d.fract().is_zero() => d.to_i128(),
        _ => None,
    }
}

fn integral_float(f: f64) -> Option<i128> {
    // 2^127 bounds the i128 range
    (f.is_finite() && f.fract() == 0.0 && f.abs() < 1.7e38).then_some(f as i128)
}

/// Floating point view of a numeric value.
fn float(value: &Value) -> Option<f64> {
    match *value {
        Value::F32(f) => Some(f.into()),
        Value::F64(f) => Some(f),
        Value::Decimal(d) => d.to_f64(),
        _ => integral(value)
            .filter(|_| !matches!(value, Value::Bool(_)))
            .map(|n| n as f64),
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const TYPE_NAME: &'static str = stringify!($ty);

                fn from_value(value: &Value) -> Result<Self, ValueError> {
                    match value {
                        Value::Text(s) => s
                            .trim()
                            .parse::<$ty>()
                            .map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e)),
                        other => integral(other)
                            .and_then(|n| <$ty>::try_from(n).ok())
                            .ok_or_else(|| ValueError::mismatch(Self::TYPE_NAME, other)),
                    }
                }

                fn empty() -> Self {
                    0
                }
            }
        )*
    };
}

impl_from_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e)),
            other => float(other).ok_or_else(|| ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        0.0
    }
}

impl FromValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::F32(f) => Ok(*f),
            Value::Text(s) => s
                .trim()
                .parse()
                .map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e)),
            other => float(other)
                .map(|f| f as f32)
                .ok_or_else(|| ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        0.0
    }
}

impl FromValue for Decimal {
    const TYPE_NAME: &'static str = "decimal";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        let converted = match value {
            Value::Decimal(d) => Some(*d),
            Value::Text(s) => {
                return s
                    .trim()
                    .parse()
                    .map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e));
            }
            Value::F32(f) => Decimal::from_f32(*f),
            Value::F64(f) => Decimal::from_f64(*f),
            Value::Bool(_) => None,
            other => integral(other).and_then(Decimal::from_i128),
        };
        converted.ok_or_else(|| ValueError::mismatch(Self::TYPE_NAME, value))
    }

    fn empty() -> Self {
        Decimal::ZERO
    }
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Text(s) => {
                let s = s.trim();
                if s.eq_ignore_ascii_case("true") {
                    Ok(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Ok(false)
                } else {
                    Err(ValueError::parse(Self::TYPE_NAME, s, "expected true or false"))
                }
            }
            Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::I64(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_)
            | Value::U64(_) => Ok(integral(value).is_some_and(|n| n != 0)),
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        false
    }
}

impl FromValue for char {
    const TYPE_NAME: &'static str = "char";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Char(c) => Ok(*c),
            Value::Text(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(ValueError::parse(
                        Self::TYPE_NAME,
                        s,
                        "expected exactly one character",
                    )),
                }
            }
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        '\0'
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        Ok(match value {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn empty() -> Self {
        String::new()
    }
}

impl FromValue for DateTime<FixedOffset> {
    const TYPE_NAME: &'static str = "datetime";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::DateTime(dt) => Ok(*dt),
            Value::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e)),
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        DateTime::<Utc>::default().fixed_offset()
    }
}

impl FromValue for DateTime<Utc> {
    const TYPE_NAME: &'static str = "datetime";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        DateTime::<FixedOffset>::from_value(value).map(|dt| dt.with_timezone(&Utc))
    }

    fn empty() -> Self {
        DateTime::<Utc>::default()
    }
}

impl FromValue for TimeDelta {
    const TYPE_NAME: &'static str = "duration";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Duration(d) => Ok(*d),
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        TimeDelta::zero()
    }
}

impl FromValue for std::time::Duration {
    const TYPE_NAME: &'static str = "std::time::Duration";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Duration(d) => d
                .to_std()
                .map_err(|e| ValueError::parse(Self::TYPE_NAME, &d.to_string(), e)),
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        std::time::Duration::ZERO
    }
}

impl FromValue for Uuid {
    const TYPE_NAME: &'static str = "uuid";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Uuid(id) => Ok(*id),
            Value::Text(s) => {
                Uuid::parse_str(s.trim()).map_err(|e| ValueError::parse(Self::TYPE_NAME, s, e))
            }
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        Uuid::nil()
    }
}

impl FromValue for Opaque {
    const TYPE_NAME: &'static str = "opaque";

    fn from_value(value: &Value) -> Result<Self, ValueError> {
        match value {
            Value::Opaque(o) => Ok(o.clone()),
            other => Err(ValueError::mismatch(Self::TYPE_NAME, other)),
        }
    }

    fn empty() -> Self {
        Opaque::default()
    }
}
