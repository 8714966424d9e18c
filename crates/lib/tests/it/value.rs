//! Conversion rules between stored values and Rust types.

use std::time::Duration;

use chrono::{DateTime, FixedOffset, TimeDelta, Utc};
use dynattr::{FromValue, Value, ValueKind, ValueList, value::Opaque};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::helpers::timestamp;

// ===== Typed accessors =====

#[test]
fn test_every_value_converts_back_to_its_own_type() {
    let when = timestamp("2024-02-29T08:15:00-05:00");
    let id = Uuid::new_v4();
    let list: ValueList = [
        Value::from(true),
        Value::from('x'),
        Value::from("text"),
        Value::from(-8i8),
        Value::from(40_000u32),
        Value::from(2.5f64),
        Value::from(Decimal::new(1999, 2)),
        Value::from(when),
        Value::from(TimeDelta::milliseconds(1500)),
        Value::from(id),
    ]
    .into();

    assert!(list.cast_at::<bool>(0).unwrap());
    assert_eq!(list.cast_at::<char>(1).unwrap(), 'x');
    assert_eq!(list.cast_at::<String>(2).unwrap(), "text");
    assert_eq!(list.cast_at::<i8>(3).unwrap(), -8);
    assert_eq!(list.cast_at::<u32>(4).unwrap(), 40_000);
    assert_eq!(list.cast_at::<f64>(5).unwrap(), 2.5);
    assert_eq!(list.cast_at::<Decimal>(6).unwrap(), Decimal::new(1999, 2));
    assert_eq!(list.cast_at::<DateTime<FixedOffset>>(7).unwrap(), when);
    assert_eq!(
        list.cast_at::<Duration>(8).unwrap(),
        Duration::from_millis(1500)
    );
    assert_eq!(list.cast_at::<Uuid>(9).unwrap(), id);
}

#[test]
fn test_numeric_widening_and_narrowing() {
    let value = Value::from(300i32);
    assert_eq!(value.try_as::<i64>().unwrap(), 300);
    assert_eq!(value.try_as::<f64>().unwrap(), 300.0);
    assert!(value.try_as::<u8>().unwrap_err().is_type_mismatch());

    assert_eq!(Value::from(4.0f64).try_as::<u16>().unwrap(), 4);
    assert!(Value::from(4.5f64).try_as::<u16>().is_err());
    assert!(Value::from(-1i8).try_as::<u64>().is_err());
}

#[test]
fn test_text_is_parsed_on_demand() {
    assert_eq!(Value::from(" 42 ").try_as::<i32>().unwrap(), 42);
    assert!(Value::from("TRUE").try_as::<bool>().unwrap());
    assert_eq!(
        Value::from("2024-01-01T00:00:00Z")
            .try_as::<DateTime<Utc>>()
            .unwrap(),
        timestamp("2024-01-01T00:00:00+00:00")
    );

    let err = Value::from("forty-two").try_as::<i32>().unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(err.expected(), Some("i32"));
}

#[test]
fn test_mismatch_names_both_types() {
    let err = Value::from(TimeDelta::seconds(1)).try_as::<Uuid>().unwrap_err();
    let message = err.to_string();
    assert!(message.contains("uuid"), "{message}");
    assert!(message.contains("duration"), "{message}");
}

#[test]
fn test_integers_read_as_bool() {
    assert!(Value::from(7u8).try_as::<bool>().unwrap());
    assert!(!Value::from(0i64).try_as::<bool>().unwrap());
    assert!(Value::from(1.0f64).try_as::<bool>().is_err());
}

// ===== Empty lists and defaults =====

#[test]
fn test_empty_list_casts_to_type_default() {
    let list = ValueList::new();
    assert_eq!(list.cast::<i32>().unwrap(), 0);
    assert_eq!(list.cast::<String>().unwrap(), "");
    assert!(!list.cast::<bool>().unwrap());
    assert_eq!(list.cast::<Uuid>().unwrap(), Uuid::nil());
    assert_eq!(list.try_cast::<f64>(), Some(0.0));
    assert_eq!(list.cast_or(17u8), 17);
    assert!(list.cast_list::<i32>().unwrap().is_empty());
}

#[test]
fn test_defaulting_casts_never_fail() {
    let list = ValueList::from(["1", "two", "3"]);

    assert_eq!(list.cast_or(-1i32), 1);
    assert_eq!(list.cast_at_or(1, -1i32), -1);
    assert_eq!(list.cast_at_or(9, -1i32), -1);
    assert_eq!(list.cast_list_or(0i32), vec![1, 0, 3]);
    assert_eq!(list.try_cast_list::<i32>(), Err(vec![1, 3]));

    let err = list.cast_list::<i32>().unwrap_err();
    assert!(err.is_type_mismatch());
    assert_eq!(err.module(), "value");
}

#[test]
fn test_cast_at_out_of_range() {
    let list = ValueList::from("only");
    let err = list.cast_at::<String>(1).unwrap_err();
    assert!(err.is_index_out_of_range());
    assert!(list.try_cast_at::<String>(1).is_none());
}

// ===== Opaque values =====

#[derive(Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
struct Album {
    title: String,
    year: u16,
}

impl FromValue for Album {
    const TYPE_NAME: &'static str = "Album";

    fn from_value(value: &Value) -> Result<Self, dynattr::value::ValueError> {
        value.try_as::<Opaque>()?.decode()
    }

    fn empty() -> Self {
        Album::default()
    }
}

#[test]
fn test_custom_types_through_opaque() {
    let album = Album {
        title: "Animals".to_string(),
        year: 1977,
    };
    let list = ValueList::from(Value::opaque(&album).unwrap());

    assert_eq!(list.primary().unwrap().kind(), ValueKind::Opaque);
    assert_eq!(list.cast::<Album>().unwrap(), album);
    assert_eq!(ValueList::new().cast::<Album>().unwrap(), Album::default());
    assert!(ValueList::from("Animals").cast::<Album>().is_err());
}

// ===== Parsing user input =====

#[test]
fn test_parse_text_by_kind() {
    let kind: ValueKind = "u16".parse().unwrap();
    assert_eq!(kind.parse_text("8080").unwrap(), Value::U16(8080));
    assert_eq!(
        ValueKind::Duration.parse_text("1.5").unwrap(),
        Value::Duration(TimeDelta::milliseconds(1500))
    );
    assert!(ValueKind::U8.parse_text("256").is_err());
    assert!("float128".parse::<ValueKind>().is_err());
}
