//! Tagged, order-preserving encoding of lists and maps.
//!
//! Every storage adapter persists lists in the same self-describing JSON shape:
//!
//! ```json
//! { "type": "i32", "items": [3, 1, 2] }
//! ```
//!
//! `type` is the common [`ValueKind`] of the elements. An empty list is tagged `"empty"`. A list
//! whose elements have different kinds is tagged `"mixed"`, and each item then carries its own
//! tag:
//!
//! ```json
//! { "type": "mixed", "items": [{ "type": "text", "value": "a" }, { "type": "u8", "value": 7 }] }
//! ```
//!
//! Item encodings:
//!
//! - `bool` and integers: JSON booleans and numbers
//! - `f32` / `f64`: numbers, or the strings `"NaN"`, `"inf"` and `"-inf"`
//! - `text`, `char`: strings
//! - `decimal`: its exact decimal string
//! - `datetime`: RFC 3339 with the original offset
//! - `duration`: `{ "secs": i64, "nanos": i32 }`, both carrying the sign
//! - `uuid`: hyphenated string
//! - `opaque`: `{ "type_name": string, "payload": any }`
//!
//! Decoding restores the exact element order, so the first item is the primary value again.
//! A whole map is a [`TaggedDocument`]: a JSON object from normalized key to tagged list.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, SecondsFormat, TimeDelta};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value as Json, json};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    attributes::AttributeMap,
    list::ValueList,
    value::{Opaque, Value, ValueKind},
};

/// Errors produced while decoding persisted data.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum CodecError {
    /// The `type` field names no known kind.
    #[error("Unknown type tag: {tag}")]
    UnknownTag {
        /// The tag as found in the data
        tag: String,
    },

    /// An item doesn't match the encoding of its kind.
    #[error("Malformed {kind} item at index {index}: {reason}")]
    MalformedItem {
        /// The tag the item was decoded as
        kind: String,
        /// Position of the item in its list
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A list inside a document failed to decode.
    #[error("Invalid attribute {key}")]
    InvalidEntry {
        /// The key whose list failed
        key: String,
        /// The underlying decode failure
        #[source]
        source: Box<CodecError>,
    },
}

impl CodecError {
    /// The key of the failing entry, when decoding a document.
    pub fn key(&self) -> Option<&str> {
        match self {
            CodecError::InvalidEntry { key, .. } => Some(key),
            _ => None,
        }
    }
}

impl From<CodecError> for crate::Error {
    fn from(err: CodecError) -> Self {
        crate::Error::Codec(err)
    }
}

/// The `type` tag of a [`TaggedList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ListTag {
    /// No items
    Empty,
    /// Items of different kinds, each tagged individually
    Mixed,
    /// Every item has this kind
    Kind(ValueKind),
}

const TAG_EMPTY: &str = "empty";
const TAG_MIXED: &str = "mixed";

impl ListTag {
    /// The tag describing `list`.
    pub fn of(list: &ValueList) -> Self {
        let mut kinds = list.iter().map(Value::kind);
        match kinds.next() {
            None => ListTag::Empty,
            Some(first) if kinds.all(|kind| kind == first) => ListTag::Kind(first),
            Some(_) => ListTag::Mixed,
        }
    }
}

impl fmt::Display for ListTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListTag::Empty => f.write_str(TAG_EMPTY),
            ListTag::Mixed => f.write_str(TAG_MIXED),
            ListTag::Kind(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for ListTag {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            TAG_EMPTY => Ok(ListTag::Empty),
            TAG_MIXED => Ok(ListTag::Mixed),
            other => parse_kind(other).map(ListTag::Kind),
        }
    }
}

impl TryFrom<String> for ListTag {
    type Error = CodecError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ListTag> for String {
    fn from(tag: ListTag) -> Self {
        tag.to_string()
    }
}

fn parse_kind(tag: &str) -> Result<ValueKind, CodecError> {
    ValueKind::ALL
        .into_iter()
        .find(|kind| kind.as_str() == tag)
        .ok_or_else(|| CodecError::UnknownTag {
            tag: tag.to_string(),
        })
}

/// The persisted form of one [`ValueList`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedList {
    #[serde(rename = "type")]
    pub tag: ListTag,
    pub items: Vec<Json>,
}

impl TaggedList {
    pub fn encode(list: &ValueList) -> Self {
        let tag = ListTag::of(list);
        let items = match tag {
            ListTag::Mixed => list
                .iter()
                .map(|value| json!({ "type": value.kind(), "value": encode_item(value) }))
                .collect(),
            ListTag::Empty | ListTag::Kind(_) => list.iter().map(encode_item).collect(),
        };
        Self { tag, items }
    }

    pub fn decode(&self) -> Result<ValueList, CodecError> {
        let values = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| match self.tag {
                ListTag::Kind(kind) => decode_item(kind, index, item),
                ListTag::Mixed => decode_mixed_item(index, item),
                ListTag::Empty => Err(malformed(TAG_EMPTY, index, "empty list has items")),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values.into())
    }
}

/// The persisted form of a whole [`AttributeMap`]: normalized key to tagged list.
///
/// Keys are kept sorted so that saving the same map twice produces identical output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaggedDocument {
    entries: BTreeMap<String, TaggedList>,
}

impl TaggedDocument {
    pub fn encode(map: &AttributeMap) -> Self {
        Self {
            entries: map
                .iter()
                .map(|(key, list)| (key.to_string(), TaggedList::encode(list)))
                .collect(),
        }
    }

    /// Rebuild the map. No events are emitted.
    pub fn decode(&self) -> Result<AttributeMap, CodecError> {
        self.entries
            .iter()
            .map(|(key, tagged)| {
                tagged
                    .decode()
                    .map(|list| (key.as_str(), list))
                    .map_err(|e| CodecError::InvalidEntry {
                        key: key.clone(),
                        source: Box::new(e),
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&TaggedList> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TaggedList)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, TaggedList)> for TaggedDocument {
    fn from_iter<I: IntoIterator<Item = (String, TaggedList)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

// ===== Items =====

fn encode_float(f: f64) -> Json {
    if f.is_nan() {
        json!("NaN")
    } else if f.is_infinite() {
        json!(if f > 0.0 { "inf" } else { "-inf" })
    } else {
        json!(f)
    }
}

fn encode_item(value: &Value) -> Json {
    match value {
        Value::Bool(b) => json!(b),
        Value::Char(c) => json!(c.to_string()),
        Value::Text(s) => json!(s),
        Value::I8(n) => json!(n),
        Value::I16(n) => json!(n),
        Value::I32(n) => json!(n),
        Value::I64(n) => json!(n),
        Value::U8(n) => json!(n),
        Value::U16(n) => json!(n),
        Value::U32(n) => json!(n),
        Value::U64(n) => json!(n),
        // Widening is exact, and narrowing back restores the original f32
        Value::F32(f) => encode_float(f64::from(*f)),
        Value::F64(f) => encode_float(*f),
        Value::Decimal(d) => json!(d.to_string()),
        Value::DateTime(dt) => json!(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
        Value::Duration(d) => json!({ "secs": d.num_seconds(), "nanos": d.subsec_nanos() }),
        Value::Uuid(id) => json!(id.hyphenated().to_string()),
        Value::Opaque(o) => json!({ "type_name": o.type_name(), "payload": o.payload() }),
    }
}

fn malformed(kind: &str, index: usize, reason: impl ToString) -> CodecError {
    CodecError::MalformedItem {
        kind: kind.to_string(),
        index,
        reason: reason.to_string(),
    }
}

fn decode_mixed_item(index: usize, item: &Json) -> Result<Value, CodecError> {
    let tag = item
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| malformed(TAG_MIXED, index, "missing item type"))?;
    let value = item
        .get("value")
        .ok_or_else(|| malformed(TAG_MIXED, index, "missing item value"))?;
    decode_item(parse_kind(tag)?, index, value)
}

fn decode_float(item: &Json) -> Option<f64> {
    match item {
        Json::String(s) => match s.as_str() {
            "NaN" => Some(f64::NAN),
            "inf" => Some(f64::INFINITY),
            "-inf" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        other => other.as_f64(),
    }
}

fn decode_item(kind: ValueKind, index: usize, item: &Json) -> Result<Value, CodecError> {
    let bad = |reason: &str| malformed(kind.as_str(), index, reason);
    let signed = || item.as_i64().ok_or_else(|| bad("expected an integer"));
    let unsigned = || item.as_u64().ok_or_else(|| bad("expected an unsigned integer"));
    let text = || item.as_str().ok_or_else(|| bad("expected a string"));
    let range = |_| bad("integer out of range");

    Ok(match kind {
        ValueKind::Bool => Value::Bool(item.as_bool().ok_or_else(|| bad("expected a boolean"))?),
        ValueKind::Text => Value::Text(text()?.to_string()),
        ValueKind::Char => {
            let s = text()?;
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Value::Char(c),
                _ => return Err(bad("expected a single character")),
            }
        }
        ValueKind::I8 => Value::I8(signed()?.try_into().map_err(range)?),
        ValueKind::I16 => Value::I16(signed()?.try_into().map_err(range)?),
        ValueKind::I32 => Value::I32(signed()?.try_into().map_err(range)?),
        ValueKind::I64 => Value::I64(signed()?),
        ValueKind::U8 => Value::U8(unsigned()?.try_into().map_err(range)?),
        ValueKind::U16 => Value::U16(unsigned()?.try_into().map_err(range)?),
        ValueKind::U32 => Value::U32(unsigned()?.try_into().map_err(range)?),
        ValueKind::U64 => Value::U64(unsigned()?),
        ValueKind::F32 => Value::F32(decode_float(item).ok_or_else(|| bad("expected a number"))? as f32),
        ValueKind::F64 => Value::F64(decode_float(item).ok_or_else(|| bad("expected a number"))?),
        ValueKind::Decimal => Value::Decimal(
            Decimal::from_str(text()?).map_err(|e| malformed(kind.as_str(), index, e))?,
        ),
        ValueKind::DateTime => Value::DateTime(
            DateTime::parse_from_rfc3339(text()?)
                .map_err(|e| malformed(kind.as_str(), index, e))?,
        ),
        ValueKind::Duration => {
            let secs = item.get("secs").and_then(Json::as_i64);
            let nanos = item.get("nanos").and_then(Json::as_i64);
            let (Some(secs), Some(nanos)) = (secs, nanos) else {
                return Err(bad("expected secs and nanos"));
            };
            let duration = TimeDelta::try_seconds(secs)
                .and_then(|d| d.checked_add(&TimeDelta::nanoseconds(nanos)))
                .ok_or_else(|| bad("duration out of range"))?;
            Value::Duration(duration)
        }
        ValueKind::Uuid => {
            Value::Uuid(Uuid::parse_str(text()?).map_err(|e| malformed(kind.as_str(), index, e))?)
        }
        ValueKind::Opaque => Value::Opaque(
            Opaque::deserialize(item).map_err(|e| malformed(kind.as_str(), index, e))?,
        ),
    })
}
