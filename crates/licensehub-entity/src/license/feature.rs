//! Typed feature values carried in a license.
//!
//! On the wire a feature is `{ "Type": <variant>, "Data": <base64> }`.
//! Data payloads are fixed-width little-endian for numeric types, UTF-8
//! for strings, an 8-byte little-endian millisecond timestamp for
//! date-times, and raw bytes for blobs.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A typed feature value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeatureWire", into = "FeatureWire")]
pub enum FeatureValue {
    /// A boolean flag.
    Boolean(bool),
    /// A 32-bit signed integer.
    Integer(i32),
    /// A 32-bit IEEE-754 float.
    Float(f32),
    /// A UTF-8 string.
    String(String),
    /// A UTC timestamp.
    DateTime(DateTime<Utc>),
    /// An opaque blob.
    ByteArray(Vec<u8>),
}

impl FeatureValue {
    /// Whether this value counts as "enabled".
    ///
    /// A feature is enabled iff its value differs from the type default:
    /// true, non-zero, non-empty, or a non-epoch timestamp.
    pub fn is_enabled(&self) -> bool {
        match self {
            Self::Boolean(b) => *b,
            Self::Integer(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::String(s) => !s.is_empty(),
            Self::DateTime(d) => d.timestamp_millis() != 0,
            Self::ByteArray(b) => !b.is_empty(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "Boolean",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::String(_) => "String",
            Self::DateTime(_) => "DateTime",
            Self::ByteArray(_) => "ByteArray",
        }
    }
}

/// Wire form of a feature value.
#[derive(Debug, Serialize, Deserialize)]
struct FeatureWire {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "Data")]
    data: String,
}

impl From<FeatureValue> for FeatureWire {
    fn from(value: FeatureValue) -> Self {
        let data = match &value {
            FeatureValue::Boolean(b) => vec![u8::from(*b)],
            FeatureValue::Integer(i) => i.to_le_bytes().to_vec(),
            FeatureValue::Float(f) => f.to_le_bytes().to_vec(),
            FeatureValue::String(s) => s.as_bytes().to_vec(),
            FeatureValue::DateTime(d) => d.timestamp_millis().to_le_bytes().to_vec(),
            FeatureValue::ByteArray(b) => b.clone(),
        };
        Self {
            kind: value.type_name().to_string(),
            data: BASE64.encode(data),
        }
    }
}

impl TryFrom<FeatureWire> for FeatureValue {
    type Error = String;

    fn try_from(wire: FeatureWire) -> Result<Self, Self::Error> {
        let data = BASE64
            .decode(&wire.data)
            .map_err(|e| format!("feature data is not valid base64: {e}"))?;

        match wire.kind.as_str() {
            "Boolean" => match data.as_slice() {
                [b] => Ok(Self::Boolean(*b != 0)),
                _ => Err("boolean feature must be one byte".to_string()),
            },
            "Integer" => {
                let bytes: [u8; 4] = data
                    .try_into()
                    .map_err(|_| "integer feature must be four bytes".to_string())?;
                Ok(Self::Integer(i32::from_le_bytes(bytes)))
            }
            "Float" => {
                let bytes: [u8; 4] = data
                    .try_into()
                    .map_err(|_| "float feature must be four bytes".to_string())?;
                Ok(Self::Float(f32::from_le_bytes(bytes)))
            }
            "String" => String::from_utf8(data)
                .map(Self::String)
                .map_err(|_| "string feature is not valid UTF-8".to_string()),
            "DateTime" => {
                let bytes: [u8; 8] = data
                    .try_into()
                    .map_err(|_| "datetime feature must be eight bytes".to_string())?;
                let millis = i64::from_le_bytes(bytes);
                DateTime::<Utc>::from_timestamp_millis(millis)
                    .map(Self::DateTime)
                    .ok_or_else(|| "datetime feature out of range".to_string())
            }
            "ByteArray" => Ok(Self::ByteArray(data)),
            other => Err(format!("unknown feature type: {other}")),
        }
    }
}
