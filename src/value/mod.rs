//! The tagged value model shared by binds and result columns.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::blob::FrontbaseBlob;

mod decode;
mod render;

pub(crate) use decode::decode_column;

/// A value travelling between application code and the FrontBase engine.
///
/// One variant per supported SQL type; the set is closed. Reuse the same
/// enum for binding parameters and reading columns so helper code never
/// branches on engine types:
/// ```rust
/// use frontbase_middleware::FrontbaseValue;
///
/// let binds = vec![
///     FrontbaseValue::Integer(1),
///     FrontbaseValue::Text("alice".into()),
///     FrontbaseValue::Boolean(true),
/// ];
/// # let _ = binds;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FrontbaseValue {
    /// SQL NULL.
    Null,
    /// `BOOLEAN`.
    Boolean(bool),
    /// Integer value (64-bit).
    Integer(i64),
    /// Floating point value (64-bit).
    Float(f64),
    /// Scale-aware decimal value.
    Decimal(Decimal),
    /// Text/string value.
    Text(String),
    /// Fixed or varying bit string, as whole bytes.
    Bits(Vec<u8>),
    /// UTC instant, microsecond resolution.
    Timestamp(DateTime<Utc>),
    /// Large object, fetched on demand.
    Blob(FrontbaseBlob),
}

impl FrontbaseValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let FrontbaseValue::Integer(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Boolean view; integer and float values coerce on the usual
    /// zero/non-zero convention.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FrontbaseValue::Boolean(value) => Some(*value),
            FrontbaseValue::Integer(value) => Some(*value != 0),
            FrontbaseValue::Float(value) => Some(*value != 0.0),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let FrontbaseValue::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        if let FrontbaseValue::Decimal(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let FrontbaseValue::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bits(&self) -> Option<&[u8]> {
        if let FrontbaseValue::Bits(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        if let FrontbaseValue::Timestamp(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&FrontbaseBlob> {
        if let FrontbaseValue::Blob(value) = self {
            Some(value)
        } else {
            None
        }
    }
}

impl std::fmt::Display for FrontbaseValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrontbaseValue::Null => f.write_str("null"),
            FrontbaseValue::Boolean(value) => write!(f, "{value}"),
            FrontbaseValue::Integer(value) => write!(f, "{value}"),
            FrontbaseValue::Float(value) => write!(f, "{value}"),
            FrontbaseValue::Decimal(value) => write!(f, "{value}"),
            FrontbaseValue::Text(value) => write!(f, "\"{value}\""),
            FrontbaseValue::Bits(value) => f.write_str(&render::bit_literal(value)),
            FrontbaseValue::Timestamp(value) => write!(f, "{value}"),
            FrontbaseValue::Blob(value) => write!(f, "{value:?}"),
        }
    }
}

impl serde::Serialize for FrontbaseValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FrontbaseValue::Null => serializer.serialize_none(),
            FrontbaseValue::Boolean(value) => serializer.serialize_bool(*value),
            FrontbaseValue::Integer(value) => serializer.serialize_i64(*value),
            FrontbaseValue::Float(value) => serializer.serialize_f64(*value),
            FrontbaseValue::Decimal(value) => serde::Serialize::serialize(value, serializer),
            FrontbaseValue::Text(value) => serializer.serialize_str(value),
            FrontbaseValue::Bits(value) => value.serialize(serializer),
            FrontbaseValue::Timestamp(value) => value.serialize(serializer),
            FrontbaseValue::Blob(value) => value.serialize(serializer),
        }
    }
}
