//! Bidirectional conversion between application types and
//! [`FrontbaseValue`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use uuid::Uuid;

use crate::blob::FrontbaseBlob;
use crate::value::FrontbaseValue;

/// Capable of converting to and from [`FrontbaseValue`].
///
/// `from_frontbase` returns `None` when the value's variant (or range)
/// does not fit the target type; it never coerces lossily beyond the
/// documented cases.
pub trait FrontbaseConvertible: Sized {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self>;

    fn to_frontbase(&self) -> FrontbaseValue;
}

impl FrontbaseConvertible for bool {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        value.as_bool()
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Boolean(*self)
    }
}

macro_rules! integer_convertible {
    ($($int:ty),*) => {
        $(
            impl FrontbaseConvertible for $int {
                fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
                    match value {
                        FrontbaseValue::Integer(integer) => Self::try_from(*integer).ok(),
                        FrontbaseValue::Float(float) => {
                            let truncated = float.trunc();
                            if truncated >= <$int>::MIN as f64 && truncated <= <$int>::MAX as f64 {
                                Some(truncated as $int)
                            } else {
                                None
                            }
                        }
                        _ => None,
                    }
                }

                fn to_frontbase(&self) -> FrontbaseValue {
                    FrontbaseValue::Integer(*self as i64)
                }
            }
        )*
    };
}

integer_convertible!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FrontbaseConvertible for f64 {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        match value {
            FrontbaseValue::Float(float) => Some(*float),
            FrontbaseValue::Integer(integer) => Some(*integer as f64),
            _ => None,
        }
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Float(*self)
    }
}

impl FrontbaseConvertible for f32 {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        f64::from_frontbase(value).map(|float| float as f32)
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Float(f64::from(*self))
    }
}

impl FrontbaseConvertible for String {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        value.as_text().map(str::to_string)
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Text(self.clone())
    }
}

impl FrontbaseConvertible for Decimal {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        match value {
            FrontbaseValue::Decimal(decimal) => Some(*decimal),
            FrontbaseValue::Integer(integer) => Some(Decimal::from(*integer)),
            FrontbaseValue::Float(float) => Decimal::from_f64(*float),
            _ => None,
        }
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Decimal(*self)
    }
}

impl FrontbaseConvertible for DateTime<Utc> {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        value.as_timestamp()
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Timestamp(*self)
    }
}

/// Blob content. Converting out of a value only succeeds once the blob's
/// content is in memory; fetch unrealized blobs with
/// [`FrontbaseBlob::data`] first.
impl FrontbaseConvertible for Vec<u8> {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        value.as_blob().and_then(FrontbaseBlob::content)
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Blob(FrontbaseBlob::from_bytes(self.clone()))
    }
}

/// Fixed-size bit strings, e.g. `[u8; 12]` for a 96-bit key column.
impl<const N: usize> FrontbaseConvertible for [u8; N] {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        value.as_bits().and_then(|bits| bits.try_into().ok())
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Bits(self.to_vec())
    }
}

/// 128-bit identifiers stored as 16-byte bit strings; text columns holding
/// a UUID in canonical form convert as well.
impl FrontbaseConvertible for Uuid {
    fn from_frontbase(value: &FrontbaseValue) -> Option<Self> {
        match value {
            FrontbaseValue::Bits(bits) => Uuid::from_slice(bits).ok(),
            FrontbaseValue::Text(text) => Uuid::parse_str(text).ok(),
            _ => None,
        }
    }

    fn to_frontbase(&self) -> FrontbaseValue {
        FrontbaseValue::Bits(self.as_bytes().to_vec())
    }
}
