//! Decoding native column data into [`FrontbaseValue`].
//!
//! All native tag dispatch lives here. Dynamic (`AnyType`) columns take a
//! two-level dispatch: read the per-row tag first, then decode with the
//! same table as a statically typed column.

use std::str::FromStr;
use std::sync::Weak;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;

use crate::blob::FrontbaseBlob;
use crate::connection::worker::WorkerHandle;
use crate::engine::{ColumnInfo, Datatype, EngineRow};
use crate::error::FrontbaseDbError;

use super::FrontbaseValue;

/// Decode one column of a fetched native row.
///
/// # Errors
/// Returns [`FrontbaseDbError::ExecutionError`] for column types this
/// driver does not map (date-only, time-only, time-zone-qualified and
/// year-month interval types); unmapped types never decode to NULL or a
/// default.
pub(crate) fn decode_column(
    row: &dyn EngineRow,
    index: usize,
    info: &ColumnInfo,
    worker: &Weak<WorkerHandle>,
) -> Result<FrontbaseValue, FrontbaseDbError> {
    if row.is_null(index) {
        return Ok(FrontbaseValue::Null);
    }
    match info.datatype {
        // Dynamic columns carry their concrete tag per row.
        Datatype::AnyType => {
            let tag = row.any_type_tag(index);
            if tag == Datatype::AnyType {
                return Err(unexpected(info.datatype));
            }
            decode_tagged(row, index, tag, worker)
        }
        tag => decode_tagged(row, index, tag, worker),
    }
}

fn decode_tagged(
    row: &dyn EngineRow,
    index: usize,
    tag: Datatype,
    worker: &Weak<WorkerHandle>,
) -> Result<FrontbaseValue, FrontbaseDbError> {
    match tag {
        Datatype::Boolean => Ok(FrontbaseValue::Boolean(row.get_boolean(index))),
        Datatype::PrimaryKey
        | Datatype::Integer
        | Datatype::SmallInteger
        | Datatype::TinyInteger
        | Datatype::LongInteger => Ok(FrontbaseValue::Integer(row.get_integer(index))),
        Datatype::Float | Datatype::Real | Datatype::Double | Datatype::Numeric => {
            Ok(FrontbaseValue::Float(row.get_float(index)))
        }
        Datatype::Decimal => {
            let (value, scale) = row.get_decimal(index);
            Ok(FrontbaseValue::Decimal(decode_decimal(value, scale)?))
        }
        Datatype::Character | Datatype::VCharacter => {
            Ok(FrontbaseValue::Text(row.get_text(index)))
        }
        Datatype::Bit | Datatype::VBit => Ok(FrontbaseValue::Bits(row.get_bits(index))),
        Datatype::Timestamp => {
            let micros = row.get_timestamp_micros(index);
            chrono::DateTime::from_timestamp_micros(micros)
                .map(FrontbaseValue::Timestamp)
                .ok_or_else(|| {
                    FrontbaseDbError::ExecutionError(format!(
                        "Timestamp out of range: {micros} microseconds"
                    ))
                })
        }
        // Day-time intervals reduce to a fractional day count.
        Datatype::DayTime => Ok(FrontbaseValue::Float(row.get_float(index))),
        Datatype::Clob | Datatype::Blob => {
            let (handle, size) = row.get_blob_handle(index);
            Ok(FrontbaseValue::Blob(FrontbaseBlob::from_handle(
                handle,
                size,
                worker.clone(),
            )))
        }
        Datatype::Date
        | Datatype::Time
        | Datatype::TimeTz
        | Datatype::TimestampTz
        | Datatype::YearMonth
        | Datatype::CircaDate
        | Datatype::AnyType => Err(unexpected(tag)),
    }
}

// Reconstruct the decimal at its declared scale by formatting the native
// payload, rather than converting the binary float directly; falls back to
// a float-derived decimal only when that string does not parse.
fn decode_decimal(value: f64, scale: u32) -> Result<Decimal, FrontbaseDbError> {
    let rendered = format!("{value:.precision$}", precision = scale as usize);
    if let Ok(decimal) = Decimal::from_str(&rendered) {
        return Ok(decimal);
    }
    Decimal::from_f64(value).ok_or_else(|| {
        FrontbaseDbError::ExecutionError(format!("Decimal value not representable: {value}"))
    })
}

fn unexpected(tag: Datatype) -> FrontbaseDbError {
    FrontbaseDbError::ExecutionError(format!("Unexpected column type: {tag:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_decode_preserves_declared_scale() {
        let decimal = decode_decimal(12.3, 2).expect("decimal");
        assert_eq!(decimal.to_string(), "12.30");
        assert_eq!(decimal.scale(), 2);
    }

    #[test]
    fn decimal_decode_rounds_at_the_declared_scale() {
        let decimal = decode_decimal(0.125, 2).expect("decimal");
        // Rounding of the binary representation at two digits.
        assert_eq!(decimal.scale(), 2);
    }
}
