//! Literal-SQL rendering of values.
//!
//! The engine accepts only literal SQL, so every bound value is rendered
//! into the statement text. Rendering must therefore be injection-safe on
//! its own: text doubles embedded single quotes (the engine's only string
//! metacharacter), bit strings become hex literals, numerics render
//! locale-independently.

use std::fmt::Write;

use crate::error::FrontbaseDbError;

use super::FrontbaseValue;

impl FrontbaseValue {
    /// Render this value as a SQL literal for placeholder substitution.
    ///
    /// Blob parameters must already carry a native handle (the execution
    /// path realizes handles before binding).
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::BlobError`] for a blob with no realized
    /// handle; a literal is never silently rendered from an invalid blob.
    pub(crate) fn literal(&self) -> Result<String, FrontbaseDbError> {
        match self {
            FrontbaseValue::Null => Ok("NULL".to_string()),
            FrontbaseValue::Boolean(value) => {
                Ok(if *value { "TRUE" } else { "FALSE" }.to_string())
            }
            FrontbaseValue::Integer(value) => Ok(value.to_string()),
            FrontbaseValue::Float(value) => Ok(float_literal(*value)),
            FrontbaseValue::Decimal(value) => Ok(value.to_string()),
            FrontbaseValue::Text(value) => Ok(text_literal(value)),
            FrontbaseValue::Bits(value) => Ok(bit_literal(value)),
            FrontbaseValue::Timestamp(value) => {
                Ok(format!("TIMESTAMP '{}'", crate::timestamp::format(value)))
            }
            FrontbaseValue::Blob(blob) => blob.handle().ok_or_else(|| {
                FrontbaseDbError::BlobError("no native handle realized for blob parameter".into())
            }),
        }
    }
}

fn text_literal(text: &str) -> String {
    let mut literal = String::with_capacity(text.len() + 2);
    literal.push('\'');
    for character in text.chars() {
        if character == '\'' {
            literal.push('\'');
        }
        literal.push(character);
    }
    literal.push('\'');
    literal
}

pub(super) fn bit_literal(bits: &[u8]) -> String {
    let mut literal = String::with_capacity(bits.len() * 2 + 3);
    literal.push_str("X'");
    for byte in bits {
        let _ = write!(literal, "{byte:02X}");
    }
    literal.push('\'');
    literal
}

fn float_literal(value: f64) -> String {
    let rendered = value.to_string();
    if rendered.contains('.') || !value.is_finite() {
        rendered
    } else {
        format!("{rendered}.0")
    }
}
