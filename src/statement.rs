//! SQL statement tokenizing and placeholder binding.
//!
//! The engine has no native bind parameters, so `?` placeholders are
//! substituted with rendered literals before execution. The tokenizer runs
//! once per statement text; binding walks the node list and can be re-run
//! with fresh values.

use crate::error::FrontbaseDbError;
use crate::value::FrontbaseValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StatementNode {
    /// Literal SQL text, emitted verbatim.
    Text(String),
    /// One `?` placeholder, filled from the bind values in order.
    Placeholder,
}

/// A statement text split into literal-text and placeholder nodes.
#[derive(Debug, Clone)]
pub(crate) struct ParsedStatement {
    nodes: Vec<StatementNode>,
}

enum ScanState {
    Plain,
    SingleQuoted,
    DoubleQuoted,
}

impl ParsedStatement {
    /// Split SQL text on `?` placeholders.
    ///
    /// A single left-to-right scan. `?` inside a single-quoted literal or
    /// a double-quoted identifier is plain text, never a placeholder; a
    /// doubled `''` inside a literal escapes one quote character and does
    /// not terminate the literal. Scanning bytes is safe here because the
    /// significant characters are all ASCII and multi-byte UTF-8 sequences
    /// never contain ASCII bytes.
    pub(crate) fn parse(sql: &str) -> Self {
        let bytes = sql.as_bytes();
        let mut nodes = Vec::new();
        let mut state = ScanState::Plain;
        let mut start = 0;
        let mut idx = 0;

        while idx < bytes.len() {
            match state {
                ScanState::Plain => match bytes[idx] {
                    b'\'' => state = ScanState::SingleQuoted,
                    b'"' => state = ScanState::DoubleQuoted,
                    b'?' => {
                        if start < idx {
                            nodes.push(StatementNode::Text(sql[start..idx].to_string()));
                        }
                        nodes.push(StatementNode::Placeholder);
                        start = idx + 1;
                    }
                    _ => {}
                },
                ScanState::SingleQuoted => {
                    if bytes[idx] == b'\'' {
                        if bytes.get(idx + 1) == Some(&b'\'') {
                            idx += 1; // escaped quote, literal continues
                        } else {
                            state = ScanState::Plain;
                        }
                    }
                }
                ScanState::DoubleQuoted => {
                    if bytes[idx] == b'"' {
                        state = ScanState::Plain;
                    }
                }
            }
            idx += 1;
        }

        if start < bytes.len() {
            nodes.push(StatementNode::Text(sql[start..].to_string()));
        }

        Self { nodes }
    }

    pub(crate) fn placeholder_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, StatementNode::Placeholder))
            .count()
    }

    /// Substitute bound values into the statement, producing literal SQL.
    ///
    /// Values are consumed left to right, one per placeholder.
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::ParameterError`] when the number of
    /// values does not match the number of placeholders, in either
    /// direction.
    pub(crate) fn bind(&self, binds: &[FrontbaseValue]) -> Result<String, FrontbaseDbError> {
        let expected = self.placeholder_count();
        if binds.len() != expected {
            return Err(FrontbaseDbError::ParameterError(format!(
                "statement expects {expected} parameters, {} provided",
                binds.len()
            )));
        }

        let mut values = binds.iter();
        let mut sql = String::new();
        for node in &self.nodes {
            match node {
                StatementNode::Text(text) => sql.push_str(text),
                StatementNode::Placeholder => {
                    let value = values.next().ok_or_else(|| {
                        FrontbaseDbError::ParameterError(format!(
                            "statement expects {expected} parameters, {} provided",
                            binds.len()
                        ))
                    })?;
                    sql.push_str(&value.literal()?);
                }
            }
        }
        Ok(sql)
    }
}
