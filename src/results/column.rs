use std::fmt;

use serde::Serialize;

/// Column in a FrontBase result set.
///
/// Identity is the `(table, name)` pair, so a join exposing the same
/// column name from two tables yields two distinct columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FrontbaseColumn {
    /// The owning table, when the engine can attribute one.
    pub table: Option<String>,
    /// The column's label.
    pub name: String,
}

impl FrontbaseColumn {
    #[must_use]
    pub fn new(table: Option<String>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: name.into(),
        }
    }
}

impl From<&str> for FrontbaseColumn {
    fn from(name: &str) -> Self {
        Self::new(None, name)
    }
}

impl fmt::Display for FrontbaseColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
