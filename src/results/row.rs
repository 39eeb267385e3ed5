use crate::convert::FrontbaseConvertible;
use crate::value::FrontbaseValue;

use super::column::FrontbaseColumn;

/// A row from a query result.
///
/// Columns are kept in native fetch order. Duplicate names across
/// different tables are valid; [`get`](FrontbaseRow::get) returns the
/// first match in column order, so callers that need a specific side of a
/// join should disambiguate with [`get_in_table`](FrontbaseRow::get_in_table).
#[derive(Debug, Clone, PartialEq)]
pub struct FrontbaseRow {
    data: Vec<(FrontbaseColumn, FrontbaseValue)>,
}

impl FrontbaseRow {
    pub(crate) fn new(data: Vec<(FrontbaseColumn, FrontbaseValue)>) -> Self {
        Self { data }
    }

    /// Get a value by column name; the first matching column wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FrontbaseValue> {
        self.data
            .iter()
            .find(|(column, _)| column.name == name)
            .map(|(_, value)| value)
    }

    /// Get a value by table and column name.
    ///
    /// Columns the engine could not attribute to a table match any
    /// requested table.
    #[must_use]
    pub fn get_in_table(&self, table: &str, name: &str) -> Option<&FrontbaseValue> {
        self.data
            .iter()
            .find(|(column, _)| {
                column.name == name
                    && column
                        .table
                        .as_deref()
                        .is_none_or(|column_table| column_table == table)
            })
            .map(|(_, value)| value)
    }

    /// Get a value by column position in fetch order.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&FrontbaseValue> {
        self.data.get(index).map(|(_, value)| value)
    }

    /// Get a value by name, converted into an application type.
    #[must_use]
    pub fn get_as<T: FrontbaseConvertible>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_frontbase)
    }

    pub fn columns(&self) -> impl Iterator<Item = &FrontbaseColumn> {
        self.data.iter().map(|(column, _)| column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FrontbaseColumn, &FrontbaseValue)> {
        self.data.iter().map(|(column, value)| (column, value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
