//! Boundary to the native FBCAccess client library.
//!
//! Every call through these traits is blocking and single-threaded-safe
//! only when serialized, so the connection worker is the sole caller.
//! Keeping the column tag set and the typed getters here means native type
//! codes never leak past this module: the decode layer in
//! [`crate::value`] translates them into [`crate::value::FrontbaseValue`]
//! variants and nothing else sees them.
//!
//! The crate does not link FBCAccess itself; a backend crate (or the
//! `test_utils` mock) supplies the implementation via [`EngineConnector`].

use std::fmt;

use crate::connection::config::Storage;

/// Error reported by the native client library.
///
/// Carries the native message text untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineError {
    pub message: String,
}

impl EngineError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for EngineError {}

/// Native column type tags as reported by the client library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Datatype {
    PrimaryKey,
    Boolean,
    Integer,
    SmallInteger,
    TinyInteger,
    LongInteger,
    Float,
    Real,
    Double,
    Numeric,
    Decimal,
    Character,
    VCharacter,
    Bit,
    VBit,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    YearMonth,
    DayTime,
    Clob,
    Blob,
    CircaDate,
    /// Dynamically typed column; the concrete tag is read per row via
    /// [`EngineRow::any_type_tag`].
    AnyType,
}

/// Metadata for one column of a native result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Owning table, when the engine can attribute one.
    pub table: Option<String>,
    /// Column label as reported by the engine.
    pub label: String,
    pub datatype: Datatype,
    /// Declared scale for `Decimal` columns; 0 otherwise.
    pub scale: u32,
}

/// Factory for native connections.
pub trait EngineConnector: Send {
    /// Open a native connection for the given storage descriptor.
    ///
    /// Invoked on the connection's dedicated worker thread; blocking is
    /// expected.
    ///
    /// # Errors
    /// Returns [`EngineError`] with the native message when the engine
    /// refuses the connection.
    fn connect(
        &self,
        storage: &Storage,
        session_name: &str,
    ) -> Result<Box<dyn EngineConnection>, EngineError>;
}

/// An open native connection.
///
/// Exclusively owned by one worker thread; never shared.
pub trait EngineConnection: Send {
    /// Execute literal SQL, honoring the per-statement autocommit flag.
    ///
    /// # Errors
    /// Returns [`EngineError`] carrying the engine's diagnostic verbatim.
    fn execute(
        &mut self,
        sql: &str,
        auto_commit: bool,
    ) -> Result<Box<dyn EngineResult>, EngineError>;

    /// Allocate a native blob handle for the given content and return its
    /// string form, which doubles as the blob's SQL literal.
    ///
    /// # Errors
    /// Returns [`EngineError`] when the engine cannot allocate the handle.
    fn create_blob(&mut self, bytes: &[u8]) -> Result<String, EngineError>;

    /// Fetch the content behind a blob handle.
    ///
    /// # Errors
    /// Returns [`EngineError`] when the handle is unknown to the engine.
    fn blob_data(&mut self, handle: &str, size: u32) -> Result<Vec<u8>, EngineError>;

    /// Release a driver-created blob handle.
    fn release_blob(&mut self, handle: &str);

    /// Close the native connection.
    fn close(&mut self);
}

/// A native result set; dropped to close it.
pub trait EngineResult {
    fn column_count(&self) -> usize;

    fn column_info(&self, index: usize) -> ColumnInfo;

    /// Fetch the next row, or `None` once the result set is exhausted.
    fn fetch_row(&mut self) -> Option<Box<dyn EngineRow>>;
}

/// One fetched native row with typed per-column getters.
///
/// Callers must dispatch on [`ColumnInfo::datatype`] (or the
/// [`any_type_tag`](EngineRow::any_type_tag) for dynamic columns) before
/// picking a getter; calling a getter on a mismatched column is a contract
/// violation at the native boundary.
pub trait EngineRow {
    fn is_null(&self, index: usize) -> bool;

    fn get_boolean(&self, index: usize) -> bool;

    fn get_integer(&self, index: usize) -> i64;

    fn get_float(&self, index: usize) -> f64;

    /// Decimal payload plus the scale declared for this value.
    fn get_decimal(&self, index: usize) -> (f64, u32);

    fn get_text(&self, index: usize) -> String;

    fn get_bits(&self, index: usize) -> Vec<u8>;

    /// Microseconds since the Unix epoch, UTC.
    fn get_timestamp_micros(&self, index: usize) -> i64;

    /// Blob handle string plus the declared content size.
    fn get_blob_handle(&self, index: usize) -> (String, u32);

    /// Concrete tag behind an [`Datatype::AnyType`] column.
    fn any_type_tag(&self, index: usize) -> Datatype;
}
