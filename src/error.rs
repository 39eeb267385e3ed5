use thiserror::Error;

/// Errors surfaced by the FrontBase middleware.
///
/// Native failures keep the client library's message text verbatim, since
/// that message (e.g. a SQL syntax diagnostic) is usually the only
/// actionable detail available.
#[derive(Debug, Error)]
pub enum FrontbaseDbError {
    /// Connecting or configuring the session on a new connection failed.
    #[error("Could not open database: {0}")]
    OpenError(String),

    /// Placeholder/value arity mismatch while binding a statement.
    ///
    /// Raised before anything is sent to the native engine.
    #[error("Parameter binding error: {0}")]
    ParameterError(String),

    /// The native engine rejected an execute or fetch.
    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    /// An operation was attempted after `close()` completed.
    #[error("Connection has been closed")]
    ConnectionClosed,

    /// The native engine could not allocate a blob handle.
    #[error("Blob handle creation failed: {0}")]
    BlobError(String),

    /// `with_transaction` was entered while a transaction was already open.
    #[error("A transaction is already in progress")]
    TransactionAlreadyOpen,
}
