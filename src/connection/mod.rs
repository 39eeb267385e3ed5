//! Connections to a FrontBase database.
//!
//! A connection owns one dedicated worker thread through which every
//! blocking native call is serialized. The handle itself
//! is cheap to clone and every clone talks to the same worker, so
//! concurrent callers are ordered FIFO by enqueue order while separate
//! connections proceed fully in parallel.

pub mod config;
pub mod transaction;
pub(crate) mod worker;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::unbounded_channel;
use tokio::sync::oneshot;

use crate::engine::EngineConnector;
use crate::error::FrontbaseDbError;
use crate::results::FrontbaseRow;
use crate::value::FrontbaseValue;

use config::Storage;
use worker::{Command, WorkerHandle};

/// A connection to a FrontBase database.
///
/// Created with [`open`](FrontbaseConnection::open); queries run through
/// [`query`](FrontbaseConnection::query) or
/// [`query_each`](FrontbaseConnection::query_each):
/// ```rust
/// use frontbase_middleware::{FrontbaseConnection, FrontbaseDbError, FrontbaseValue};
///
/// async fn demo(conn: &FrontbaseConnection) -> Result<(), FrontbaseDbError> {
///     let rows = conn
///         .query(
///             "SELECT name FROM users WHERE id = ?",
///             vec![FrontbaseValue::Integer(7)],
///         )
///         .await?;
///     for row in rows {
///         println!("{:?}", row.get("name"));
///     }
///     Ok(())
/// }
/// ```
///
/// Call [`close`](FrontbaseConnection::close) when done; a connection
/// dropped with a live native handle is reported as a leak (and the handle
/// reclaimed) by the worker.
#[derive(Clone)]
pub struct FrontbaseConnection {
    worker: Arc<WorkerHandle>,
}

impl FrontbaseConnection {
    /// Open a connection and configure its session mode.
    ///
    /// The connector supplies the native client implementation; the
    /// connect call itself runs on the connection's worker thread.
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::OpenError`] carrying the native message
    /// when connecting or configuring the session fails.
    pub async fn open(
        storage: Storage,
        session_name: impl Into<String>,
        connector: Box<dyn EngineConnector>,
    ) -> Result<Self, FrontbaseDbError> {
        let (worker, open_rx) = WorkerHandle::spawn(storage, session_name.into(), connector)?;
        open_rx.await.map_err(|_| {
            FrontbaseDbError::OpenError("connection worker exited before reporting a result".into())
        })??;
        Ok(Self { worker })
    }

    /// Whether `close()` has completed (or at least begun) on this
    /// connection.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.worker.is_closed()
    }

    /// Execute a query and collect all rows.
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::ParameterError`] on a placeholder arity
    /// mismatch (before anything reaches the engine),
    /// [`FrontbaseDbError::ExecutionError`] with the native message when
    /// the engine rejects the statement, or
    /// [`FrontbaseDbError::ConnectionClosed`] after `close()`.
    pub async fn query(
        &self,
        sql: &str,
        binds: Vec<FrontbaseValue>,
    ) -> Result<Vec<FrontbaseRow>, FrontbaseDbError> {
        let mut rows = Vec::new();
        self.query_each(sql, binds, |row| {
            rows.push(row);
            Ok(())
        })
        .await?;
        Ok(rows)
    }

    /// Execute a query, invoking the callback once per row.
    ///
    /// Rows arrive in native fetch order. The callback runs on the
    /// caller's task, never on the connection worker; returning an error
    /// stops row delivery (the native result set is closed early) and that
    /// error becomes the call's result.
    ///
    /// # Errors
    /// As [`query`](FrontbaseConnection::query), plus any error the
    /// callback returns.
    pub async fn query_each<F>(
        &self,
        sql: &str,
        binds: Vec<FrontbaseValue>,
        mut on_row: F,
    ) -> Result<(), FrontbaseDbError>
    where
        F: FnMut(FrontbaseRow) -> Result<(), FrontbaseDbError>,
    {
        tracing::debug!(sql, ?binds, "executing query");
        let (row_tx, mut row_rx) = unbounded_channel();
        let (tx, rx) = oneshot::channel();
        self.worker.send(Command::Execute {
            sql: sql.to_string(),
            binds,
            rows: row_tx,
            respond_to: tx,
        })?;

        let mut callback_error = None;
        while let Some(row) = row_rx.recv().await {
            if callback_error.is_none()
                && let Err(err) = on_row(row)
            {
                callback_error = Some(err);
                row_rx.close();
            }
        }

        let outcome = rx.await.map_err(|_| FrontbaseDbError::ConnectionClosed)?;
        match callback_error {
            Some(err) => Err(err),
            None => outcome,
        }
    }

    /// Close the connection, releasing the native handle.
    ///
    /// Commands still queued behind the close observe the connection as
    /// closed and fail with [`FrontbaseDbError::ConnectionClosed`]; an
    /// operation already running on the worker completes first (there is
    /// no mid-query cancellation). Calling `close` again is a no-op that
    /// reports success.
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::ConnectionClosed`] only if the worker
    /// is already gone.
    pub async fn close(&self) -> Result<(), FrontbaseDbError> {
        self.worker.mark_closed();
        let (tx, rx) = oneshot::channel();
        self.worker.send(Command::Close { respond_to: tx })?;
        rx.await.map_err(|_| FrontbaseDbError::ConnectionClosed)
    }

    pub(crate) fn worker(&self) -> &Arc<WorkerHandle> {
        &self.worker
    }
}

impl fmt::Debug for FrontbaseConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrontbaseConnection")
            .field("closed", &self.is_closed())
            .finish()
    }
}
