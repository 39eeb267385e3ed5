//! Dedicated worker thread owning the native connection handle.
//!
//! The native client library is blocking and not proven safe for
//! concurrent use, so every native call for a connection — open, execute,
//! blob create/fetch/release, close — runs on this one thread, in strict
//! enqueue order. The async surface communicates with it over a command
//! channel and per-command oneshot responses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Weak};
use std::thread;

use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::connection::config::Storage;
use crate::engine::{ColumnInfo, EngineConnection, EngineConnector};
use crate::error::FrontbaseDbError;
use crate::results::{FrontbaseColumn, FrontbaseRow};
use crate::statement::ParsedStatement;
use crate::value::{FrontbaseValue, decode_column};

pub(crate) enum Command {
    Execute {
        sql: String,
        binds: Vec<FrontbaseValue>,
        rows: UnboundedSender<FrontbaseRow>,
        respond_to: oneshot::Sender<Result<(), FrontbaseDbError>>,
    },
    FetchBlob {
        handle: String,
        size: u32,
        respond_to: oneshot::Sender<Result<Vec<u8>, FrontbaseDbError>>,
    },
    ReleaseBlob {
        handle: String,
    },
    Close {
        respond_to: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Caller-side handle to a connection worker.
pub(crate) struct WorkerHandle {
    sender: Sender<Command>,
    closed: Arc<AtomicBool>,
    auto_commit: Arc<AtomicBool>,
}

impl WorkerHandle {
    /// Spawn the worker thread, which connects and configures the session
    /// before serving commands. The open outcome arrives on the returned
    /// receiver.
    pub(crate) fn spawn(
        storage: Storage,
        session_name: String,
        connector: Box<dyn EngineConnector>,
    ) -> Result<
        (
            Arc<WorkerHandle>,
            oneshot::Receiver<Result<(), FrontbaseDbError>>,
        ),
        FrontbaseDbError,
    > {
        let (sender, receiver) = mpsc::channel::<Command>();
        let closed = Arc::new(AtomicBool::new(false));
        let auto_commit = Arc::new(AtomicBool::new(true));
        let handle = Arc::new(WorkerHandle {
            sender,
            closed: Arc::clone(&closed),
            auto_commit: Arc::clone(&auto_commit),
        });
        let weak = Arc::downgrade(&handle);
        let (open_tx, open_rx) = oneshot::channel();

        thread::Builder::new()
            .name("frontbase-worker".into())
            .spawn(move || {
                run_worker(
                    &storage,
                    &session_name,
                    connector.as_ref(),
                    &receiver,
                    &weak,
                    &closed,
                    &auto_commit,
                    open_tx,
                );
            })
            .map_err(|err| {
                FrontbaseDbError::OpenError(format!(
                    "failed to spawn connection worker thread: {err}"
                ))
            })?;

        Ok((handle, open_rx))
    }

    pub(crate) fn send(&self, command: Command) -> Result<(), FrontbaseDbError> {
        self.sender
            .send(command)
            .map_err(|_| FrontbaseDbError::ConnectionClosed)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Flag the connection as closed before the close command is even
    /// processed, so commands already sitting in the queue resolve with
    /// `ConnectionClosed` instead of touching the native handle.
    pub(crate) fn mark_closed(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub(crate) fn auto_commit(&self) -> &AtomicBool {
        &self.auto_commit
    }

    pub(crate) async fn fetch_blob(
        &self,
        handle: String,
        size: u32,
    ) -> Result<Vec<u8>, FrontbaseDbError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::FetchBlob {
            handle,
            size,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| FrontbaseDbError::ConnectionClosed)?
    }

    pub(crate) fn release_blob(&self, handle: String) {
        let _ = self.sender.send(Command::ReleaseBlob { handle });
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

#[allow(clippy::too_many_arguments)]
fn run_worker(
    storage: &Storage,
    session_name: &str,
    connector: &dyn EngineConnector,
    receiver: &Receiver<Command>,
    handle: &Weak<WorkerHandle>,
    closed: &AtomicBool,
    auto_commit: &AtomicBool,
    open_tx: oneshot::Sender<Result<(), FrontbaseDbError>>,
) {
    let mut conn = match connector.connect(storage, session_name) {
        Ok(conn) => conn,
        Err(err) => {
            tracing::error!(%storage, error = %err, "failed to connect");
            let _ = open_tx.send(Err(FrontbaseDbError::OpenError(format!(
                "{storage} ({err})"
            ))));
            return;
        }
    };

    // Session mode is configured exactly once, before any caller work.
    match conn.execute(&storage.session_mode().sql(), true) {
        Ok(result) => drop(result),
        Err(err) => {
            tracing::error!(%storage, error = %err, "failed to set session mode");
            conn.close();
            let _ = open_tx.send(Err(FrontbaseDbError::OpenError(format!(
                "could not set session mode on {storage} ({err})"
            ))));
            return;
        }
    }

    tracing::debug!(%storage, "connected");
    let _ = open_tx.send(Ok(()));

    let mut conn = Some(conn);
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Execute {
                sql,
                binds,
                rows,
                respond_to,
            } => {
                let outcome = match conn.as_deref_mut() {
                    Some(engine) if !closed.load(Ordering::SeqCst) => execute_statement(
                        engine,
                        handle,
                        &sql,
                        &binds,
                        auto_commit.load(Ordering::SeqCst),
                        &rows,
                    ),
                    _ => Err(FrontbaseDbError::ConnectionClosed),
                };
                let _ = respond_to.send(outcome);
            }
            Command::FetchBlob {
                handle: blob_handle,
                size,
                respond_to,
            } => {
                let outcome = match conn.as_deref_mut() {
                    Some(engine) if !closed.load(Ordering::SeqCst) => engine
                        .blob_data(&blob_handle, size)
                        .map_err(|err| FrontbaseDbError::ExecutionError(err.message)),
                    _ => Err(FrontbaseDbError::ConnectionClosed),
                };
                let _ = respond_to.send(outcome);
            }
            Command::ReleaseBlob {
                handle: blob_handle,
            } => {
                if let Some(engine) = conn.as_deref_mut()
                    && !closed.load(Ordering::SeqCst)
                {
                    engine.release_blob(&blob_handle);
                }
            }
            Command::Close { respond_to } => {
                if let Some(mut engine) = conn.take() {
                    engine.close();
                    tracing::debug!(%storage, "connection closed");
                }
                let _ = respond_to.send(());
            }
            Command::Shutdown => break,
        }
    }

    // All caller handles are gone (or close was skipped). A live native
    // handle at this point is a leak on the caller's side; close it rather
    // than abandon it.
    if let Some(mut engine) = conn.take() {
        tracing::error!(
            %storage,
            "connection dropped with a live native handle; closing as a safety net"
        );
        engine.close();
    }
}

fn execute_statement(
    engine: &mut dyn EngineConnection,
    worker: &Weak<WorkerHandle>,
    sql: &str,
    binds: &[FrontbaseValue],
    auto_commit: bool,
    rows: &UnboundedSender<FrontbaseRow>,
) -> Result<(), FrontbaseDbError> {
    // Blob parameters need native handles before their literals can be
    // rendered; creating them here keeps the call on the worker thread.
    if let Some(worker) = worker.upgrade() {
        for bind in binds {
            if let FrontbaseValue::Blob(blob) = bind {
                blob.realize_handle(&worker, engine)?;
            }
        }
    }

    let statement = ParsedStatement::parse(sql);
    let bound = statement.bind(binds)?;

    let mut result = engine
        .execute(&terminated(&bound), auto_commit)
        .map_err(|err| FrontbaseDbError::ExecutionError(err.message))?;

    let columns: Vec<ColumnInfo> = (0..result.column_count())
        .map(|index| result.column_info(index))
        .collect();

    while let Some(row) = result.fetch_row() {
        let mut data = Vec::with_capacity(columns.len());
        for (index, info) in columns.iter().enumerate() {
            let column = FrontbaseColumn::new(info.table.clone(), info.label.clone());
            data.push((column, decode_column(row.as_ref(), index, info, worker)?));
        }
        if rows.send(FrontbaseRow::new(data)).is_err() {
            // Receiver went away; stop fetching. Dropping the result below
            // closes it.
            break;
        }
    }

    Ok(())
}

// The engine wants statements terminated.
fn terminated(sql: &str) -> String {
    if sql.trim_end().ends_with(';') {
        sql.to_string()
    } else {
        format!("{sql};")
    }
}
