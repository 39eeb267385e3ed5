//! Large-object values with lazy native handles.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::connection::worker::WorkerHandle;
use crate::engine::EngineConnection;
use crate::error::FrontbaseDbError;

/// A FrontBase large object.
///
/// A blob fetched from a column knows its native handle and declared size
/// but not its content; [`data`](FrontbaseBlob::data) fetches the content
/// once and caches it. A blob built from bytes with
/// [`from_bytes`](FrontbaseBlob::from_bytes) has content but no handle; a
/// handle is created lazily the first time the blob is bound into a
/// statement, and cached so re-binding the same value never allocates a
/// second one.
///
/// Handles created through this driver are released back to the owning
/// connection exactly once, when the last clone of the blob is dropped.
/// Handles that arrived with a fetched column belong to the engine and are
/// left alone. The blob only holds a weak reference to its connection, so
/// it never extends the connection's lifetime.
///
/// Equality compares handle strings, not content.
#[derive(Clone)]
pub struct FrontbaseBlob {
    inner: Arc<BlobInner>,
}

struct BlobInner {
    state: Mutex<BlobState>,
}

struct BlobState {
    handle: Option<String>,
    content: Option<Vec<u8>>,
    size: Option<u32>,
    worker: Option<Weak<WorkerHandle>>,
    driver_created: bool,
}

impl FrontbaseBlob {
    /// Wrap in-memory content, to be inserted through a statement later.
    #[must_use]
    pub fn from_bytes(content: Vec<u8>) -> Self {
        Self::with_state(BlobState {
            handle: None,
            content: Some(content),
            size: None,
            worker: None,
            driver_created: false,
        })
    }

    /// Wrap a handle fetched from a result-set column.
    pub(crate) fn from_handle(handle: String, size: u32, worker: Weak<WorkerHandle>) -> Self {
        Self::with_state(BlobState {
            handle: Some(handle),
            content: None,
            size: Some(size),
            worker: Some(worker),
            driver_created: false,
        })
    }

    fn with_state(state: BlobState) -> Self {
        Self {
            inner: Arc::new(BlobInner {
                state: Mutex::new(state),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BlobState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// The native handle string, if one exists yet.
    #[must_use]
    pub fn handle(&self) -> Option<String> {
        self.lock().handle.clone()
    }

    /// The content size in bytes, without fetching anything: the declared
    /// size for fetched blobs, the buffer length for in-memory ones.
    #[must_use]
    pub fn size(&self) -> Option<u32> {
        let state = self.lock();
        state
            .size
            .or_else(|| state.content.as_ref().map(|content| content.len() as u32))
    }

    /// The cached content, if it is already in memory.
    ///
    /// Returns `None` for a fetched blob whose content has not been pulled
    /// through [`data`](FrontbaseBlob::data) yet.
    #[must_use]
    pub fn content(&self) -> Option<Vec<u8>> {
        self.lock().content.clone()
    }

    /// The blob content, fetching it from the owning connection on first
    /// access and serving the cached bytes afterwards.
    ///
    /// # Errors
    /// Returns [`FrontbaseDbError::ConnectionClosed`] when the content is
    /// not cached and the owning connection is gone, or the fetch itself
    /// fails on a closed connection.
    pub async fn data(&self) -> Result<Vec<u8>, FrontbaseDbError> {
        let (handle, size, worker) = {
            let state = self.lock();
            if let Some(content) = &state.content {
                return Ok(content.clone());
            }
            match (&state.handle, state.size, &state.worker) {
                (Some(handle), Some(size), Some(worker)) => {
                    (handle.clone(), size, worker.clone())
                }
                _ => {
                    return Err(FrontbaseDbError::BlobError(
                        "blob has neither content nor a native handle".into(),
                    ));
                }
            }
        };

        let worker = worker
            .upgrade()
            .ok_or(FrontbaseDbError::ConnectionClosed)?;
        let bytes = worker.fetch_blob(handle, size).await?;

        let mut state = self.lock();
        // A concurrent fetch may have beaten us to the cache.
        if let Some(content) = &state.content {
            return Ok(content.clone());
        }
        state.content = Some(bytes.clone());
        Ok(bytes)
    }

    /// Make sure this blob has a native handle under the given connection,
    /// creating one from the in-memory content if needed.
    ///
    /// Runs on the connection's worker thread, which is why the engine is
    /// handed in directly instead of going through the command channel.
    pub(crate) fn realize_handle(
        &self,
        worker: &Arc<WorkerHandle>,
        engine: &mut dyn EngineConnection,
    ) -> Result<String, FrontbaseDbError> {
        let mut state = self.lock();
        if state.worker.is_none() {
            state.worker = Some(Arc::downgrade(worker));
        }
        if let Some(handle) = &state.handle {
            return Ok(handle.clone());
        }
        let content = state.content.as_deref().ok_or_else(|| {
            FrontbaseDbError::BlobError("blob has neither content nor a native handle".into())
        })?;
        let handle = engine
            .create_blob(content)
            .map_err(|err| FrontbaseDbError::BlobError(err.message))?;
        state.handle = Some(handle.clone());
        state.driver_created = true;
        Ok(handle)
    }
}

impl Drop for BlobInner {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if state.driver_created
            && let Some(handle) = state.handle.take()
            && let Some(worker) = state.worker.as_ref().and_then(Weak::upgrade)
        {
            worker.release_blob(handle);
        }
    }
}

impl PartialEq for FrontbaseBlob {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.handle() == other.handle()
    }
}

impl fmt::Debug for FrontbaseBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        match (&state.handle, &state.content) {
            (Some(handle), _) => write!(f, "FrontbaseBlob({handle})"),
            (None, Some(content)) => write!(f, "FrontbaseBlob({} bytes of data)", content.len()),
            (None, None) => write!(f, "FrontbaseBlob(empty)"),
        }
    }
}

impl serde::Serialize for FrontbaseBlob {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.handle() {
            Some(handle) => serializer.serialize_str(&handle),
            None => serializer.serialize_none(),
        }
    }
}
