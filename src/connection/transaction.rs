//! Transaction bracketing over the connection's autocommit flag.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::FrontbaseDbError;

use super::FrontbaseConnection;

// Holds the connection's autocommit flag at false for the duration of the
// transaction body; restored on every exit path, including panics and a
// dropped future.
struct AutoCommitGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AutoCommitGuard<'a> {
    fn engage(flag: &'a AtomicBool) -> Result<Self, FrontbaseDbError> {
        if flag
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(FrontbaseDbError::TransactionAlreadyOpen);
        }
        Ok(Self { flag })
    }
}

impl Drop for AutoCommitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl FrontbaseConnection {
    /// Run `body` inside a transaction.
    ///
    /// Statements issued through the connection while `body` runs are held
    /// open rather than committed individually. On success the transaction
    /// is committed and the body's result returned; on failure it is
    /// rolled back and the body's error propagates (a rollback failure is
    /// logged as secondary, never masking the original error).
    ///
    /// Transactions do not nest: entering while one is already open fails
    /// immediately with [`FrontbaseDbError::TransactionAlreadyOpen`],
    /// before anything reaches the engine.
    /// ```rust
    /// use frontbase_middleware::{FrontbaseConnection, FrontbaseDbError, FrontbaseValue};
    ///
    /// async fn demo(conn: &FrontbaseConnection) -> Result<(), FrontbaseDbError> {
    ///     conn.with_transaction(|conn| async move {
    ///         conn.query(
    ///             "INSERT INTO audit (line) VALUES (?)",
    ///             vec![FrontbaseValue::Text("begin".into())],
    ///         )
    ///         .await?;
    ///         Ok(())
    ///     })
    ///     .await
    /// }
    /// ```
    ///
    /// # Errors
    /// [`FrontbaseDbError::TransactionAlreadyOpen`] on reentry; otherwise
    /// whatever the body, the entry round trip or the commit returns.
    pub async fn with_transaction<F, Fut, R>(&self, body: F) -> Result<R, FrontbaseDbError>
    where
        F: FnOnce(FrontbaseConnection) -> Fut,
        Fut: Future<Output = Result<R, FrontbaseDbError>>,
    {
        let guard = AutoCommitGuard::engage(self.worker().auto_commit())?;

        // No-op round trip: opens the engine-side transaction under the
        // freshly lowered flag and surfaces a dead connection before the
        // body runs.
        self.query("VALUES 0", Vec::new()).await?;

        let outcome = body(self.clone()).await;

        // Autocommit is restored around the body only; the terminating
        // statement itself runs in autocommit mode.
        drop(guard);

        match outcome {
            Ok(value) => {
                self.query("COMMIT", Vec::new()).await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.query("ROLLBACK", Vec::new()).await {
                    tracing::warn!(
                        error = %rollback_err,
                        "rollback failed after transaction body error"
                    );
                }
                Err(err)
            }
        }
    }
}
