//! In-memory engine double for tests.
//!
//! [`MockConnector`] implements the [`crate::engine`] traits over shared
//! [`MockState`]: every executed statement is recorded with the autocommit
//! flag it ran under, results are served from a scripted queue, and blob
//! and close calls are counted so tests can assert on native-call
//! behavior. A minimal commit/rollback model (`pending` vs `committed`
//! statement logs) lets transaction tests observe what would have been
//! durable.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

use crate::connection::config::Storage;
use crate::engine::{
    ColumnInfo, Datatype, EngineConnection, EngineConnector, EngineError, EngineResult, EngineRow,
};

/// Column helper for scripted results.
#[must_use]
pub fn column(table: Option<&str>, label: &str, datatype: Datatype) -> ColumnInfo {
    ColumnInfo {
        table: table.map(str::to_string),
        label: label.to_string(),
        datatype,
        scale: 0,
    }
}

/// Column helper for scripted decimal results.
#[must_use]
pub fn decimal_column(table: Option<&str>, label: &str, scale: u32) -> ColumnInfo {
    ColumnInfo {
        scale,
        ..column(table, label, Datatype::Decimal)
    }
}

/// One native cell of a scripted row, in engine encoding.
#[derive(Debug, Clone)]
pub enum MockCell {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Native decimal payload with its per-value scale.
    Decimal(f64, u32),
    Text(String),
    Bits(Vec<u8>),
    TimestampMicros(i64),
    /// Blob handle string and declared size.
    BlobHandle(String, u32),
    /// Dynamically typed cell: concrete tag plus payload.
    Any(Datatype, Box<MockCell>),
}

/// A scripted result set.
#[derive(Debug, Clone, Default)]
pub struct MockResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<MockCell>>,
}

impl MockResult {
    #[must_use]
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn row(mut self, cells: Vec<MockCell>) -> Self {
        self.rows.push(cells);
        self
    }
}

/// One statement as the engine saw it.
#[derive(Debug, Clone)]
pub struct ExecutedStatement {
    pub sql: String,
    pub auto_commit: bool,
}

/// Shared state behind every connection a [`MockConnector`] produces.
#[derive(Default)]
pub struct MockState {
    executed: Mutex<Vec<ExecutedStatement>>,
    committed: Mutex<Vec<String>>,
    pending: Mutex<Vec<String>>,
    scripted: Mutex<VecDeque<Result<MockResult, String>>>,
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    next_blob: AtomicUsize,
    pub blob_creates: AtomicUsize,
    pub blob_fetches: AtomicUsize,
    pub blob_releases: AtomicUsize,
    pub closes: AtomicUsize,
    pub open_results: AtomicUsize,
    held: Mutex<bool>,
    held_cv: Condvar,
}

impl MockState {
    /// Queue a result for the next executed statement. Statements with no
    /// scripted result get an empty result set.
    pub fn script(&self, result: MockResult) {
        lock(&self.scripted).push_back(Ok(result));
    }

    /// Queue a native failure for the next executed statement.
    pub fn script_error(&self, message: &str) {
        lock(&self.scripted).push_back(Err(message.to_string()));
    }

    /// Every statement executed so far, in order.
    #[must_use]
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        lock(&self.executed).clone()
    }

    /// SQL text of every executed statement, in order.
    #[must_use]
    pub fn executed_sql(&self) -> Vec<String> {
        lock(&self.executed)
            .iter()
            .map(|statement| statement.sql.clone())
            .collect()
    }

    /// Statements that would be durable: autocommitted ones plus anything
    /// covered by a later `COMMIT`.
    #[must_use]
    pub fn committed_sql(&self) -> Vec<String> {
        lock(&self.committed).clone()
    }

    /// Statements executed inside a still-open transaction.
    #[must_use]
    pub fn pending_sql(&self) -> Vec<String> {
        lock(&self.pending).clone()
    }

    /// Content stored behind a driver-created blob handle.
    #[must_use]
    pub fn blob_content(&self, handle: &str) -> Option<Vec<u8>> {
        lock(&self.blobs).get(handle).cloned()
    }

    /// Register blob content behind a handle, as if a result column
    /// referenced it.
    pub fn seed_blob(&self, handle: &str, content: Vec<u8>) {
        lock(&self.blobs).insert(handle.to_string(), content);
    }

    /// Make every subsequent execute block until [`release`](Self::release)
    /// is called. Lets tests pin the worker mid-statement.
    pub fn hold(&self) {
        *lock(&self.held) = true;
    }

    /// Release a previous [`hold`](Self::hold).
    pub fn release(&self) {
        *lock(&self.held) = false;
        self.held_cv.notify_all();
    }

    fn wait_if_held(&self) {
        let mut held = lock(&self.held);
        while *held {
            held = self
                .held_cv
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn record(&self, sql: &str, auto_commit: bool) {
        lock(&self.executed).push(ExecutedStatement {
            sql: sql.to_string(),
            auto_commit,
        });

        let trimmed = sql.trim().trim_end_matches(';').trim();
        if trimmed.eq_ignore_ascii_case("COMMIT") {
            let mut pending = lock(&self.pending);
            lock(&self.committed).append(&mut pending);
        } else if trimmed.eq_ignore_ascii_case("ROLLBACK") {
            lock(&self.pending).clear();
        } else if auto_commit {
            lock(&self.committed).push(sql.to_string());
        } else {
            lock(&self.pending).push(sql.to_string());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Connector producing in-memory connections that share one
/// [`MockState`].
pub struct MockConnector {
    state: Arc<MockState>,
    fail_connect: Option<String>,
}

impl MockConnector {
    #[must_use]
    pub fn new() -> Self {
        Self::with_state(Arc::new(MockState::default()))
    }

    #[must_use]
    pub fn with_state(state: Arc<MockState>) -> Self {
        Self {
            state,
            fail_connect: None,
        }
    }

    /// A connector whose connect call fails with the given native message.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self {
            state: Arc::new(MockState::default()),
            fail_connect: Some(message.to_string()),
        }
    }

    #[must_use]
    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConnector for MockConnector {
    fn connect(
        &self,
        _storage: &Storage,
        _session_name: &str,
    ) -> Result<Box<dyn EngineConnection>, EngineError> {
        if let Some(message) = &self.fail_connect {
            return Err(EngineError::new(message));
        }
        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockConnection {
    state: Arc<MockState>,
}

impl EngineConnection for MockConnection {
    fn execute(
        &mut self,
        sql: &str,
        auto_commit: bool,
    ) -> Result<Box<dyn EngineResult>, EngineError> {
        self.state.wait_if_held();
        self.state.record(sql, auto_commit);
        let scripted = lock(&self.state.scripted).pop_front();
        match scripted {
            Some(Err(message)) => Err(EngineError::new(message)),
            Some(Ok(result)) => Ok(Box::new(MockResultSet::open(
                result,
                Arc::clone(&self.state),
            ))),
            None => Ok(Box::new(MockResultSet::open(
                MockResult::default(),
                Arc::clone(&self.state),
            ))),
        }
    }

    fn create_blob(&mut self, bytes: &[u8]) -> Result<String, EngineError> {
        let serial = self.state.next_blob.fetch_add(1, Ordering::SeqCst);
        let handle = format!("@'{serial:08x}'");
        lock(&self.state.blobs).insert(handle.clone(), bytes.to_vec());
        self.state.blob_creates.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn blob_data(&mut self, handle: &str, _size: u32) -> Result<Vec<u8>, EngineError> {
        self.state.blob_fetches.fetch_add(1, Ordering::SeqCst);
        lock(&self.state.blobs)
            .get(handle)
            .cloned()
            .ok_or_else(|| EngineError::new(format!("unknown blob handle {handle}")))
    }

    fn release_blob(&mut self, _handle: &str) {
        self.state.blob_releases.fetch_add(1, Ordering::SeqCst);
    }

    fn close(&mut self) {
        self.state.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockResultSet {
    columns: Vec<ColumnInfo>,
    rows: VecDeque<Vec<MockCell>>,
    state: Arc<MockState>,
}

impl MockResultSet {
    fn open(result: MockResult, state: Arc<MockState>) -> Self {
        state.open_results.fetch_add(1, Ordering::SeqCst);
        Self {
            columns: result.columns,
            rows: result.rows.into(),
            state,
        }
    }
}

impl EngineResult for MockResultSet {
    fn column_count(&self) -> usize {
        self.columns.len()
    }

    fn column_info(&self, index: usize) -> ColumnInfo {
        self.columns[index].clone()
    }

    fn fetch_row(&mut self) -> Option<Box<dyn EngineRow>> {
        self.rows
            .pop_front()
            .map(|cells| Box::new(MockRow { cells }) as Box<dyn EngineRow>)
    }
}

impl Drop for MockResultSet {
    fn drop(&mut self) {
        self.state.open_results.fetch_sub(1, Ordering::SeqCst);
    }
}

struct MockRow {
    cells: Vec<MockCell>,
}

impl MockRow {
    // Resolves Any wrappers so the typed getters see the payload.
    fn cell(&self, index: usize) -> &MockCell {
        match &self.cells[index] {
            MockCell::Any(_, inner) => inner,
            cell => cell,
        }
    }
}

impl EngineRow for MockRow {
    fn is_null(&self, index: usize) -> bool {
        matches!(self.cell(index), MockCell::Null)
    }

    fn get_boolean(&self, index: usize) -> bool {
        match self.cell(index) {
            MockCell::Boolean(value) => *value,
            cell => panic!("column {index} is not boolean: {cell:?}"),
        }
    }

    fn get_integer(&self, index: usize) -> i64 {
        match self.cell(index) {
            MockCell::Integer(value) => *value,
            cell => panic!("column {index} is not an integer: {cell:?}"),
        }
    }

    fn get_float(&self, index: usize) -> f64 {
        match self.cell(index) {
            MockCell::Float(value) => *value,
            cell => panic!("column {index} is not a float: {cell:?}"),
        }
    }

    fn get_decimal(&self, index: usize) -> (f64, u32) {
        match self.cell(index) {
            MockCell::Decimal(value, scale) => (*value, *scale),
            cell => panic!("column {index} is not a decimal: {cell:?}"),
        }
    }

    fn get_text(&self, index: usize) -> String {
        match self.cell(index) {
            MockCell::Text(value) => value.clone(),
            cell => panic!("column {index} is not text: {cell:?}"),
        }
    }

    fn get_bits(&self, index: usize) -> Vec<u8> {
        match self.cell(index) {
            MockCell::Bits(value) => value.clone(),
            cell => panic!("column {index} is not a bit string: {cell:?}"),
        }
    }

    fn get_timestamp_micros(&self, index: usize) -> i64 {
        match self.cell(index) {
            MockCell::TimestampMicros(value) => *value,
            cell => panic!("column {index} is not a timestamp: {cell:?}"),
        }
    }

    fn get_blob_handle(&self, index: usize) -> (String, u32) {
        match self.cell(index) {
            MockCell::BlobHandle(handle, size) => (handle.clone(), *size),
            cell => panic!("column {index} is not a blob: {cell:?}"),
        }
    }

    fn any_type_tag(&self, index: usize) -> Datatype {
        match &self.cells[index] {
            MockCell::Any(tag, _) => *tag,
            cell => panic!("column {index} is not dynamically typed: {cell:?}"),
        }
    }
}
