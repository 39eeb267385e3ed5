//! Storage descriptors and session-mode configuration.

use std::fmt;

/// How to reach a FrontBase database.
#[derive(Clone, PartialEq, Eq)]
pub enum Storage {
    /// Named database reached over the network via the exec daemon.
    Named {
        name: String,
        host: String,
        username: String,
        password: String,
        database_password: Option<String>,
        mode: SessionMode,
    },
    /// File-based database, supporting a single simultaneous connection.
    File {
        name: String,
        path: String,
        username: String,
        password: String,
        database_password: Option<String>,
        mode: SessionMode,
    },
}

impl Storage {
    /// Named database with the default session mode and no database
    /// password.
    #[must_use]
    pub fn named(
        name: impl Into<String>,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Storage::Named {
            name: name.into(),
            host: host.into(),
            username: username.into(),
            password: password.into(),
            database_password: None,
            mode: SessionMode::default(),
        }
    }

    /// File-based database with the default session mode and no database
    /// password.
    #[must_use]
    pub fn file(
        name: impl Into<String>,
        path: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Storage::File {
            name: name.into(),
            path: path.into(),
            username: username.into(),
            password: password.into(),
            database_password: None,
            mode: SessionMode::default(),
        }
    }

    #[must_use]
    pub fn with_database_password(mut self, database_password: impl Into<String>) -> Self {
        match &mut self {
            Storage::Named {
                database_password: slot,
                ..
            }
            | Storage::File {
                database_password: slot,
                ..
            } => *slot = Some(database_password.into()),
        }
        self
    }

    #[must_use]
    pub fn with_session_mode(mut self, mode: SessionMode) -> Self {
        match &mut self {
            Storage::Named { mode: slot, .. } | Storage::File { mode: slot, .. } => *slot = mode,
        }
        self
    }

    #[must_use]
    pub fn session_mode(&self) -> &SessionMode {
        match self {
            Storage::Named { mode, .. } | Storage::File { mode, .. } => mode,
        }
    }
}

// Credentials stay out of Display and Debug; storage descriptors end up in
// error messages and logs.
impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Named { name, host, .. } => {
                write!(f, "database \"{name}\" on host \"{host}\"")
            }
            Storage::File { name, path, .. } => {
                write!(f, "database \"{name}\" at \"{path}\"")
            }
        }
    }
}

impl fmt::Debug for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Named {
                name,
                host,
                username,
                mode,
                ..
            } => f
                .debug_struct("Named")
                .field("name", name)
                .field("host", host)
                .field("username", username)
                .field("mode", mode)
                .finish_non_exhaustive(),
            Storage::File {
                name,
                path,
                username,
                mode,
                ..
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("path", path)
                .field("username", username)
                .field("mode", mode)
                .finish_non_exhaustive(),
        }
    }
}

/// Isolation, locking and access configuration issued once when a
/// connection opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionMode {
    pub isolation: IsolationLevel,
    pub locking: LockingMode,
    pub access: AccessMode,
}

impl SessionMode {
    #[must_use]
    pub fn new(isolation: IsolationLevel, locking: LockingMode, access: AccessMode) -> Self {
        Self {
            isolation,
            locking,
            access,
        }
    }

    /// The `SET TRANSACTION` statement configuring this mode.
    #[must_use]
    pub fn sql(&self) -> String {
        format!(
            "SET TRANSACTION ISOLATION LEVEL {}, LOCKING {}, {};",
            self.isolation.as_sql(),
            self.locking.as_sql(),
            self.access.as_sql()
        )
    }
}

impl Default for SessionMode {
    fn default() -> Self {
        Self {
            isolation: IsolationLevel::Serializable,
            locking: LockingMode::Pessimistic,
            access: AccessMode::ReadWrite,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    Serializable,
    RepeatableRead,
    ReadCommitted,
    Versioned,
}

impl IsolationLevel {
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            IsolationLevel::Serializable => "SERIALIZABLE",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::Versioned => "VERSIONED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockingMode {
    Pessimistic,
    Optimistic,
    Deferred,
}

impl LockingMode {
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            LockingMode::Pessimistic => "PESSIMISTIC",
            LockingMode::Optimistic => "OPTIMISTIC",
            LockingMode::Deferred => "DEFERRED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    #[must_use]
    pub fn as_sql(&self) -> &'static str {
        match self {
            AccessMode::ReadWrite => "READ WRITE",
            AccessMode::ReadOnly => "READ ONLY",
        }
    }
}
