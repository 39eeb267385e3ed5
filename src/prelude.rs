//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types to make it easier
//! to get started with the library.

pub use crate::blob::FrontbaseBlob;
pub use crate::connection::FrontbaseConnection;
pub use crate::connection::config::{
    AccessMode, IsolationLevel, LockingMode, SessionMode, Storage,
};
pub use crate::convert::FrontbaseConvertible;
pub use crate::engine::{EngineConnector, EngineError};
pub use crate::error::FrontbaseDbError;
pub use crate::results::{FrontbaseColumn, FrontbaseRow};
pub use crate::value::FrontbaseValue;
