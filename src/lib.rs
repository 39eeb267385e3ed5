//! Lightweight async wrapper for the blocking FrontBase SQL client
//! library.
//!
//! FrontBase's client library is synchronous and per-connection
//! single-threaded. This crate bridges it into async Rust: each
//! [`FrontbaseConnection`] owns a dedicated worker thread that serializes
//! every native call, `?` placeholders are rewritten into injection-safe
//! literal SQL (the engine has no native bind parameters), and column data
//! is marshalled into the closed [`FrontbaseValue`] set — with blob
//! columns fetched lazily through [`FrontbaseBlob`] rather than loaded
//! eagerly.
//!
//! The native library itself is consumed through the traits in [`engine`];
//! enable the `test-utils` feature for an in-memory double.

pub mod connection;
pub mod convert;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod results;
pub mod value;

mod blob;
mod statement;
mod timestamp;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use blob::FrontbaseBlob;
pub use connection::FrontbaseConnection;
pub use connection::config::{AccessMode, IsolationLevel, LockingMode, SessionMode, Storage};
pub use convert::FrontbaseConvertible;
pub use error::FrontbaseDbError;
pub use results::{FrontbaseColumn, FrontbaseRow};
pub use value::FrontbaseValue;
