//! Core types and contracts for sqlshim.
//!
//! This crate sits on the boundary between a host database framework and
//! an embedded SQLite-compatible engine substituted underneath it:
//!
//! - [`DialectClient`] - what the host calls on its dialect client
//! - [`Driver`] / [`RawConnection`] - what the substituted engine provides
//! - [`IdentitySlot`] / [`Identify`] - the name-reporting surface the host inspects
//! - `Outcome` and `Cx` re-exported from asupersync for cancel-correct operations

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod client;
pub mod driver;
pub mod error;
pub mod identity;
pub mod row;
pub mod value;

pub use client::{DialectClient, QueryInput, QueryResponse};
pub use driver::{ConnectionSettings, Driver, RawConnection, SyncSettings};
pub use error::{ConfigError, Error, Result};
pub use identity::{
    Identify, IdentitySlot, NEUTRAL_TYPE_TAG, ReportedIdentity, SQLITE_CLIENT_NAME,
    SQLITE_DIALECT, host_recognizes_sqlite, spoof,
};
pub use row::{ColumnInfo, Row};
pub use value::Value;
