//! SQLite replacement driver for sqlshim.
//!
// FFI bindings require unsafe code - this is expected for database drivers
#![allow(unsafe_code)]
//!
//! Implements the `Driver`/`RawConnection` contract from sqlshim-core over
//! the bundled libsqlite3, so a host's SQLite client can be pointed at it
//! without knowing it was swapped.
//!
//! # Example
//!
//! ```rust,ignore
//! use sqlshim_core::{ConnectionSettings, Driver, QueryInput, RawConnection};
//! use sqlshim_sqlite::SqliteDriver;
//!
//! let settings = ConnectionSettings::new("./data/app.db")?
//!     .with_sync("file:/mnt/primary/app.db", 30)?;
//! let conn = SqliteDriver::new().open(settings.filename(), &settings)?;
//! conn.sync()?;
//! conn.pragma("foreign_keys = ON")?;
//! let rows = conn.execute(&QueryInput::from("SELECT 1"))?;
//! ```
//!
//! # Sync
//!
//! `sync()` pulls a full snapshot of the primary through the online backup
//! API. The primary must be a file (`file:` URL or bare path); network
//! endpoints are rejected with `SyncErrorKind::UnsupportedScheme`.
//!
//! # Thread Safety
//!
//! `SqliteConnection` is both `Send` and `Sync`, using internal mutex
//! synchronization to protect the underlying SQLite handle.

pub mod connection;
pub mod driver;
pub mod ffi;
pub mod sync;
pub mod types;

pub use connection::{OpenFlags, SqliteConfig, SqliteConnection};
pub use driver::{DEFAULT_BUSY_TIMEOUT_MS, SqliteDriver};
pub use sync::SyncSource;

/// Re-export the SQLite library version.
pub fn sqlite_version() -> &'static str {
    ffi::version()
}

/// Re-export the SQLite library version number.
pub fn sqlite_version_number() -> i32 {
    ffi::version_number()
}
