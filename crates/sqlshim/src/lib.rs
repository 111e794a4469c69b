//! sqlshim - run a host framework's SQLite dialect client on a substituted
//! embedded engine.
//!
//! The host picks driver code paths by comparing names and expects a config
//! object shaped for network databases. sqlshim provides:
//!
//! - [`config`] - overlays operator settings into the host configuration,
//!   pointing `DB_CLIENT` at the adapter and validating required keys
//! - [`adapter`] - the dialect client itself, reporting the host's SQLite
//!   client name while opening connections through a replacement driver
//! - [`rewrite`] - exact-match patches for statements the engine rejects
//! - [`env`] - process-environment loading with `.env` support
//!
//! # Quick Start
//!
//! ```ignore
//! use sqlshim::prelude::*;
//!
//! let config = sqlshim::env::overlay_or_exit();
//! let client = config.client().expect("DB_CLIENT is always set");
//! let adapter = client.connect(config.client_config()?)?;
//!
//! let cx = Cx::for_testing();
//! let conn = adapter.acquire_raw_connection(&cx).await;
//! ```

pub mod adapter;
pub mod config;
pub mod env;
pub mod rewrite;

pub use adapter::{ClientConfig, ClientRef, DriverAdapter, FOREIGN_KEYS_PRAGMA};
pub use config::{
    ConfigValue, EnvMap, FORCED_OVERRIDES, Hook, HostConfig, HostInput, OverlayDefaults, overlay,
    overlay_with, with_overlay,
};
pub use rewrite::{QueryRewriter, RewriteRule, RewriteTable};

pub use sqlshim_core::{
    ConnectionSettings, Cx, DialectClient, Driver, Error, Identify, Outcome, QueryInput,
    QueryResponse, RawConnection, Value, host_recognizes_sqlite, spoof,
};
pub use sqlshim_sqlite::{SqliteConnection, SqliteDriver};

/// Commonly used items.
pub mod prelude {
    pub use crate::adapter::{ClientConfig, ClientRef, DriverAdapter};
    pub use crate::config::{EnvMap, HostConfig, overlay};
    pub use sqlshim_core::{
        Cx, DialectClient, Driver, Error, Identify, Outcome, QueryInput, QueryResponse,
        RawConnection, Value,
    };
}
