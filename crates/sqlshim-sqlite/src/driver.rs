//! The SQLite replacement driver.

use crate::connection::{OpenFlags, SqliteConfig, SqliteConnection};
use sqlshim_core::error::ConfigError;
use sqlshim_core::{ConnectionSettings, Driver, Error};

/// Busy timeout applied when the `timeout` option is absent.
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5000;

/// Opens [`SqliteConnection`]s for the adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create the driver.
    pub const fn new() -> Self {
        Self
    }

    /// Translate connection settings into an open configuration.
    pub fn config_for(filename: &str, settings: &ConnectionSettings) -> Result<SqliteConfig, Error> {
        let busy_timeout_ms = match settings.option("timeout") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                ConfigError::invalid("timeout", format!("expected milliseconds, got {raw:?}"))
            })?,
            None => DEFAULT_BUSY_TIMEOUT_MS,
        };

        let mut config = SqliteConfig::file(filename)
            .flags(OpenFlags::create_read_write())
            .busy_timeout(busy_timeout_ms);
        if let Some(sync) = settings.sync() {
            config = config.sync_url(sync.url());
        }
        Ok(config)
    }
}

impl Driver for SqliteDriver {
    type Connection = SqliteConnection;

    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn open(&self, filename: &str, settings: &ConnectionSettings) -> Result<SqliteConnection, Error> {
        let config = Self::config_for(filename, settings)?;
        tracing::trace!(
            filename = %config.path,
            busy_timeout_ms = config.busy_timeout_ms,
            "opening sqlite database"
        );
        SqliteConnection::open(&config)
    }
}
