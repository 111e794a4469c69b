//! Replacement-driver contract.
//!
//! The embedded engine underneath the adapter is reached only through these
//! traits: open a database file, optionally pull from a remote primary,
//! apply pragmas, execute statements. Keeping the surface this small is what
//! lets a recording fake stand in for the real engine in tests.

use crate::client::{QueryInput, QueryResponse};
use crate::error::{ConfigError, Result};
use crate::row::Row;
use std::collections::BTreeMap;
use std::time::Duration;

/// Remote replication parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    url: String,
    period: Duration,
}

impl SyncSettings {
    /// Remote endpoint to pull from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Interval between background syncs.
    pub fn period(&self) -> Duration {
        self.period
    }
}

/// Settings a driver is opened with.
///
/// A settings value always has a non-empty filename, and when sync is
/// enabled it always has a non-empty URL and a positive period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    filename: String,
    sync: Option<SyncSettings>,
    /// Dialect options passed through untouched, keyed in camelCase.
    options: BTreeMap<String, String>,
}

impl ConnectionSettings {
    /// Settings for a local database file.
    pub fn new(filename: impl Into<String>) -> std::result::Result<Self, ConfigError> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(ConfigError::invalid("filename", "filename must not be empty"));
        }
        Ok(Self {
            filename,
            sync: None,
            options: BTreeMap::new(),
        })
    }

    /// Enable sync against `url` every `period_seconds`.
    pub fn with_sync(
        mut self,
        url: impl Into<String>,
        period_seconds: u64,
    ) -> std::result::Result<Self, ConfigError> {
        let url = url.into();
        if url.is_empty() {
            return Err(ConfigError::invalid("syncUrl", "sync URL must not be empty"));
        }
        if period_seconds == 0 {
            return Err(ConfigError::invalid(
                "syncPeriod",
                "sync period must be a positive number of seconds",
            ));
        }
        self.sync = Some(SyncSettings {
            url,
            period: Duration::from_secs(period_seconds),
        });
        Ok(self)
    }

    /// Add a pass-through dialect option.
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Database file path.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Whether the driver should pull from a remote primary.
    pub fn sync_enabled(&self) -> bool {
        self.sync.is_some()
    }

    /// Sync parameters, when sync is enabled.
    pub fn sync(&self) -> Option<&SyncSettings> {
        self.sync.as_ref()
    }

    /// Look up a pass-through option.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// All pass-through options.
    pub fn options(&self) -> &BTreeMap<String, String> {
        &self.options
    }
}

/// An embedded SQL engine that can be substituted under a host client.
pub trait Driver: Send + Sync {
    /// Connection handle produced by [`Driver::open`].
    type Connection: RawConnection;

    /// Human-readable engine name, for logs.
    fn name(&self) -> &'static str;

    /// Open `filename` with the given settings.
    ///
    /// The connection keeps whatever it needs from `settings` (notably the
    /// sync endpoint) for later calls.
    fn open(&self, filename: &str, settings: &ConnectionSettings) -> Result<Self::Connection>;
}

/// A raw connection owned by exactly one adapter-managed pool slot.
pub trait RawConnection: Send + Sync {
    /// Pull the latest state from the configured remote primary.
    ///
    /// Implementations may replace the whole local database, so writes made
    /// since the previous sync are not guaranteed to survive.
    fn sync(&self) -> Result<()>;

    /// Run `PRAGMA <statement>`.
    fn pragma(&self, statement: &str) -> Result<Vec<Row>>;

    /// Execute one statement.
    fn execute(&self, input: &QueryInput) -> Result<QueryResponse>;
}
