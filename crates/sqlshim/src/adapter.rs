//! The substituted dialect client.
//!
//! [`DriverAdapter`] implements the host's SQLite dialect-client contract on
//! top of any [`Driver`]. It reports itself as the host's own SQLite client,
//! patches known-bad statements before they reach the engine, and makes
//! sure every connection it hands out has passed through sync (when
//! configured) and has foreign keys enforced.

use crate::rewrite::QueryRewriter;
use sqlshim_core::{
    ConnectionSettings, Cx, DialectClient, Driver, Error, Identify, IdentitySlot, Outcome,
    QueryInput, QueryResponse, RawConnection, SQLITE_CLIENT_NAME, SQLITE_DIALECT,
};
use sqlshim_sqlite::SqliteDriver;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

/// Implementation name reported before any imprint.
pub const ADAPTER_NAME: &str = "DriverAdapter";

/// Pragma applied to every acquired connection.
pub const FOREIGN_KEYS_PRAGMA: &str = "foreign_keys = ON";

/// Filename SQLite treats as a private in-memory database.
const MEMORY_FILENAME: &str = ":memory:";

/// What the host passes when it builds a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub connection: ConnectionSettings,
    /// Insert NULL for columns the host leaves out. Always on once the
    /// adapter is constructed.
    pub use_null_as_default: bool,
    /// Version of the running host, checked against the rewrite table.
    pub host_version: Option<String>,
}

impl ClientConfig {
    /// Client configuration for `connection`.
    pub fn new(connection: ConnectionSettings) -> Self {
        Self {
            connection,
            use_null_as_default: true,
            host_version: None,
        }
    }

    /// Record the running host's version.
    pub fn with_host_version(mut self, version: impl Into<String>) -> Self {
        self.host_version = Some(version.into());
        self
    }
}

/// A host dialect client backed by a replacement driver.
pub struct DriverAdapter<D: Driver> {
    driver: D,
    config: ClientConfig,
    rewriter: Arc<QueryRewriter>,
    rewrites_verified: Option<bool>,
    identity: IdentitySlot,
}

impl<D: Driver> DriverAdapter<D> {
    /// Build an adapter with the built-in rewrite table.
    pub fn new(driver: D, config: ClientConfig) -> Result<Self, Error> {
        let rewriter = QueryRewriter::builtin()?;
        Self::with_rewriter(driver, config, Arc::new(rewriter))
    }

    /// Build an adapter with a caller-supplied rewrite table.
    ///
    /// Creates the database file's parent directory before returning. When
    /// the config names a host version, the rewrite table is checked
    /// against it and a mismatch is logged; rewriting still applies.
    pub fn with_rewriter(
        driver: D,
        mut config: ClientConfig,
        rewriter: Arc<QueryRewriter>,
    ) -> Result<Self, Error> {
        config.use_null_as_default = true;
        ensure_parent_dir(config.connection.filename())?;
        let rewrites_verified = config
            .host_version
            .as_deref()
            .map(|version| rewriter.check_host_version(version));

        Ok(Self {
            driver,
            config,
            rewriter,
            rewrites_verified,
            identity: IdentitySlot::imprinted(ADAPTER_NAME, SQLITE_CLIENT_NAME),
        })
    }

    /// Effective client configuration.
    pub fn client_config(&self) -> &ClientConfig {
        &self.config
    }

    /// The rewrite table in use.
    pub fn rewriter(&self) -> &QueryRewriter {
        &self.rewriter
    }

    /// Whether the rewrite table was verified against the host version,
    /// or `None` when no host version was given.
    pub fn rewrites_verified(&self) -> Option<bool> {
        self.rewrites_verified
    }

    #[tracing::instrument(level = "debug", skip(self), fields(driver = self.driver.name()))]
    fn open_connection(&self) -> Result<D::Connection, Error> {
        let settings = &self.config.connection;
        let conn = self.driver.open(settings.filename(), settings)?;

        if let Some(sync) = settings.sync() {
            tracing::debug!(url = %sync.url(), "syncing from primary");
            conn.sync()?;
        }

        conn.pragma(FOREIGN_KEYS_PRAGMA)?;
        tracing::debug!(pragma = FOREIGN_KEYS_PRAGMA, "pragma applied");

        tracing::info!(
            filename = %settings.filename(),
            sync = settings.sync_enabled(),
            "acquired raw connection"
        );
        Ok(conn)
    }

    #[tracing::instrument(level = "trace", skip(self, conn, input))]
    fn execute(&self, conn: &D::Connection, input: QueryInput) -> Result<QueryResponse, Error> {
        let input = self.rewriter.rewrite(input);
        conn.execute(&input)
    }
}

impl<D: Driver> Identify for DriverAdapter<D> {
    fn identity_slot(&self) -> &IdentitySlot {
        &self.identity
    }
}

impl<D: Driver> DialectClient for DriverAdapter<D> {
    type Driver = D;

    fn dialect(&self) -> &'static str {
        SQLITE_DIALECT
    }

    fn driver_name(&self) -> &'static str {
        SQLITE_DIALECT
    }

    fn connection_settings(&self) -> &ConnectionSettings {
        &self.config.connection
    }

    fn acquire_raw_connection(
        &self,
        _cx: &Cx,
    ) -> impl Future<Output = Outcome<D::Connection, Error>> + Send {
        let result = self.open_connection();
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn query(
        &self,
        _cx: &Cx,
        conn: &D::Connection,
        input: QueryInput,
    ) -> impl Future<Output = Outcome<QueryResponse, Error>> + Send {
        let result = self.execute(conn, input);
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D: Driver + std::fmt::Debug> std::fmt::Debug for DriverAdapter<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverAdapter")
            .field("driver", &self.driver)
            .field("config", &self.config)
            .field("reported_as", &self.identity.reported_name())
            .finish_non_exhaustive()
    }
}

/// The `DB_CLIENT` value: a factory for SQLite-backed adapters that the
/// host sees as its own SQLite client.
#[derive(Debug, Clone)]
pub struct ClientRef {
    identity: IdentitySlot,
}

impl ClientRef {
    pub fn new() -> Self {
        Self {
            identity: IdentitySlot::imprinted(ADAPTER_NAME, SQLITE_CLIENT_NAME),
        }
    }

    /// Construct a client the way the host does for each pool.
    pub fn connect(&self, config: ClientConfig) -> Result<DriverAdapter<SqliteDriver>, Error> {
        DriverAdapter::new(SqliteDriver::new(), config)
    }
}

impl Default for ClientRef {
    fn default() -> Self {
        Self::new()
    }
}

impl Identify for ClientRef {
    fn identity_slot(&self) -> &IdentitySlot {
        &self.identity
    }
}

fn ensure_parent_dir(filename: &str) -> std::io::Result<()> {
    if filename == MEMORY_FILENAME {
        return Ok(());
    }
    match Path::new(filename).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            std::fs::create_dir_all(dir)?;
            tracing::trace!(dir = %dir.display(), "database directory ready");
            Ok(())
        }
        _ => Ok(()),
    }
}
