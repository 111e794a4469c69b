//! Error types for sqlshim operations.

use std::fmt;

/// The primary error type for all sqlshim operations.
#[derive(Debug)]
pub enum Error {
    /// Connection-related errors (open, close)
    Connection(ConnectionError),
    /// Query execution errors
    Query(QueryError),
    /// Remote sync errors
    Sync(SyncError),
    /// Configuration errors
    Config(ConfigError),
    /// I/O errors
    Io(std::io::Error),
}

#[derive(Debug)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to open the database
    Connect,
}

#[derive(Debug)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Permission denied
    Permission,
    /// Data too large for column
    DataTruncation,
    /// Database is busy or locked
    Busy,
    /// Interrupted
    Cancelled,
    /// Other database error
    Database,
}

#[derive(Debug)]
pub struct SyncError {
    pub kind: SyncErrorKind,
    pub url: String,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    /// The driver cannot replicate from this kind of endpoint
    UnsupportedScheme,
    /// The primary could not be opened
    SourceUnavailable,
    /// Copying pages from the primary failed
    Backup,
}

#[derive(Debug)]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    /// The configuration key involved, if any.
    pub key: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorKind {
    /// A required key is absent
    MissingKey,
    /// A key is present but its value is unusable
    InvalidValue,
    /// The query rewrite table could not be loaded
    RewriteTable,
}

impl ConfigError {
    /// A required key is absent.
    pub fn missing(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            kind: ConfigErrorKind::MissingKey,
            message: format!("\"{key}\" Environment Variable is missing."),
            key: Some(key),
        }
    }

    /// A key holds a value that cannot be used.
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::InvalidValue,
            key: Some(key.into()),
            message: message.into(),
        }
    }

    /// The rewrite table is malformed.
    pub fn rewrite_table(message: impl Into<String>) -> Self {
        Self {
            kind: ConfigErrorKind::RewriteTable,
            key: None,
            message: message.into(),
        }
    }

    /// The missing key, when this is a [`ConfigErrorKind::MissingKey`] error.
    pub fn missing_key(&self) -> Option<&str> {
        match self.kind {
            ConfigErrorKind::MissingKey => self.key.as_deref(),
            _ => None,
        }
    }
}

impl Error {
    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => write!(f, "Query error: {}", e.message),
            Error::Sync(e) => write!(f, "Sync error ({}): {}", e.url, e.message),
            Error::Config(e) => write!(f, "Configuration error: {}", e.message),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Connection(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Query(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Sync(e) => e
                .source
                .as_deref()
                .map(|err| err as &(dyn std::error::Error + 'static)),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<SyncError> for Error {
    fn from(err: SyncError) -> Self {
        Error::Sync(err)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::Config(err)
    }
}

/// Result type alias for sqlshim operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_message_names_the_key() {
        let err = ConfigError::missing("DB_FILENAME");
        assert_eq!(err.missing_key(), Some("DB_FILENAME"));
        assert_eq!(
            err.to_string(),
            "\"DB_FILENAME\" Environment Variable is missing."
        );

        let invalid = ConfigError::invalid("DB_SYNC_PERIOD", "not a number");
        assert_eq!(invalid.missing_key(), None);
        assert_eq!(invalid.key.as_deref(), Some("DB_SYNC_PERIOD"));
    }

    #[test]
    fn sql_and_connection_display() {
        let query = Error::Query(QueryError {
            kind: QueryErrorKind::Syntax,
            sql: Some("SELEC 1".to_string()),
            message: "near \"SELEC\": syntax error".to_string(),
            source: None,
        });
        assert_eq!(query.sql(), Some("SELEC 1"));

        let conn = Error::Connection(ConnectionError {
            kind: ConnectionErrorKind::Connect,
            message: "unable to open database file".to_string(),
            source: None,
        });
        assert_eq!(
            conn.to_string(),
            "Connection error: unable to open database file"
        );
    }

    #[test]
    fn sync_error_display_includes_url() {
        let err = Error::from(SyncError {
            kind: SyncErrorKind::UnsupportedScheme,
            url: "libsql://db.example".to_string(),
            message: "unsupported scheme".to_string(),
            source: None,
        });
        assert_eq!(
            err.to_string(),
            "Sync error (libsql://db.example): unsupported scheme"
        );
    }
}
