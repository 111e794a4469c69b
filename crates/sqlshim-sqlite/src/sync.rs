//! Sync endpoints.
//!
//! A replica pulls a full snapshot from its primary using SQLite's online
//! backup API. Only primaries reachable as local files are supported; network
//! endpoints are recognised so they can be rejected with a clear error.
//!
//! Sync is one-way. Each pull overwrites the replica, so writes made to the
//! replica between pulls are lost; they are not forwarded to the primary.

use crate::connection::{OpenFlags, SqliteConfig, SqliteConnection};
use sqlshim_core::Error;
use sqlshim_core::error::{SyncError, SyncErrorKind};
use std::path::{Path, PathBuf};

/// Schemes that name a remote server rather than a file.
const NETWORK_SCHEMES: &[&str] = &["libsql", "http", "https", "ws", "wss"];

/// Where a replica pulls from.
///
/// Pulling from a source discards any local changes on the replica.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncSource {
    /// A primary database file on a local or mounted filesystem.
    File(PathBuf),
}

impl SyncSource {
    /// Parse a sync URL.
    ///
    /// Accepts `file:<path>`, `file://<path>` and bare paths.
    pub fn parse(url: &str) -> Result<Self, Error> {
        if let Some((scheme, _)) = url.split_once("://") {
            if NETWORK_SCHEMES.contains(&scheme.to_ascii_lowercase().as_str()) {
                return Err(sync_error(
                    SyncErrorKind::UnsupportedScheme,
                    url,
                    format!("network replication over {scheme}:// is not supported"),
                ));
            }
        }

        let path = match url.strip_prefix("file:") {
            Some(rest) => rest.strip_prefix("//").unwrap_or(rest),
            None if url.contains("://") => {
                return Err(sync_error(
                    SyncErrorKind::UnsupportedScheme,
                    url,
                    "unrecognised sync URL scheme".to_string(),
                ));
            }
            None => url,
        };

        if path.is_empty() {
            return Err(sync_error(
                SyncErrorKind::SourceUnavailable,
                url,
                "sync URL names no database".to_string(),
            ));
        }

        Ok(SyncSource::File(PathBuf::from(path)))
    }

    /// Path of the primary.
    pub fn path(&self) -> &Path {
        match self {
            SyncSource::File(path) => path,
        }
    }

    /// Open the primary read-only.
    ///
    /// A missing primary is an error; opening must never create one.
    pub fn open(&self) -> Result<SqliteConnection, Error> {
        let path = self.path();
        let display = path.display().to_string();
        if !path.is_file() {
            return Err(sync_error(
                SyncErrorKind::SourceUnavailable,
                &display,
                "primary database does not exist".to_string(),
            ));
        }

        let config = SqliteConfig::file(display.clone()).flags(OpenFlags::read_only());
        SqliteConnection::open(&config).map_err(|e| {
            sync_error(SyncErrorKind::SourceUnavailable, &display, e.to_string())
        })
    }
}

fn sync_error(kind: SyncErrorKind, url: &str, message: String) -> Error {
    Error::Sync(SyncError {
        kind,
        url: url.to_string(),
        message,
        source: None,
    })
}
