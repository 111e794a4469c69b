//! SQLite connection implementation.
//!
//! This module provides safe wrappers around SQLite's C API and implements
//! the `RawConnection` contract from sqlshim-core.

// Allow casts in FFI code where we need to match C types exactly
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::borrow_as_ptr)] // FFI requires raw pointers
#![allow(clippy::if_not_else)] // Clearer for error handling

use crate::ffi;
use crate::sync::SyncSource;
use crate::types;
use sqlshim_core::error::{
    ConnectionError, ConnectionErrorKind, QueryError, QueryErrorKind, SyncError, SyncErrorKind,
};
use sqlshim_core::{ColumnInfo, Error, QueryInput, QueryResponse, RawConnection, Row, Value};
use std::ffi::{CStr, CString, c_char, c_int};
use std::ptr;
use std::sync::{Arc, Mutex};

/// Configuration for opening SQLite connections.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the database file, or ":memory:" for in-memory database.
    pub path: String,
    /// Open flags (read-only, read-write, create, etc.)
    pub flags: OpenFlags,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Primary to pull from when [`RawConnection::sync`] is called.
    pub sync_url: Option<String>,
}

/// Flags controlling how the database is opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFlags {
    /// Open for reading only.
    pub read_only: bool,
    /// Open for reading and writing.
    pub read_write: bool,
    /// Create the database if it doesn't exist.
    pub create: bool,
}

impl OpenFlags {
    /// Create flags for read-only access.
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            ..Default::default()
        }
    }

    /// Create flags for read-write access with creation if needed.
    pub fn create_read_write() -> Self {
        Self {
            read_write: true,
            create: true,
            ..Default::default()
        }
    }

    fn to_sqlite_flags(self) -> c_int {
        let mut flags = ffi::SQLITE_OPEN_FULLMUTEX;

        if self.read_only {
            flags |= ffi::SQLITE_OPEN_READONLY;
        }
        if self.read_write {
            flags |= ffi::SQLITE_OPEN_READWRITE;
        }
        if self.create {
            flags |= ffi::SQLITE_OPEN_CREATE;
        }

        // Default to read-write if no mode specified
        if flags & (ffi::SQLITE_OPEN_READONLY | ffi::SQLITE_OPEN_READWRITE) == 0 {
            flags |= ffi::SQLITE_OPEN_READWRITE | ffi::SQLITE_OPEN_CREATE;
        }

        flags
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            flags: OpenFlags::create_read_write(),
            busy_timeout_ms: 5000,
            sync_url: None,
        }
    }
}

impl SqliteConfig {
    /// Create a new config for a file-based database.
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Create a new config for an in-memory database.
    pub fn memory() -> Self {
        Self::default()
    }

    /// Set open flags.
    pub fn flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set busy timeout.
    pub fn busy_timeout(mut self, ms: u32) -> Self {
        self.busy_timeout_ms = ms;
        self
    }

    /// Set the primary to pull from on sync.
    pub fn sync_url(mut self, url: impl Into<String>) -> Self {
        self.sync_url = Some(url.into());
        self
    }
}

/// Inner state of the SQLite connection, protected by a mutex for thread safety.
#[derive(Debug)]
struct SqliteInner {
    db: *mut ffi::sqlite3,
}

// SAFETY: SQLite handles can be safely sent between threads when using
// SQLITE_OPEN_FULLMUTEX (serialized mode) or when properly synchronized.
// We use a Mutex to ensure synchronization.
unsafe impl Send for SqliteInner {}

/// A connection to a SQLite database.
///
/// This is a thread-safe wrapper around a SQLite database handle.
#[derive(Debug)]
pub struct SqliteConnection {
    inner: Mutex<SqliteInner>,
    path: String,
    sync_url: Option<String>,
}

// SqliteConnection is Send + Sync because all access goes through the Mutex
unsafe impl Send for SqliteConnection {}
unsafe impl Sync for SqliteConnection {}

impl SqliteConnection {
    /// Open a new SQLite connection with the given configuration.
    pub fn open(config: &SqliteConfig) -> Result<Self, Error> {
        let c_path = CString::new(config.path.as_str()).map_err(|_| {
            Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: "Invalid path: contains null byte".to_string(),
                source: None,
            })
        })?;

        let mut db: *mut ffi::sqlite3 = ptr::null_mut();
        let flags = config.flags.to_sqlite_flags();

        // SAFETY: We pass valid pointers and check the return value
        let rc = unsafe { ffi::sqlite3_open_v2(c_path.as_ptr(), &mut db, flags, ptr::null()) };

        if rc != ffi::SQLITE_OK {
            let msg = if !db.is_null() {
                // SAFETY: db is valid until closed here
                unsafe {
                    let (_, msg) = ffi::last_error(db);
                    ffi::sqlite3_close_v2(db);
                    msg
                }
            } else {
                ffi::error_string(rc).to_string()
            };

            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!("Failed to open database {}: {}", config.path, msg),
                source: None,
            }));
        }

        if config.busy_timeout_ms > 0 {
            // SAFETY: db is valid
            unsafe {
                ffi::sqlite3_busy_timeout(db, config.busy_timeout_ms.min(i32::MAX as u32) as c_int);
            }
        }

        Ok(Self {
            inner: Mutex::new(SqliteInner { db }),
            path: config.path.clone(),
            sync_url: config.sync_url.clone(),
        })
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, Error> {
        Self::open(&SqliteConfig::memory())
    }

    /// Open a file-based database.
    pub fn open_file(path: impl Into<String>) -> Result<Self, Error> {
        Self::open(&SqliteConfig::file(path))
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Get the configured sync endpoint.
    pub fn sync_url(&self) -> Option<&str> {
        self.sync_url.as_deref()
    }

    /// Execute SQL directly without preparing (for DDL, etc.)
    pub fn execute_raw(&self, sql: &str) -> Result<(), Error> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;

        let mut errmsg: *mut c_char = ptr::null_mut();

        // SAFETY: All pointers are valid
        let rc = unsafe {
            ffi::sqlite3_exec(inner.db, c_sql.as_ptr(), None, ptr::null_mut(), &mut errmsg)
        };

        if rc != ffi::SQLITE_OK {
            let msg = if !errmsg.is_null() {
                // SAFETY: errmsg is valid and owned by us until freed
                let msg = unsafe { CStr::from_ptr(errmsg).to_string_lossy().into_owned() };
                unsafe { ffi::sqlite3_free(errmsg.cast()) };
                msg
            } else {
                ffi::error_string(rc).to_string()
            };

            return Err(Error::Query(QueryError {
                kind: error_code_to_kind(rc),
                sql: Some(sql.to_string()),
                message: msg,
                source: None,
            }));
        }

        Ok(())
    }

    /// Prepare and run one statement.
    ///
    /// Statements with result columns are read to completion; all others
    /// report the change count and last inserted rowid.
    pub fn run(&self, sql: &str, params: &[Value]) -> Result<QueryResponse, Error> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let stmt = prepare_stmt(inner.db, sql)?;

        for (i, param) in params.iter().enumerate() {
            // SAFETY: stmt is valid, index is 1-based
            let rc = unsafe { types::bind_value(stmt, (i + 1) as c_int, param) };
            if rc != ffi::SQLITE_OK {
                let err = bind_error(inner.db, sql, i + 1);
                // SAFETY: stmt is valid
                unsafe { ffi::sqlite3_finalize(stmt) };
                return Err(err);
            }
        }

        // SAFETY: stmt is valid
        let col_count = unsafe { ffi::sqlite3_column_count(stmt) };

        if col_count == 0 {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            let result = match rc {
                ffi::SQLITE_DONE | ffi::SQLITE_ROW => {
                    // SAFETY: db is valid
                    let (changes, last_insert_rowid) = unsafe {
                        (
                            ffi::sqlite3_changes(inner.db),
                            ffi::sqlite3_last_insert_rowid(inner.db),
                        )
                    };
                    Ok(QueryResponse::Run {
                        changes: u64::try_from(changes).unwrap_or(0),
                        last_insert_rowid,
                    })
                }
                _ => Err(step_error(inner.db, sql)),
            };
            // SAFETY: stmt is valid
            unsafe { ffi::sqlite3_finalize(stmt) };
            return result;
        }

        let mut col_names = Vec::with_capacity(col_count as usize);
        for i in 0..col_count {
            // SAFETY: stmt is valid, i < col_count
            let name =
                unsafe { types::column_name(stmt, i) }.unwrap_or_else(|| format!("col{}", i));
            col_names.push(name);
        }
        let columns = Arc::new(ColumnInfo::new(col_names));

        let mut rows = Vec::new();
        loop {
            // SAFETY: stmt is valid
            let rc = unsafe { ffi::sqlite3_step(stmt) };
            match rc {
                ffi::SQLITE_ROW => {
                    let mut values = Vec::with_capacity(col_count as usize);
                    for i in 0..col_count {
                        // SAFETY: stmt is valid, we just got SQLITE_ROW
                        values.push(unsafe { types::read_column(stmt, i) });
                    }
                    rows.push(Row::with_columns(Arc::clone(&columns), values));
                }
                ffi::SQLITE_DONE => break,
                _ => {
                    let err = step_error(inner.db, sql);
                    // SAFETY: stmt is valid
                    unsafe { ffi::sqlite3_finalize(stmt) };
                    return Err(err);
                }
            }
        }

        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };

        Ok(QueryResponse::Rows { columns, rows })
    }

    /// Replace this database's contents with a snapshot of `source`.
    ///
    /// Every page is copied; nothing written locally survives.
    pub fn restore_from(&self, source: &SqliteConnection) -> Result<(), Error> {
        let dest = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let src = source.inner.lock().unwrap_or_else(|e| e.into_inner());
        let main = c"main";

        // SAFETY: both handles are valid and distinct; names are static C strings
        let backup =
            unsafe { ffi::sqlite3_backup_init(dest.db, main.as_ptr(), src.db, main.as_ptr()) };
        if backup.is_null() {
            // SAFETY: dest.db is valid; backup_init records its error there
            let (_, msg) = unsafe { ffi::last_error(dest.db) };
            return Err(backup_error(&source.path, msg));
        }

        // SAFETY: backup is a live handle until finished below
        let step_rc = unsafe { ffi::sqlite3_backup_step(backup, -1) };
        let finish_rc = unsafe { ffi::sqlite3_backup_finish(backup) };

        if step_rc != ffi::SQLITE_DONE {
            return Err(backup_error(&source.path, ffi::error_string(step_rc).to_string()));
        }
        if finish_rc != ffi::SQLITE_OK {
            // SAFETY: dest.db is valid
            let (_, msg) = unsafe { ffi::last_error(dest.db) };
            return Err(backup_error(&source.path, msg));
        }
        Ok(())
    }
}

impl Drop for SqliteConnection {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.lock() {
            if !inner.db.is_null() {
                // SAFETY: db is valid
                unsafe {
                    ffi::sqlite3_close_v2(inner.db);
                }
            }
        }
    }
}

impl RawConnection for SqliteConnection {
    /// Replace the local database with a full snapshot of the primary.
    ///
    /// This is a one-way pull. Local writes made since the previous sync
    /// are overwritten and never forwarded to the primary, unlike an
    /// embedded replica that proxies writes upstream.
    fn sync(&self) -> Result<(), Error> {
        let Some(url) = self.sync_url.as_deref() else {
            return Err(Error::Sync(SyncError {
                kind: SyncErrorKind::SourceUnavailable,
                url: String::new(),
                message: format!("no sync URL configured for {}", self.path),
                source: None,
            }));
        };

        let source = SyncSource::parse(url)?;
        let primary = source.open()?;
        self.restore_from(&primary)?;
        tracing::debug!(path = %self.path, url = %url, "pulled snapshot from primary");
        Ok(())
    }

    fn pragma(&self, statement: &str) -> Result<Vec<Row>, Error> {
        let sql = format!("PRAGMA {}", statement);
        let rows = match self.run(&sql, &[])? {
            QueryResponse::Rows { rows, .. } => rows,
            QueryResponse::Run { .. } => Vec::new(),
        };
        Ok(rows)
    }

    fn execute(&self, input: &QueryInput) -> Result<QueryResponse, Error> {
        self.run(input.sql(), input.bindings())
    }
}

// Helper functions

fn prepare_stmt(db: *mut ffi::sqlite3, sql: &str) -> Result<*mut ffi::sqlite3_stmt, Error> {
    let c_sql = CString::new(sql).map_err(|_| null_byte_error(sql))?;
    let len = c_sql.as_bytes().len();

    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
    let mut tail: *const c_char = ptr::null();

    // SAFETY: All pointers are valid
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(db, c_sql.as_ptr(), len as c_int, &mut stmt, &mut tail)
    };

    if rc != ffi::SQLITE_OK {
        return Err(step_error(db, sql));
    }
    if stmt.is_null() {
        // Whitespace or comment only
        return Err(Error::Query(QueryError {
            kind: QueryErrorKind::Syntax,
            sql: Some(sql.to_string()),
            message: "The query is empty".to_string(),
            source: None,
        }));
    }

    // SAFETY: tail points into c_sql, at or before its terminator
    let consumed = if tail.is_null() {
        len
    } else {
        usize::try_from(unsafe { tail.offset_from(c_sql.as_ptr()) }).unwrap_or(len)
    };
    if has_trailing_statement(db, &c_sql.as_bytes()[consumed.min(len)..]) {
        // SAFETY: stmt is valid
        unsafe { ffi::sqlite3_finalize(stmt) };
        return Err(Error::Query(QueryError {
            kind: QueryErrorKind::Syntax,
            sql: Some(sql.to_string()),
            message: "The supplied SQL string contains more than one statement".to_string(),
            source: None,
        }));
    }

    Ok(stmt)
}

/// Whether `rest` holds anything besides whitespace and comments.
///
/// Anything SQLite cannot compile to an empty statement counts, including
/// text that fails to prepare.
fn has_trailing_statement(db: *mut ffi::sqlite3, rest: &[u8]) -> bool {
    if rest.iter().all(u8::is_ascii_whitespace) {
        return false;
    }

    let mut stmt: *mut ffi::sqlite3_stmt = ptr::null_mut();
    // SAFETY: rest is a live buffer of the given length
    let rc = unsafe {
        ffi::sqlite3_prepare_v2(
            db,
            rest.as_ptr().cast(),
            rest.len() as c_int,
            &mut stmt,
            ptr::null_mut(),
        )
    };
    if stmt.is_null() {
        return rc != ffi::SQLITE_OK;
    }
    // SAFETY: stmt is valid
    unsafe { ffi::sqlite3_finalize(stmt) };
    true
}

fn null_byte_error(sql: &str) -> Error {
    Error::Query(QueryError {
        kind: QueryErrorKind::Syntax,
        sql: Some(sql.to_string()),
        message: "SQL contains null byte".to_string(),
        source: None,
    })
}

fn bind_error(db: *mut ffi::sqlite3, sql: &str, param_index: usize) -> Error {
    // SAFETY: db is valid
    let (_, msg) = unsafe { ffi::last_error(db) };

    Error::Query(QueryError {
        kind: QueryErrorKind::Database,
        sql: Some(sql.to_string()),
        message: format!("Failed to bind parameter {}: {}", param_index, msg),
        source: None,
    })
}

fn step_error(db: *mut ffi::sqlite3, sql: &str) -> Error {
    // SAFETY: db is valid
    let (code, msg) = unsafe { ffi::last_error(db) };

    Error::Query(QueryError {
        kind: error_code_to_kind(code),
        sql: Some(sql.to_string()),
        message: msg,
        source: None,
    })
}

fn backup_error(source: &str, message: String) -> Error {
    Error::Sync(SyncError {
        kind: SyncErrorKind::Backup,
        url: source.to_string(),
        message,
        source: None,
    })
}

fn error_code_to_kind(code: c_int) -> QueryErrorKind {
    // Extended codes carry the primary code in the low byte
    match code & 0xff {
        ffi::SQLITE_ERROR => QueryErrorKind::Syntax,
        ffi::SQLITE_CONSTRAINT => QueryErrorKind::Constraint,
        ffi::SQLITE_BUSY | ffi::SQLITE_LOCKED => QueryErrorKind::Busy,
        ffi::SQLITE_PERM => QueryErrorKind::Permission,
        ffi::SQLITE_NOTFOUND => QueryErrorKind::NotFound,
        ffi::SQLITE_TOOBIG => QueryErrorKind::DataTruncation,
        ffi::SQLITE_INTERRUPT => QueryErrorKind::Cancelled,
        _ => QueryErrorKind::Database,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unwrap_rows(response: QueryResponse) -> Vec<Row> {
        match response {
            QueryResponse::Rows { rows, .. } => rows,
            QueryResponse::Run { .. } => panic!("expected rows, got a run result"),
        }
    }

    #[test]
    fn test_open_memory() {
        let conn = SqliteConnection::open_memory().unwrap();
        assert_eq!(conn.path(), ":memory:");
        assert_eq!(conn.sync_url(), None);
    }

    #[test]
    fn test_reader_and_writer_shapes() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, data BLOB)")
            .unwrap();

        let run = conn
            .run(
                "INSERT INTO t (name, data) VALUES (?, ?)",
                &[Value::Text("a".into()), Value::Bytes(vec![1, 2, 3])],
            )
            .unwrap();
        match run {
            QueryResponse::Run {
                changes,
                last_insert_rowid,
            } => {
                assert_eq!(changes, 1);
                assert_eq!(last_insert_rowid, 1);
            }
            QueryResponse::Rows { .. } => panic!("insert should report a run result"),
        }

        let rows = unwrap_rows(conn.run("SELECT id, name, data FROM t", &[]).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_by_name("id"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get_by_name("name"), Some(&Value::Text("a".into())));
        assert_eq!(rows[0].get_by_name("data"), Some(&Value::Bytes(vec![1, 2, 3])));
    }

    #[test]
    fn test_empty_select_keeps_columns() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.execute_raw("CREATE TABLE t (a INTEGER)").unwrap();
        match conn.run("SELECT a FROM t", &[]).unwrap() {
            QueryResponse::Rows { columns, rows } => {
                assert!(rows.is_empty());
                assert_eq!(columns.names(), &["a".to_string()]);
            }
            QueryResponse::Run { .. } => panic!("select should be a reader"),
        }
    }

    #[test]
    fn test_large_integers_and_nulls() {
        let conn = SqliteConnection::open_memory().unwrap();
        let rows = unwrap_rows(
            conn.run("SELECT ?, ?, ?", &[Value::BigInt(i64::MAX), Value::Null, Value::Bool(true)])
                .unwrap(),
        );
        assert_eq!(rows[0].get(0), Some(&Value::BigInt(i64::MAX)));
        assert_eq!(rows[0].get(1), Some(&Value::Null));
        assert_eq!(rows[0].get(2), Some(&Value::Int(1)));
    }

    #[test]
    fn test_syntax_error_carries_sql() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn.run("SELEC 1", &[]).unwrap_err();
        assert_eq!(err.sql(), Some("SELEC 1"));
        match err {
            Error::Query(q) => assert_eq!(q.kind, QueryErrorKind::Syntax),
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_query_rejected() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn.run("   ", &[]).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_multiple_statements_rejected() {
        let conn = SqliteConnection::open_memory().unwrap();
        let sql = "CREATE TABLE a (x); CREATE TABLE b (y)";
        let err = conn.run(sql, &[]).unwrap_err();
        assert_eq!(err.sql(), Some(sql));
        match err {
            Error::Query(q) => {
                assert_eq!(q.kind, QueryErrorKind::Syntax);
                assert_eq!(
                    q.message,
                    "The supplied SQL string contains more than one statement"
                );
            }
            other => panic!("expected query error, got {other:?}"),
        }

        // Nothing ran, not even the first statement
        let tables = unwrap_rows(conn.run("SELECT name FROM sqlite_master", &[]).unwrap());
        assert!(tables.is_empty());
    }

    #[test]
    fn test_trailing_statement_that_cannot_prepare_is_rejected() {
        let conn = SqliteConnection::open_memory().unwrap();
        let err = conn
            .run("CREATE TABLE a (x); INSERT INTO a VALUES (1)", &[])
            .unwrap_err();
        assert!(err.to_string().contains("more than one statement"));
    }

    #[test]
    fn test_trailing_semicolon_and_comments_allowed() {
        let conn = SqliteConnection::open_memory().unwrap();
        let rows = unwrap_rows(conn.run("SELECT 1;  ", &[]).unwrap());
        assert_eq!(rows[0].get(0), Some(&Value::Int(1)));
        let rows = unwrap_rows(conn.run("SELECT 2; -- trailing note\n/* more */", &[]).unwrap());
        assert_eq!(rows[0].get(0), Some(&Value::Int(2)));
    }

    #[test]
    fn test_pragma_foreign_keys() {
        let conn = SqliteConnection::open_memory().unwrap();
        conn.pragma("foreign_keys = ON").unwrap();
        let rows = conn.pragma("foreign_keys").unwrap();
        assert_eq!(rows[0].get(0), Some(&Value::Int(1)));
    }

    #[test]
    fn test_sync_without_url_fails() {
        let conn = SqliteConnection::open_memory().unwrap();
        match conn.sync() {
            Err(Error::Sync(e)) => assert_eq!(e.kind, SyncErrorKind::SourceUnavailable),
            other => panic!("expected sync error, got {other:?}"),
        }
    }

    #[test]
    fn test_restore_from_copies_contents() {
        let primary = SqliteConnection::open_memory().unwrap();
        primary
            .execute_raw("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('from primary');")
            .unwrap();

        let replica = SqliteConnection::open_memory().unwrap();
        replica.restore_from(&primary).unwrap();

        let rows = unwrap_rows(replica.run("SELECT v FROM t", &[]).unwrap());
        assert_eq!(rows[0].get(0), Some(&Value::Text("from primary".into())));
    }

    #[test]
    fn test_sync_discards_local_writes() {
        let dir = tempfile::tempdir().unwrap();
        let primary_path = dir.path().join("primary.db");
        let primary = SqliteConnection::open_file(primary_path.to_str().unwrap()).unwrap();
        primary
            .execute_raw("CREATE TABLE t (v TEXT); INSERT INTO t VALUES ('from primary');")
            .unwrap();

        let config = SqliteConfig::file(dir.path().join("replica.db").to_str().unwrap())
            .sync_url(format!("file:{}", primary_path.display()));
        let replica = SqliteConnection::open(&config).unwrap();
        replica.sync().unwrap();
        replica
            .execute_raw("INSERT INTO t VALUES ('local'); CREATE TABLE scratch (x);")
            .unwrap();

        replica.sync().unwrap();
        let rows = unwrap_rows(replica.run("SELECT v FROM t", &[]).unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Value::Text("from primary".into())));
        let scratch = unwrap_rows(
            replica
                .run("SELECT name FROM sqlite_master WHERE name = 'scratch'", &[])
                .unwrap(),
        );
        assert!(scratch.is_empty());

        let upstream = unwrap_rows(primary.run("SELECT v FROM t", &[]).unwrap());
        assert_eq!(upstream.len(), 1);
    }
}
