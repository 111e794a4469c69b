use std::sync::{Arc, Mutex};

use asupersync::runtime::RuntimeBuilder;
use asupersync::{Cx, Outcome};

use sqlshim::prelude::*;
use sqlshim::{ConnectionSettings, FOREIGN_KEYS_PRAGMA};
use sqlshim_core::Row;
use sqlshim_core::error::{SyncError, SyncErrorKind};

fn unwrap_outcome<T>(outcome: Outcome<T, Error>) -> T {
    match outcome {
        Outcome::Ok(v) => v,
        Outcome::Err(e) => panic!("unexpected error: {e}"),
        Outcome::Cancelled(r) => panic!("cancelled: {r:?}"),
        Outcome::Panicked(p) => panic!("panicked: {p:?}"),
    }
}

#[derive(Debug, Clone, Default)]
struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct RecordingDriver {
    log: CallLog,
    fail_sync: bool,
}

struct RecordingConnection {
    log: CallLog,
    fail_sync: bool,
    sync_url: Option<String>,
}

impl Driver for RecordingDriver {
    type Connection = RecordingConnection;

    fn name(&self) -> &'static str {
        "recording"
    }

    fn open(&self, filename: &str, settings: &ConnectionSettings) -> Result<RecordingConnection, Error> {
        self.log.push(format!("open {filename}"));
        Ok(RecordingConnection {
            log: self.log.clone(),
            fail_sync: self.fail_sync,
            sync_url: settings.sync().map(|s| s.url().to_string()),
        })
    }
}

impl RawConnection for RecordingConnection {
    fn sync(&self) -> Result<(), Error> {
        self.log.push("sync");
        if self.fail_sync {
            return Err(Error::Sync(SyncError {
                kind: SyncErrorKind::SourceUnavailable,
                url: self.sync_url.clone().unwrap_or_default(),
                message: "primary unreachable".to_string(),
                source: None,
            }));
        }
        Ok(())
    }

    fn pragma(&self, statement: &str) -> Result<Vec<Row>, Error> {
        self.log.push(format!("pragma {statement}"));
        Ok(Vec::new())
    }

    fn execute(&self, input: &QueryInput) -> Result<QueryResponse, Error> {
        self.log.push(format!("execute {}", input.sql()));
        Ok(QueryResponse::Run {
            changes: 0,
            last_insert_rowid: 0,
        })
    }
}

fn adapter(
    dir: &tempfile::TempDir,
    sync: bool,
    fail_sync: bool,
) -> (DriverAdapter<RecordingDriver>, CallLog) {
    let filename = dir.path().join("data/app.db");
    let mut settings = ConnectionSettings::new(filename.to_str().unwrap()).unwrap();
    if sync {
        settings = settings.with_sync("file:/srv/primary.db", 30).unwrap();
    }
    let log = CallLog::default();
    let driver = RecordingDriver {
        log: log.clone(),
        fail_sync,
    };
    let adapter = DriverAdapter::new(driver, ClientConfig::new(settings)).unwrap();
    (adapter, log)
}

#[test]
fn sync_runs_before_pragma_on_every_acquisition() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let dir = tempfile::tempdir().unwrap();
    let (adapter, log) = adapter(&dir, true, false);
    let filename = adapter.connection_settings().filename().to_string();

    rt.block_on(async {
        unwrap_outcome(adapter.acquire_raw_connection(&cx).await);
        unwrap_outcome(adapter.acquire_raw_connection(&cx).await);
    });

    let pragma = format!("pragma {FOREIGN_KEYS_PRAGMA}");
    let open = format!("open {filename}");
    assert_eq!(
        log.calls(),
        vec![
            open.clone(),
            "sync".to_string(),
            pragma.clone(),
            open,
            "sync".to_string(),
            pragma,
        ]
    );
}

#[test]
fn sync_skipped_when_disabled() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let dir = tempfile::tempdir().unwrap();
    let (adapter, log) = adapter(&dir, false, false);

    rt.block_on(async {
        unwrap_outcome(adapter.acquire_raw_connection(&cx).await);
    });

    let calls = log.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].starts_with("open "));
    assert_eq!(calls[1], format!("pragma {FOREIGN_KEYS_PRAGMA}"));
}

#[test]
fn sync_failure_propagates_without_pragma() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let dir = tempfile::tempdir().unwrap();
    let (adapter, log) = adapter(&dir, true, true);

    rt.block_on(async {
        match adapter.acquire_raw_connection(&cx).await {
            Outcome::Err(Error::Sync(e)) => {
                assert_eq!(e.kind, SyncErrorKind::SourceUnavailable);
                assert_eq!(e.url, "file:/srv/primary.db");
                assert_eq!(e.message, "primary unreachable");
            }
            Outcome::Err(other) => panic!("expected sync error, got {other}"),
            _ => panic!("expected sync error"),
        }
    });

    let calls = log.calls();
    assert_eq!(calls.last().map(String::as_str), Some("sync"));
    assert!(!calls.iter().any(|c| c.starts_with("pragma")));
}

#[test]
fn query_is_rewritten_before_execution() {
    let rt = RuntimeBuilder::current_thread()
        .build()
        .expect("create asupersync runtime");
    let cx = Cx::for_testing();
    let dir = tempfile::tempdir().unwrap();
    let (adapter, log) = adapter(&dir, false, false);

    rt.block_on(async {
        let conn = unwrap_outcome(adapter.acquire_raw_connection(&cx).await);
        unwrap_outcome(
            adapter
                .query(
                    &cx,
                    &conn,
                    QueryInput::from(
                        "select `name` from `sqlite_master` where sql LIKE \"%AUTOINCREMENT%\"",
                    ),
                )
                .await,
        );
        unwrap_outcome(adapter.query(&cx, &conn, QueryInput::from("SELECT 1")).await);
    });

    let calls = log.calls();
    assert_eq!(
        calls[2],
        "execute SELECT `name` from `sqlite_master` WHERE sql LIKE '%AUTOINCREMENT%'"
    );
    assert_eq!(calls[3], "execute SELECT 1");
}

#[test]
fn construction_creates_parent_directory_idempotently() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    assert!(!data_dir.exists());

    let (first, _) = adapter(&dir, false, false);
    assert!(data_dir.is_dir());
    std::fs::write(data_dir.join("keep.txt"), "x").unwrap();

    let (_second, _) = adapter(&dir, false, false);
    assert!(data_dir.join("keep.txt").exists());
    assert_eq!(first.driver().name(), "recording");
}
