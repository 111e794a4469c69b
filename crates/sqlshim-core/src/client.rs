//! The host framework's dialect-client contract.
//!
//! A host builds one client per pool, asks it for raw connections, and sends
//! every statement through [`DialectClient::query`]. It also inspects the
//! client's reported identity, dialect and driver name to pick
//! dialect-specific code paths, which is why [`Identify`] is a supertrait.

use crate::driver::{ConnectionSettings, Driver};
use crate::error::Error;
use crate::identity::Identify;
use crate::row::{ColumnInfo, Row};
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::future::Future;
use std::sync::Arc;

/// A statement as the host hands it to the client.
///
/// Hosts send either bare SQL text or a compiled statement with positional
/// bindings.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    /// Bare SQL text
    Sql(String),
    /// SQL text plus positional bindings
    Statement { sql: String, bindings: Vec<Value> },
}

impl QueryInput {
    /// A compiled statement.
    pub fn statement(sql: impl Into<String>, bindings: Vec<Value>) -> Self {
        QueryInput::Statement {
            sql: sql.into(),
            bindings,
        }
    }

    /// The SQL text.
    pub fn sql(&self) -> &str {
        match self {
            QueryInput::Sql(sql) | QueryInput::Statement { sql, .. } => sql,
        }
    }

    /// Positional bindings; empty for bare SQL.
    pub fn bindings(&self) -> &[Value] {
        match self {
            QueryInput::Sql(_) => &[],
            QueryInput::Statement { bindings, .. } => bindings,
        }
    }

    /// Replace the SQL text, keeping any bindings.
    #[must_use]
    pub fn with_sql(self, new_sql: String) -> Self {
        match self {
            QueryInput::Sql(_) => QueryInput::Sql(new_sql),
            QueryInput::Statement { bindings, .. } => QueryInput::Statement {
                sql: new_sql,
                bindings,
            },
        }
    }
}

impl From<&str> for QueryInput {
    fn from(sql: &str) -> Self {
        QueryInput::Sql(sql.to_string())
    }
}

impl From<String> for QueryInput {
    fn from(sql: String) -> Self {
        QueryInput::Sql(sql)
    }
}

/// What the host's SQLite client returns for one statement.
///
/// Statements that produce columns return their rows; everything else
/// reports how many rows it touched and the last inserted rowid.
#[derive(Debug, Clone)]
pub enum QueryResponse {
    /// Result of a reader statement
    Rows {
        columns: Arc<ColumnInfo>,
        rows: Vec<Row>,
    },
    /// Result of a writer statement
    Run { changes: u64, last_insert_rowid: i64 },
}

impl QueryResponse {
    /// Rows returned, empty for writer statements.
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResponse::Rows { rows, .. } => rows,
            QueryResponse::Run { .. } => &[],
        }
    }

    /// Rows changed, zero for reader statements.
    pub fn changes(&self) -> u64 {
        match self {
            QueryResponse::Rows { .. } => 0,
            QueryResponse::Run { changes, .. } => *changes,
        }
    }

    /// Render in the host's wire shape: an array of row objects, or
    /// `{"changes": n, "lastInsertRowid": id}`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            QueryResponse::Rows { rows, .. } => serde_json::Value::Array(
                rows.iter()
                    .map(|row| serde_json::Value::Object(row.to_json_object()))
                    .collect(),
            ),
            QueryResponse::Run {
                changes,
                last_insert_rowid,
            } => serde_json::json!({
                "changes": changes,
                "lastInsertRowid": last_insert_rowid,
            }),
        }
    }
}

/// A dialect client as the host framework drives it.
///
/// All operations are async and take a `Cx` context. No operation retries
/// or translates driver errors.
pub trait DialectClient: Identify + Send + Sync {
    /// The engine connections come from.
    type Driver: Driver;

    /// Dialect name the host keys SQL generation on.
    fn dialect(&self) -> &'static str;

    /// Driver name the host keys feature checks on.
    fn driver_name(&self) -> &'static str;

    /// Settings connections are opened with.
    fn connection_settings(&self) -> &ConnectionSettings;

    /// Open a new raw connection for the host's pool.
    fn acquire_raw_connection(
        &self,
        cx: &Cx,
    ) -> impl Future<Output = Outcome<<Self::Driver as Driver>::Connection, Error>> + Send;

    /// Execute one statement on `conn`.
    fn query(
        &self,
        cx: &Cx,
        conn: &<Self::Driver as Driver>::Connection,
        input: QueryInput,
    ) -> impl Future<Output = Outcome<QueryResponse, Error>> + Send;

    /// The driver reference used by the host's own driver-loading path.
    fn driver(&self) -> &Self::Driver;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_sql_keeps_bindings() {
        let input = QueryInput::statement("select ?", vec![Value::BigInt(1)]);
        let replaced = input.with_sql("SELECT ?".to_string());
        assert_eq!(replaced.sql(), "SELECT ?");
        assert_eq!(replaced.bindings(), &[Value::BigInt(1)]);

        let bare = QueryInput::from("select 1").with_sql("SELECT 1".to_string());
        assert_eq!(bare, QueryInput::Sql("SELECT 1".to_string()));
        assert!(bare.bindings().is_empty());
    }

    #[test]
    fn run_response_shape() {
        let run = QueryResponse::Run {
            changes: 2,
            last_insert_rowid: 9,
        };
        assert_eq!(run.changes(), 2);
        assert!(run.rows().is_empty());
        assert_eq!(
            run.to_json(),
            serde_json::json!({"changes": 2, "lastInsertRowid": 9})
        );
    }

    #[test]
    fn rows_response_shape() {
        let columns = Arc::new(ColumnInfo::new(vec!["id".into(), "name".into()]));
        let rows = vec![Row::with_columns(
            Arc::clone(&columns),
            vec![Value::BigInt(1), Value::Text("a".into())],
        )];
        let response = QueryResponse::Rows { columns, rows };
        assert_eq!(response.changes(), 0);
        assert_eq!(
            response.to_json(),
            serde_json::json!([{"id": 1, "name": "a"}])
        );
    }
}
