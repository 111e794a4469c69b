//! Exact-match SQL rewriting.
//!
//! Some host releases emit statements the substituted engine rejects. Each
//! known-bad statement is listed verbatim in a versioned table together with
//! its replacement. Matching is byte-for-byte: a statement that differs in
//! any way, including whitespace, passes through untouched.

use serde::{Deserialize, Serialize};
use sqlshim_core::QueryInput;
use sqlshim_core::error::ConfigError;
use std::borrow::Cow;
use std::collections::HashMap;

/// Table format understood by this build.
pub const REWRITE_TABLE_FORMAT: u32 = 1;

const BUILTIN_TABLE: &str = include_str!("../rewrites/sqlite.json");

/// One pinned workaround.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRule {
    /// Statement as the host emits it.
    pub from: String,
    /// Statement sent to the driver instead.
    pub to: String,
    /// Why the host's statement is rejected.
    #[serde(default)]
    pub reason: String,
}

/// The serialized rewrite table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteTable {
    pub format: u32,
    /// Host framework the rules were written against.
    pub host: String,
    /// Host version the rules were verified on.
    pub host_version: String,
    #[serde(default)]
    pub rewrites: Vec<RewriteRule>,
}

/// Looks statements up in a [`RewriteTable`].
#[derive(Debug, Clone)]
pub struct QueryRewriter {
    table: RewriteTable,
    index: HashMap<String, usize>,
}

impl QueryRewriter {
    /// The table shipped with this crate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_json(BUILTIN_TABLE)
    }

    /// Load a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let table: RewriteTable = serde_json::from_str(json)
            .map_err(|e| ConfigError::rewrite_table(format!("invalid rewrite table: {e}")))?;
        Self::from_table(table)
    }

    /// Index an already-parsed table.
    pub fn from_table(table: RewriteTable) -> Result<Self, ConfigError> {
        if table.format != REWRITE_TABLE_FORMAT {
            return Err(ConfigError::rewrite_table(format!(
                "unsupported rewrite table format {} (expected {})",
                table.format, REWRITE_TABLE_FORMAT
            )));
        }

        let mut index = HashMap::with_capacity(table.rewrites.len());
        for (i, rule) in table.rewrites.iter().enumerate() {
            if index.insert(rule.from.clone(), i).is_some() {
                return Err(ConfigError::rewrite_table(format!(
                    "duplicate rewrite for statement: {}",
                    rule.from
                )));
            }
        }

        Ok(Self { table, index })
    }

    /// The loaded table.
    pub fn table(&self) -> &RewriteTable {
        &self.table
    }

    /// Replacement SQL for `sql`, or `sql` itself.
    pub fn rewrite_sql<'a>(&'a self, sql: &'a str) -> Cow<'a, str> {
        match self.index.get(sql) {
            Some(&i) => {
                let to = &self.table.rewrites[i].to;
                tracing::debug!(from = %sql, to = %to, "rewriting statement");
                Cow::Borrowed(to.as_str())
            }
            None => Cow::Borrowed(sql),
        }
    }

    /// Apply the table to a host statement, keeping its bindings.
    pub fn rewrite(&self, input: QueryInput) -> QueryInput {
        match self.index.get(input.sql()) {
            Some(&i) => {
                let to = self.table.rewrites[i].to.clone();
                tracing::debug!(from = %input.sql(), to = %to, "rewriting statement");
                input.with_sql(to)
            }
            None => input,
        }
    }

    /// Whether the table was verified against `host_version`.
    ///
    /// `"10"` covers `"10"` and every `"10.x"` release.
    pub fn check_host_version(&self, host_version: &str) -> bool {
        let pinned = self.table.host_version.as_str();
        let matches = host_version == pinned
            || host_version
                .strip_prefix(pinned)
                .is_some_and(|rest| rest.starts_with('.'));
        if !matches {
            tracing::warn!(
                host = %self.table.host,
                pinned = %pinned,
                running = %host_version,
                "rewrite table was verified against a different host version"
            );
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlshim_core::Value;
    use sqlshim_core::error::ConfigErrorKind;

    const AUTOINCREMENT_FROM: &str =
        "select `name` from `sqlite_master` where sql LIKE \"%AUTOINCREMENT%\"";
    const AUTOINCREMENT_TO: &str =
        "SELECT `name` from `sqlite_master` WHERE sql LIKE '%AUTOINCREMENT%'";

    #[test]
    fn builtin_rewrites_autoincrement_lookup() {
        let rewriter = QueryRewriter::builtin().unwrap();
        assert_eq!(rewriter.rewrite_sql(AUTOINCREMENT_FROM), AUTOINCREMENT_TO);
        assert_eq!(
            rewriter.rewrite(QueryInput::from(AUTOINCREMENT_FROM)),
            QueryInput::Sql(AUTOINCREMENT_TO.to_string())
        );
    }

    #[test]
    fn near_misses_pass_through() {
        let rewriter = QueryRewriter::builtin().unwrap();
        let near = format!("{AUTOINCREMENT_FROM} ");
        assert_eq!(rewriter.rewrite_sql(&near), near.as_str());
        assert_eq!(rewriter.rewrite_sql("SELECT 1"), "SELECT 1");
        assert_eq!(
            rewriter.rewrite_sql(&AUTOINCREMENT_FROM.to_uppercase()),
            AUTOINCREMENT_FROM.to_uppercase()
        );
    }

    #[test]
    fn rewriting_is_idempotent() {
        let rewriter = QueryRewriter::builtin().unwrap();
        let once = rewriter.rewrite_sql(AUTOINCREMENT_FROM).into_owned();
        assert_eq!(rewriter.rewrite_sql(&once), once.as_str());
    }

    #[test]
    fn statement_bindings_survive() {
        let rewriter = QueryRewriter::builtin().unwrap();
        let input = QueryInput::statement(AUTOINCREMENT_FROM, vec![Value::Int(1)]);
        let out = rewriter.rewrite(input);
        assert_eq!(out.sql(), AUTOINCREMENT_TO);
        assert_eq!(out.bindings(), &[Value::Int(1)]);
    }

    #[test]
    fn duplicate_entries_rejected() {
        let json = r#"{
            "format": 1, "host": "h", "host_version": "1",
            "rewrites": [
                {"from": "a", "to": "b"},
                {"from": "a", "to": "c"}
            ]
        }"#;
        let err = QueryRewriter::from_json(json).unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::RewriteTable);
        assert!(err.message.contains("duplicate"));
    }

    #[test]
    fn malformed_and_future_tables_rejected() {
        let err = QueryRewriter::from_json("{").unwrap_err();
        assert_eq!(err.kind, ConfigErrorKind::RewriteTable);

        let json = r#"{"format": 2, "host": "h", "host_version": "1", "rewrites": []}"#;
        let err = QueryRewriter::from_json(json).unwrap_err();
        assert!(err.message.contains("format 2"));
    }

    #[test]
    fn host_version_pinning() {
        let rewriter = QueryRewriter::builtin().unwrap();
        assert_eq!(rewriter.table().host, "directus");
        assert!(rewriter.check_host_version("10"));
        assert!(rewriter.check_host_version("10.8.3"));
        assert!(!rewriter.check_host_version("100.0"));
        assert!(!rewriter.check_host_version("11.0.0"));
    }
}
