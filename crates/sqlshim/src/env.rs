//! Process-level entry points.
//!
//! These read the real environment and terminate the process on bad
//! configuration. Everything underneath them is pure and lives in
//! [`crate::config`].

use crate::config::{EnvMap, HostConfig, HostInput, overlay, with_overlay};
use sqlshim_core::error::ConfigError;

/// Snapshot the process environment, loading `.env` first when present.
///
/// Variables already set in the environment take precedence over `.env`.
pub fn process_env() -> EnvMap {
    dotenvy::dotenv().ok();
    std::env::vars().collect()
}

/// Overlay the process environment, exiting with status 1 on a missing key.
pub fn overlay_or_exit() -> HostConfig {
    exit_on_error(overlay(&process_env()))
}

/// Run an operator config function against the process environment and
/// overlay its output, exiting with status 1 on a missing key.
pub fn overlay_with_or_exit<F>(f: F) -> HostConfig
where
    F: Fn(&EnvMap) -> Option<HostInput>,
{
    exit_on_error(with_overlay(f)(&process_env()))
}

/// The operator-facing line for a configuration error.
pub fn diagnostic(err: &ConfigError) -> String {
    format!("ERROR: {}", err.message)
}

fn exit_on_error(result: Result<HostConfig, ConfigError>) -> HostConfig {
    match result {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(key = ?err.key, "{}", err.message);
            eprintln!("{}", diagnostic(&err));
            std::process::exit(1);
        }
    }
}
