//! Host configuration overlay.
//!
//! Turns operator settings into the configuration the host boots with:
//! defaults underneath, operator values on top, then a fixed set of forced
//! overrides that point the host at [`ClientRef`] and neutralise the
//! network-database keys it would otherwise act on.
//!
//! ```rust,ignore
//! let env: EnvMap = [("DB_FILENAME", "./data/app.db")]
//!     .into_iter()
//!     .map(|(k, v)| (k.to_string(), v.to_string()))
//!     .collect();
//! let config = overlay(&env)?;
//! assert_eq!(config.text("DB_SYNC_PERIOD"), Some("30"));
//! ```

use crate::adapter::{ClientConfig, ClientRef};
use sqlshim_core::error::ConfigError;
use sqlshim_core::{
    ConnectionSettings, Identify, IdentitySlot, NEUTRAL_TYPE_TAG, SQLITE_CLIENT_NAME, spoof,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Operator settings as flat strings, usually the process environment.
pub type EnvMap = BTreeMap<String, String>;

/// Operator settings that may also carry callables.
pub type HostInput = BTreeMap<String, ConfigValue>;

pub const DB_CLIENT: &str = "DB_CLIENT";
pub const DB_FILENAME: &str = "DB_FILENAME";
pub const DB_SYNC: &str = "DB_SYNC";
pub const DB_SYNC_URL: &str = "DB_SYNC_URL";
pub const DB_SYNC_PERIOD: &str = "DB_SYNC_PERIOD";
pub const PRESSURE_LIMITER_ENABLED: &str = "PRESSURE_LIMITER_ENABLED";

/// The only `DB_SYNC` value that disables sync.
const SYNC_DISABLED: &str = "false";

/// Keys whose operator values are always replaced.
///
/// The host refuses to start without the network keys, but the embedded
/// engine ignores them. The pressure limiter misbehaves under the
/// substituted driver for reasons not yet diagnosed, so it stays off.
pub const FORCED_OVERRIDES: &[(&str, &str)] = &[
    ("DB_HOST", ""),
    ("DB_PORT", ""),
    ("DB_DATABASE", ""),
    ("DB_USER", ""),
    ("DB_PASSWORD", ""),
    (PRESSURE_LIMITER_ENABLED, "false"),
];

/// Required when sync is on, checked in this order.
const SYNC_KEYS: [&str; 3] = [DB_SYNC, DB_SYNC_URL, DB_SYNC_PERIOD];

/// Values applied underneath the operator's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayDefaults {
    pub db_sync: String,
    pub db_sync_period: String,
}

impl Default for OverlayDefaults {
    fn default() -> Self {
        Self {
            db_sync: SYNC_DISABLED.to_string(),
            db_sync_period: "30".to_string(),
        }
    }
}

impl OverlayDefaults {
    fn entries(&self) -> [(&'static str, &str); 2] {
        [(DB_SYNC, &self.db_sync), (DB_SYNC_PERIOD, &self.db_sync_period)]
    }
}

/// A callable configuration value.
///
/// The host treats callables it does not recognise as foreign types, so the
/// overlay gives every hook a neutral type tag unless it already reports
/// the SQLite client name.
#[derive(Clone)]
pub struct Hook {
    identity: IdentitySlot,
    func: Arc<dyn Fn() -> String + Send + Sync>,
}

impl Hook {
    /// Wrap `func`, reporting `name` until imprinted.
    pub fn new(name: &'static str, func: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            identity: IdentitySlot::new(name),
            func: Arc::new(func),
        }
    }

    /// Produce the hook's value.
    pub fn call(&self) -> String {
        (self.func)()
    }
}

impl Identify for Hook {
    fn identity_slot(&self) -> &IdentitySlot {
        &self.identity
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("reported_as", &self.identity.reported_name())
            .finish_non_exhaustive()
    }
}

/// One configuration entry.
#[derive(Debug, Clone)]
pub enum ConfigValue {
    Text(String),
    /// The dialect-client reference stored under `DB_CLIENT`.
    Client(ClientRef),
    Hook(Hook),
}

impl ConfigValue {
    /// The text, for plain entries.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConfigValue::Text(s) => Some(s),
            ConfigValue::Client(_) | ConfigValue::Hook(_) => None,
        }
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Text(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Text(s.to_string())
    }
}

impl From<Hook> for ConfigValue {
    fn from(hook: Hook) -> Self {
        ConfigValue::Hook(hook)
    }
}

/// The configuration handed to the host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    values: BTreeMap<String, ConfigValue>,
}

impl HostConfig {
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// A plain text entry.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_text)
    }

    /// The dialect-client reference.
    pub fn client(&self) -> Option<&ClientRef> {
        match self.get(DB_CLIENT) {
            Some(ConfigValue::Client(client)) => Some(client),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether `DB_SYNC` turns sync on.
    pub fn sync_enabled(&self) -> bool {
        sync_enabled(self.get(DB_SYNC))
    }

    /// Typed connection settings for the adapter.
    ///
    /// Other `DB_*` text entries pass through as camelCase options, e.g.
    /// `DB_AUTH_TOKEN` becomes `authToken`.
    pub fn connection_settings(&self) -> Result<ConnectionSettings, ConfigError> {
        let filename = self
            .text(DB_FILENAME)
            .ok_or_else(|| ConfigError::invalid(DB_FILENAME, "expected a file path"))?;
        let mut settings = ConnectionSettings::new(filename)?;

        if self.sync_enabled() {
            let url = self
                .text(DB_SYNC_URL)
                .ok_or_else(|| ConfigError::invalid(DB_SYNC_URL, "expected a URL"))?;
            let period = self.text(DB_SYNC_PERIOD).unwrap_or_default();
            let seconds = period.trim().parse::<u64>().map_err(|_| {
                ConfigError::invalid(
                    DB_SYNC_PERIOD,
                    format!("expected a whole number of seconds, got {period:?}"),
                )
            })?;
            settings = settings.with_sync(url, seconds)?;
        }

        for (key, value) in &self.values {
            let Some(text) = value.as_text() else { continue };
            if text.is_empty() || is_reserved_key(key) {
                continue;
            }
            if let Some(suffix) = key.strip_prefix("DB_") {
                settings = settings.with_option(camel_case(suffix), text);
            }
        }

        Ok(settings)
    }

    /// Client configuration the host builds adapters with.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        Ok(ClientConfig::new(self.connection_settings()?))
    }
}

/// Overlay flat operator settings with the default [`OverlayDefaults`].
pub fn overlay(base_env: &EnvMap) -> Result<HostConfig, ConfigError> {
    let input = base_env
        .iter()
        .map(|(k, v)| (k.clone(), ConfigValue::Text(v.clone())))
        .collect();
    overlay_with(input, &OverlayDefaults::default())
}

/// Overlay operator settings on `defaults`.
///
/// Presence checks run against the operator's own settings, so a default
/// never satisfies a required key.
pub fn overlay_with(
    input: HostInput,
    defaults: &OverlayDefaults,
) -> Result<HostConfig, ConfigError> {
    let mut values: BTreeMap<String, ConfigValue> = defaults
        .entries()
        .into_iter()
        .map(|(k, v)| (k.to_string(), ConfigValue::from(v)))
        .collect();
    for (key, value) in &input {
        values.insert(key.clone(), value.clone());
    }

    values.insert(DB_CLIENT.to_string(), ConfigValue::Client(ClientRef::new()));
    for &(key, value) in FORCED_OVERRIDES {
        values.insert(key.to_string(), ConfigValue::from(value));
    }

    require(&input, DB_FILENAME)?;
    if sync_enabled(values.get(DB_SYNC)) {
        for key in SYNC_KEYS {
            require(&input, key)?;
        }
    }

    for value in values.values() {
        if let ConfigValue::Hook(hook) = value {
            if hook.to_text() != SQLITE_CLIENT_NAME {
                spoof(hook, NEUTRAL_TYPE_TAG);
            }
        }
    }

    tracing::debug!(keys = values.len(), "host configuration overlaid");
    Ok(HostConfig { values })
}

/// Wrap an operator configuration function so its output is overlaid.
///
/// When `f` returns `None` the environment itself is overlaid.
pub fn with_overlay<F>(f: F) -> impl Fn(&EnvMap) -> Result<HostConfig, ConfigError>
where
    F: Fn(&EnvMap) -> Option<HostInput>,
{
    move |env| match f(env) {
        Some(input) => overlay_with(input, &OverlayDefaults::default()),
        None => overlay(env),
    }
}

fn require(input: &HostInput, key: &str) -> Result<(), ConfigError> {
    if input.contains_key(key) {
        Ok(())
    } else {
        Err(ConfigError::missing(key))
    }
}

fn sync_enabled(value: Option<&ConfigValue>) -> bool {
    value.and_then(ConfigValue::as_text) != Some(SYNC_DISABLED)
}

fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        DB_CLIENT | DB_FILENAME | DB_SYNC | DB_SYNC_URL | DB_SYNC_PERIOD
    ) || FORCED_OVERRIDES.iter().any(|(forced, _)| *forced == key)
}

/// `AUTH_TOKEN` -> `authToken`.
fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    for (i, part) in snake.split('_').filter(|p| !p.is_empty()).enumerate() {
        let lower = part.to_ascii_lowercase();
        if i == 0 {
            out.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                out.push(first.to_ascii_uppercase());
                out.push_str(chars.as_str());
            }
        }
    }
    out
}
