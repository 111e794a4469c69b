//! Reported identities.
//!
//! Host frameworks decide which code paths a driver gets by comparing names:
//! the client's class name, its dialect string, its type tag. A substituted
//! client has to report the name the host expects even though it is a
//! different implementation.
//!
//! Every participant carries an [`IdentitySlot`]. The slot starts out
//! reporting the implementation's own name and can be imprinted exactly once;
//! after that the reported name is frozen; later imprints are ignored.

use std::fmt;
use std::sync::OnceLock;

/// Name the host's built-in SQLite dialect client reports.
pub const SQLITE_CLIENT_NAME: &str = "Client_SQLite3";

/// Dialect and driver name the host associates with SQLite.
pub const SQLITE_DIALECT: &str = "sqlite3";

/// Generic tag given to callable configuration values.
pub const NEUTRAL_TYPE_TAG: &str = "function";

/// A fixed display name.
///
/// All three name-reporting surfaces return the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportedIdentity {
    name: String,
}

impl ReportedIdentity {
    /// Create an identity reporting `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Textual conversion.
    pub fn to_text(&self) -> &str {
        &self.name
    }

    /// Type tag.
    pub fn type_tag(&self) -> &str {
        &self.name
    }

    /// Primitive conversion.
    pub fn to_primitive(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ReportedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A set-once reported name, falling back to the implementation's own name.
#[derive(Debug)]
pub struct IdentitySlot {
    actual: &'static str,
    imprinted: OnceLock<ReportedIdentity>,
}

impl IdentitySlot {
    /// A slot for an implementation named `actual`, not yet imprinted.
    pub const fn new(actual: &'static str) -> Self {
        Self {
            actual,
            imprinted: OnceLock::new(),
        }
    }

    /// A slot that is imprinted from the start.
    pub fn imprinted(actual: &'static str, display_name: impl Into<String>) -> Self {
        let slot = Self::new(actual);
        slot.imprint(display_name);
        slot
    }

    /// Freeze the reported name to `display_name`.
    ///
    /// Returns `false` without changing anything when the slot already
    /// carries a name.
    pub fn imprint(&self, display_name: impl Into<String>) -> bool {
        let applied = self
            .imprinted
            .set(ReportedIdentity::new(display_name))
            .is_ok();
        if !applied {
            tracing::trace!(
                actual = self.actual,
                reported = %self.reported_name(),
                "identity already imprinted; ignoring"
            );
        }
        applied
    }

    /// Whether a name has been imprinted.
    pub fn is_imprinted(&self) -> bool {
        self.imprinted.get().is_some()
    }

    /// The name currently reported.
    pub fn reported_name(&self) -> &str {
        self.imprinted
            .get()
            .map_or(self.actual, ReportedIdentity::to_text)
    }

    /// The implementation's own name, regardless of imprinting.
    pub fn actual_name(&self) -> &'static str {
        self.actual
    }
}

impl Clone for IdentitySlot {
    fn clone(&self) -> Self {
        let imprinted = OnceLock::new();
        if let Some(identity) = self.imprinted.get() {
            let _ = imprinted.set(identity.clone());
        }
        Self {
            actual: self.actual,
            imprinted,
        }
    }
}

/// Anything that exposes a name-reporting surface to the host.
pub trait Identify {
    /// The slot backing this value's reported identity.
    fn identity_slot(&self) -> &IdentitySlot;

    /// Textual conversion.
    fn to_text(&self) -> &str {
        self.identity_slot().reported_name()
    }

    /// Type tag.
    fn type_tag(&self) -> &str {
        self.identity_slot().reported_name()
    }

    /// Primitive conversion.
    fn to_primitive(&self) -> &str {
        self.identity_slot().reported_name()
    }
}

/// Imprint `display_name` onto `target`.
///
/// A no-op when `target` already reports a frozen name.
pub fn spoof<T: Identify + ?Sized>(target: &T, display_name: &str) -> bool {
    target.identity_slot().imprint(display_name)
}

/// The host's own check: does this client report itself as the SQLite client?
pub fn host_recognizes_sqlite<T: Identify + ?Sized>(client: &T) -> bool {
    client.to_text() == SQLITE_CLIENT_NAME
        && client.type_tag() == SQLITE_CLIENT_NAME
        && client.to_primitive() == SQLITE_CLIENT_NAME
}
