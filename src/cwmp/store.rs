//! Storage seams consumed by the session state machine
//!
//! The state machine never touches a database directly. It reads and writes
//! the needs-push ledger through [`NeedsConfigStore`], and works on a
//! [`DeviceSession`] that the HTTP layer loads from and saves to a
//! [`SessionStore`].

use crate::Result;

/// Per-serial "does this device need a configuration push" ledger
///
/// Implementations give no transactional guarantees: a `get` followed by a
/// `set` for the same serial can interleave with another exchange.
pub trait NeedsConfigStore: Send + Sync {
    /// Read the flag for `serial`, `None` if the serial was never recorded
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn get(&self, serial: &str) -> Result<Option<bool>>;

    /// Record the flag for `serial`
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn set(&self, serial: &str, needs_push: bool) -> Result<()>;
}

/// Keyed storage for the serial bound to an HTTP session
pub trait SessionStore: Send + Sync {
    /// Serial stored for `session_id`, if any
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn serial(&self, session_id: &str) -> Result<Option<String>>;

    /// Bind `serial` to `session_id`, creating the session if needed
    ///
    /// # Errors
    ///
    /// Returns error if the backing store fails
    fn set_serial(&self, session_id: &str, serial: &str) -> Result<()>;
}

/// Identity of one CPE across a sequence of HTTP round trips
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSession {
    serial: Option<String>,
    dirty: bool,
}

impl DeviceSession {
    /// Session with no device bound yet
    #[must_use]
    pub const fn new() -> Self {
        Self {
            serial: None,
            dirty: false,
        }
    }

    /// Session restored from storage
    #[must_use]
    pub const fn restored(serial: Option<String>) -> Self {
        Self {
            serial,
            dirty: false,
        }
    }

    /// Device serial bound to this session
    #[must_use]
    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Bind a serial; the last Inform wins
    pub fn set_serial(&mut self, serial: impl Into<String>) {
        self.serial = Some(serial.into());
        self.dirty = true;
    }

    /// Whether the serial changed since the session was loaded
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}
