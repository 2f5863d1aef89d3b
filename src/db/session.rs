//! CWMP session repository

use chrono::{Duration, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};
use uuid::Uuid;

use super::DbPool;
use crate::Result;
use crate::cwmp::SessionStore;

/// `SQLite`-backed session store keyed by cookie id
#[derive(Clone)]
pub struct SessionRepo {
    pool: DbPool,
}

impl SessionRepo {
    /// Create a new session repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Allocate a fresh session id
    #[must_use]
    pub fn new_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Delete sessions not touched within `max_age`
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn prune(&self, max_age: Duration) -> Result<usize> {
        let conn = super::conn(&self.pool)?;
        let cutoff = (Utc::now() - max_age).to_rfc3339_opts(SecondsFormat::Micros, true);
        let removed = conn.execute("DELETE FROM cwmp_sessions WHERE updated_at < ?1", [cutoff])?;
        Ok(removed)
    }
}

impl SessionStore for SessionRepo {
    fn serial(&self, session_id: &str) -> Result<Option<String>> {
        let conn = super::conn(&self.pool)?;
        let serial = conn
            .query_row(
                "SELECT serial FROM cwmp_sessions WHERE id = ?1",
                [session_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;
        Ok(serial.flatten())
    }

    fn set_serial(&self, session_id: &str, serial: &str) -> Result<()> {
        let conn = super::conn(&self.pool)?;
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        conn.execute(
            "INSERT INTO cwmp_sessions (id, serial, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(id) DO UPDATE SET serial = excluded.serial,
                                           updated_at = excluded.updated_at",
            params![session_id, serial, now],
        )?;
        Ok(())
    }
}
