//! Needs-push ledger repository

use chrono::Utc;
use rusqlite::{OptionalExtension, params};

use super::DbPool;
use crate::Result;
use crate::cwmp::NeedsConfigStore;

/// `SQLite`-backed needs-push ledger
#[derive(Clone)]
pub struct LedgerRepo {
    pool: DbPool,
}

impl LedgerRepo {
    /// Create a new ledger repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Forget a serial entirely, so its next poll is treated as first contact
    ///
    /// # Errors
    ///
    /// Returns error if database operation fails
    pub fn remove(&self, serial: &str) -> Result<bool> {
        let conn = super::conn(&self.pool)?;
        let removed = conn.execute("DELETE FROM needs_config WHERE serial = ?1", [serial])?;
        Ok(removed > 0)
    }
}

impl NeedsConfigStore for LedgerRepo {
    fn get(&self, serial: &str) -> Result<Option<bool>> {
        let conn = super::conn(&self.pool)?;
        let flag = conn
            .query_row(
                "SELECT needs_push FROM needs_config WHERE serial = ?1",
                [serial],
                |row| row.get::<_, bool>(0),
            )
            .optional()?;
        Ok(flag)
    }

    fn set(&self, serial: &str, needs_push: bool) -> Result<()> {
        let conn = super::conn(&self.pool)?;
        conn.execute(
            "INSERT INTO needs_config (serial, needs_push, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(serial) DO UPDATE SET needs_push = excluded.needs_push,
                                               updated_at = excluded.updated_at",
            params![serial, needs_push, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}
