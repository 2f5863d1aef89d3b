//! Daemon - the ACS service
//!
//! Opens the session/ledger database, prunes stale sessions periodically,
//! and serves the CWMP endpoint until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{ApiServer, ApiState};
use crate::db::{self, DbPool, SessionRepo};
use crate::params::ParameterFile;
use crate::{Config, Error, Result};

/// How often idle sessions are swept while serving
const PRUNE_INTERVAL: Duration = Duration::from_secs(600);

/// The ACS daemon
pub struct Daemon {
    config: Config,
    db: DbPool,
}

impl Daemon {
    /// Create a new daemon instance
    ///
    /// # Errors
    ///
    /// Returns error if the data directory or database cannot be initialized
    pub fn new(config: Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).map_err(|e| {
            Error::Config(format!(
                "failed to create data dir {}: {e}",
                config.data_dir.display()
            ))
        })?;

        let db_path = config.db_path();
        let db = db::init(&db_path)?;

        tracing::info!(path = %db_path.display(), "database initialized");

        Ok(Self { config, db })
    }

    /// Database pool, for CLI subcommands that inspect the ledger
    #[must_use]
    pub const fn db(&self) -> &DbPool {
        &self.db
    }

    /// Run the daemon until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let ttl = chrono::Duration::from_std(self.config.session.ttl)
            .map_err(|e| Error::Config(format!("session ttl out of range: {e}")))?;
        let pruner = spawn_session_pruner(
            SessionRepo::new(self.db.clone()),
            ttl,
            PRUNE_INTERVAL
                .min(self.config.session.ttl)
                .max(Duration::from_secs(1)),
        );

        let params = Arc::new(ParameterFile::new(self.config.params_file.clone()));
        if !params.path().exists() {
            tracing::warn!(
                path = %params.path().display(),
                "parameter file not found, pushes will be skipped until it exists"
            );
        }

        let state = ApiState::new(self.db, params)
            .with_session_cookie(self.config.session.cookie_name.clone());

        ApiServer::new(state, self.config.server.addr())
            .run(shutdown_signal())
            .await?;

        pruner.abort();
        tracing::info!("ACS stopped");
        Ok(())
    }
}

/// Delete sessions idle longer than `ttl` every `every`, starting now
fn spawn_session_pruner(
    sessions: SessionRepo,
    ttl: chrono::Duration,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match sessions.prune(ttl) {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "pruned stale sessions"),
                Err(e) => tracing::warn!(error = %e, "failed to prune stale sessions"),
            }
        }
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutdown requested"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for ctrl-c, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
