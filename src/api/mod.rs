//! HTTP API server for the femto ACS

pub mod acs;
pub mod health;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::config::DEFAULT_SESSION_COOKIE;
use crate::db::{DbPool, LedgerRepo, SessionRepo};
use crate::params::ParameterProvider;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub ledger: LedgerRepo,
    pub sessions: SessionRepo,
    pub params: Arc<dyn ParameterProvider>,
    pub session_cookie: String,
}

impl ApiState {
    /// Build handler state over a database pool and parameter source
    #[must_use]
    pub fn new(db: DbPool, params: Arc<dyn ParameterProvider>) -> Self {
        Self {
            ledger: LedgerRepo::new(db.clone()),
            sessions: SessionRepo::new(db.clone()),
            db,
            params,
            session_cookie: DEFAULT_SESSION_COOKIE.to_string(),
        }
    }

    /// Use a different session cookie name
    #[must_use]
    pub fn with_session_cookie(mut self, name: impl Into<String>) -> Self {
        self.session_cookie = name.into();
        self
    }
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(acs::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state))
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    addr: SocketAddr,
}

impl ApiServer {
    #[must_use]
    pub fn new(state: ApiState, addr: SocketAddr) -> Self {
        Self {
            state: Arc::new(state),
            addr,
        }
    }

    /// Run the API server until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(addr = %self.addr, "ACS listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}
