//! Femto ACS - TR-069/CWMP auto configuration server for femtocells
//!
//! This library provides the core functionality for the ACS:
//! - SOAP envelope parsing into typed CWMP RPCs
//! - The per-device session state machine deciding when to push configuration
//! - `SetParameterValues` rendering from an INI parameter file
//! - `SQLite`-backed session and needs-push ledger storage
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 HTTP (axum)  /acs                   │
//! │      content-type check  │  session cookie          │
//! └────────────────────┬────────────────────────────────┘
//!                      │ body
//! ┌────────────────────▼────────────────────────────────┐
//! │  envelope::read ─► Dispatcher ─► encoder::encode    │
//! │                      │    │                         │
//! │              ledger ◄┘    └► params::resolve        │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod cwmp;
pub mod daemon;
pub mod db;
pub mod error;
pub mod params;

pub use config::Config;
pub use daemon::Daemon;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use params::{ParamEntry, ParameterFile, ParameterProvider, ParameterSource, ResolvedParams};
