//! Configuration management for the femto ACS
//!
//! Precedence: command line / environment > TOML file > defaults.

pub mod file;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::{Error, Result};

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "acs_session";

/// Default idle lifetime of a session: one day
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// ACS configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener
    pub server: ServerConfig,

    /// INI parameter file, re-read on every push
    pub params_file: PathBuf,

    /// Directory holding `acs.db`
    pub data_dir: PathBuf,

    /// Session cookie handling
    pub session: SessionConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }
}

/// Session cookie configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie carrying the session id
    pub cookie_name: String,

    /// Sessions idle longer than this are pruned at startup
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            ttl: DEFAULT_SESSION_TTL,
        }
    }
}

/// Values given on the command line (or their environment fallbacks)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub bind: Option<IpAddr>,
    pub port: Option<u16>,
    pub params_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from overrides, the TOML file, and defaults
    ///
    /// # Errors
    ///
    /// Returns error if the configured bind address is not an IP address
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let fc = file::load_config_file(overrides.config_file.as_deref());

        let bind = match (overrides.bind, fc.server.bind) {
            (Some(bind), _) => bind,
            (None, Some(raw)) => raw
                .parse()
                .map_err(|e| Error::Config(format!("invalid bind address {raw:?}: {e}")))?,
            (None, None) => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let server = ServerConfig {
            bind,
            port: overrides.port.or(fc.server.port).unwrap_or(DEFAULT_PORT),
        };

        let params_file = overrides
            .params_file
            .clone()
            .or_else(|| fc.acs.params_file.map(PathBuf::from))
            .unwrap_or_else(default_params_file);

        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| fc.acs.data_dir.map(PathBuf::from))
            .unwrap_or_else(default_data_dir);

        let session = SessionConfig {
            cookie_name: std::env::var("FEMTO_ACS_SESSION_COOKIE")
                .ok()
                .or(fc.acs.session_cookie)
                .unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string()),
            ttl: fc
                .acs
                .session_ttl_secs
                .map_or(DEFAULT_SESSION_TTL, Duration::from_secs),
        };

        if session.cookie_name.is_empty()
            || session
                .cookie_name
                .contains(|c: char| c.is_whitespace() || matches!(c, ';' | '=' | ','))
        {
            return Err(Error::Config(format!(
                "invalid session cookie name {:?}",
                session.cookie_name
            )));
        }

        Ok(Self {
            server,
            params_file,
            data_dir,
            session,
        })
    }

    /// Path of the session/ledger database
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("acs.db")
    }
}

/// Parameter file shipped with the repository, relative to the working directory
const DEFAULT_PARAMS_FILE: &str = "config/femtocells.ini";

fn default_params_file() -> PathBuf {
    PathBuf::from(DEFAULT_PARAMS_FILE)
}

/// `~/.local/share/femto-acs` on Linux
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map_or_else(|| PathBuf::from("data"), |d| d.data_dir().join("femto-acs"))
}
