//! TOML configuration file loading
//!
//! Supports `~/.config/femto-acs/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AcsConfigFile {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// CWMP behaviour and storage
    #[serde(default)]
    pub acs: AcsFileConfig,
}

/// HTTP listener configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Address to bind (e.g. "0.0.0.0")
    pub bind: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,
}

/// CWMP behaviour and storage
#[derive(Debug, Default, Deserialize)]
pub struct AcsFileConfig {
    /// INI file with `[Common]` and per-serial parameter sections
    pub params_file: Option<String>,

    /// Directory holding the session/ledger database
    pub data_dir: Option<String>,

    /// Name of the session cookie handed to CPEs
    pub session_cookie: Option<String>,

    /// Sessions idle longer than this are pruned at startup
    pub session_ttl_secs: Option<u64>,
}

/// Load the TOML config file from `path`, or the standard path if `None`
///
/// Returns `AcsConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> AcsConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return AcsConfigFile::default();
    };

    if !path.exists() {
        return AcsConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AcsConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AcsConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/femto-acs/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("femto-acs").join("config.toml"))
}
