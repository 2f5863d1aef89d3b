//! Error types for the femto ACS

use thiserror::Error;

/// Result type alias for ACS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the ACS
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Parameter file error
    #[error("parameter file error: {0}")]
    Params(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Database error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
