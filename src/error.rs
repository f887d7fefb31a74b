//! Error types for steamdata
//!
//! One error enum covering the store, the remote API and the consistency checks
//! between them. Uses thiserror for ergonomic error handling.

use thiserror::Error;

/// Result type alias for steamdata operations
pub type Result<T> = std::result::Result<T, SteamDataError>;

/// Error type for steamdata operations
#[derive(Error, Debug)]
pub enum SteamDataError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local store errors not raised by SQLite itself
    #[error("Storage error: {0}")]
    Store(String),

    /// SQLite database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Remote API or image download failures not raised by the client itself
    #[error("Remote fetch error: {0}")]
    RemoteFetch(String),

    /// Steam Web API client errors
    #[error("Steam API error: {0}")]
    SteamApi(#[from] steamapi::Error),

    /// The membership cache and the local store disagree about an id
    #[error("Data integrity error: profile {id64} is marked as stored but has no row")]
    DataIntegrity { id64: u64 },

    /// The retrieval was cancelled before it completed
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SteamDataError {
    /// True for failures of the local store
    pub fn is_store_error(&self) -> bool {
        matches!(self, SteamDataError::Store(_) | SteamDataError::Database(_))
    }

    /// True for failures of the remote API or an image download
    pub fn is_remote_error(&self) -> bool {
        matches!(
            self,
            SteamDataError::RemoteFetch(_) | SteamDataError::SteamApi(_)
        )
    }
}

impl From<tokio::task::JoinError> for SteamDataError {
    fn from(e: tokio::task::JoinError) -> Self {
        SteamDataError::Store(format!("Store task failed: {}", e))
    }
}
