//! Error types for ghload
//!
//! All modules use `LoaderResult<T>` as their return type. Component
//! boundaries (resolver, fetcher, executor) log these and hand back
//! absence instead, so only configuration and bootstrap failures ever
//! reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;

/// All errors that can occur in ghload
#[derive(Error, Debug)]
pub enum LoaderError {
    // Source identity errors
    #[error("Invalid source configuration: {0}")]
    ConfigInvalid(String),

    // Configuration file errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigFile { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Update protocol errors
    #[error("Could not resolve latest version of {target}: {reason}")]
    ResolutionFailed { target: String, reason: String },

    #[error("Could not fetch {target} at {version}: {reason}")]
    FetchFailed {
        target: String,
        version: String,
        reason: String,
    },

    #[error("Script execution failed: {0}")]
    ExecutionFailed(String),

    #[error("No cached copy of {0} and the remote could not be reached")]
    BootstrapFailed(String),

    // Transport errors
    #[error("HTTP request to {url} failed: {reason}")]
    Http { url: String, reason: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to decode content: {0}")]
    Decode(String),

    // Cache errors
    #[error("Failed to write cache slot {key}: {source}")]
    CacheWrite {
        key: String,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LoaderError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an HTTP transport error
    pub fn http(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Http {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::ConfigInvalid(_) => {
                Some("Pass OWNER/REPO to the command or set [source] owner and repo in config.toml")
            }
            Self::BootstrapFailed(_) => {
                Some("Check network access to api.github.com, or set http.token if rate limited")
            }
            Self::ConfigFile { .. } => Some("Run: ghload config init --force"),
            _ => None,
        }
    }
}
