//! Configuration schema for ghload
//!
//! Configuration is stored at `~/.config/ghload/config.toml`

use crate::source::{DEFAULT_BRANCH, DEFAULT_FILE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Default script source
    pub source: SourceConfig,

    /// Remote service endpoints
    pub endpoints: EndpointsConfig,

    /// HTTP client settings
    pub http: HttpConfig,

    /// Script interpreter
    pub executor: ExecutorConfig,

    /// Local cache settings
    pub cache: CacheConfig,

    /// Load cycle behaviour
    pub loader: LoaderConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Repository and file to load when no target is given on the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Repository owner (user or organization)
    pub owner: Option<String>,

    /// Repository name
    pub repo: Option<String>,

    /// Path of the script inside the repository
    pub file: String,

    /// Branch whose tip is tracked
    pub branch: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            owner: None,
            repo: None,
            file: DEFAULT_FILE.to_string(),
            branch: DEFAULT_BRANCH.to_string(),
        }
    }
}

/// Endpoint base URLs, overridable for GitHub Enterprise or mirrors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Authoritative API (branch metadata, contents by reference)
    pub api_base: String,

    /// Content delivery mirror
    pub cdn_base: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            cdn_base: "https://cdn.jsdelivr.net".to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Optional API token, sent only to the authoritative API
    pub token: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: format!("ghload/{}", env!("CARGO_PKG_VERSION")),
            token: None,
        }
    }
}

/// Interpreter the fetched script is handed to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Interpreter program; the script is written to its stdin
    pub interpreter: String,

    /// Extra arguments passed before the script is streamed in
    pub args: Vec<String>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: "node".to_string(),
            args: vec![],
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory (defaults to the platform data dir)
    pub dir: Option<PathBuf>,
}

/// Load cycle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Seconds the CLI waits for background revalidation before exiting
    pub revalidate_grace_secs: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            revalidate_grace_secs: 10,
        }
    }
}
