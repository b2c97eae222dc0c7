//! RepoProfiles configuration file handling
//!
//! Loads and manages the ~/.config/repoprofiles/config.yaml file. Every field
//! has a default, so a missing or partial file still yields a usable config.

use crate::profile::SourceKind;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP boundary listens on
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// HTTP basic-auth credentials for one upstream
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// GitHub upstream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API base URL
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    /// Public web base URL used for profile `href`s
    #[serde(default = "default_github_web_url")]
    pub web_url: String,

    #[serde(default)]
    pub auth: Option<Credentials>,
}

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_web_url() -> String {
    "https://github.com".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            web_url: default_github_web_url(),
            auth: None,
        }
    }
}

/// Bitbucket upstream settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BitbucketConfig {
    /// REST API base URL
    #[serde(default = "default_bitbucket_api_url")]
    pub api_url: String,

    /// Public web base URL used for profile `href`s
    #[serde(default = "default_bitbucket_web_url")]
    pub web_url: String,

    #[serde(default)]
    pub auth: Option<Credentials>,
}

fn default_bitbucket_api_url() -> String {
    "https://bitbucket.org/!api/2.0".to_string()
}

fn default_bitbucket_web_url() -> String {
    "https://bitbucket.org".to_string()
}

impl Default for BitbucketConfig {
    fn default() -> Self {
        Self {
            api_url: default_bitbucket_api_url(),
            web_url: default_bitbucket_web_url(),
            auth: None,
        }
    }
}

/// Resolved settings handed to one source adapter at construction
#[derive(Debug, Clone)]
pub struct SourceSettings {
    pub kind: SourceKind,
    pub api_url: String,
    pub web_url: String,
    pub auth: Option<Credentials>,
    /// Cap on concurrent per-repository requests (None = one request per repo at once)
    pub max_concurrent_requests: Option<usize>,
}

impl SourceSettings {
    /// API base URL without a trailing slash
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    /// Web base URL without a trailing slash
    pub fn web_base(&self) -> &str {
        self.web_url.trim_end_matches('/')
    }
}

/// RepoProfiles configuration
///
/// Represents the complete ~/.config/repoprofiles/config.yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Timeout applied to every outbound upstream request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Optional cap on per-repository fan-out within one adapter call
    #[serde(default)]
    pub max_concurrent_requests: Option<usize>,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub bitbucket: BitbucketConfig,
}

fn default_request_timeout_secs() -> u64 {
    2
}

impl GatewayConfig {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self {
            server: ServerConfig::default(),
            request_timeout_secs: default_request_timeout_secs(),
            max_concurrent_requests: None,
            github: GitHubConfig::default(),
            bitbucket: BitbucketConfig::default(),
        }
    }

    /// Load configuration from the default path, falling back to defaults
    /// when no file exists there
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Ok(Self::new())
        }
    }

    /// Load configuration from a specific path
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(crate::ProfileError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        tracing::info!(path = %path.display(), "Loading RepoProfiles configuration");

        let content = fs::read_to_string(path)?;
        let config: Self = if content.trim().is_empty() {
            Self::new()
        } else {
            serde_yaml::from_str(&content)?
        };

        tracing::debug!(
            bind = %config.server.bind,
            timeout_secs = config.request_timeout_secs,
            github_api = %config.github.api_url,
            bitbucket_api = %config.bitbucket.api_url,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Save configuration to a specific path
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        tracing::info!(path = %path.display(), "Saving RepoProfiles configuration");

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;

        Ok(())
    }

    /// Get the default config path (~/.config/repoprofiles/config.yaml)
    pub fn default_path() -> PathBuf {
        // Always use ~/.config for consistency across platforms (macOS, Linux)
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".config");
        path.push("repoprofiles");
        path.push("config.yaml");
        path
    }

    /// Per-request upstream timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve the settings for one source adapter
    pub fn source(&self, kind: SourceKind) -> SourceSettings {
        let (api_url, web_url, auth) = match kind {
            SourceKind::GitHub => (
                self.github.api_url.clone(),
                self.github.web_url.clone(),
                self.github.auth.clone(),
            ),
            SourceKind::Bitbucket => (
                self.bitbucket.api_url.clone(),
                self.bitbucket.web_url.clone(),
                self.bitbucket.auth.clone(),
            ),
        };

        SourceSettings {
            kind,
            api_url,
            web_url,
            auth,
            max_concurrent_requests: self.max_concurrent_requests,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}
