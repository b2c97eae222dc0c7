//! Error types for RepoProfiles
//!
//! Separates the two upstream failure classes the aggregator treats
//! differently: a missing root entity (`NotFound`) aborts a merged view,
//! while any other upstream failure (`Upstream`) is isolated per source.
//! Uses thiserror for ergonomic error handling.

use crate::profile::SourceKind;
use thiserror::Error;

/// Result type alias for RepoProfiles operations
pub type Result<T> = std::result::Result<T, ProfileError>;

/// Status reported when an upstream request times out
pub const TIMEOUT_STATUS: u16 = 504;

/// Status reported for connection faults and undecodable upstream payloads
pub const BAD_GATEWAY_STATUS: u16 = 502;

/// Comprehensive error type for RepoProfiles operations
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The upstream root lookup (org/workspace) returned 404
    #[error("Unknown organization on {service}: {identifier}")]
    NotFound {
        service: SourceKind,
        identifier: String,
    },

    /// Any other upstream failure: non-2xx root lookup, transport fault, bad JSON
    #[error("{service} API error: HTTP {status}: {message}")]
    Upstream {
        service: SourceKind,
        status: u16,
        message: String,
    },

    /// The caller supplied no recognised source identifiers
    #[error("missing query string parameters: {}", format_keys(.valid))]
    InvalidRequest { valid: Vec<String> },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ProfileError {
    /// Build an upstream failure from a non-success status and response body
    pub fn upstream(service: SourceKind, status: u16, message: impl Into<String>) -> Self {
        ProfileError::Upstream {
            service,
            status,
            message: message.into(),
        }
    }

    /// Map a reqwest transport fault to an upstream failure
    ///
    /// Timeouts become 504 so callers can tell them apart from other faults.
    pub fn transport(service: SourceKind, err: &reqwest::Error) -> Self {
        let status = if err.is_timeout() {
            TIMEOUT_STATUS
        } else {
            BAD_GATEWAY_STATUS
        };
        ProfileError::upstream(service, status, err.to_string())
    }

    /// Map an undecodable upstream payload to an upstream failure
    pub fn malformed(service: SourceKind, err: impl std::fmt::Display) -> Self {
        ProfileError::upstream(
            service,
            BAD_GATEWAY_STATUS,
            format!("malformed response: {}", err),
        )
    }

    /// Build the invalid-request error listing every valid source key
    pub fn invalid_request() -> Self {
        let mut valid: Vec<String> = SourceKind::ALL.iter().map(|k| k.to_string()).collect();
        valid.sort();
        ProfileError::InvalidRequest { valid }
    }

    /// Whether a caller may reasonably retry the failed call.
    ///
    /// Adapters never retry on their own; this only classifies.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProfileError::Upstream { status, .. } => {
                matches!(*status, 429 | 500..=599)
            }
            _ => false,
        }
    }
}

fn format_keys(keys: &[String]) -> String {
    let quoted: Vec<String> = keys.iter().map(|k| format!("'{}'", k)).collect();
    format!("[{}]", quoted.join(", "))
}
