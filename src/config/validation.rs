//! Configuration validation
//!
//! Validates RepoProfiles configuration for correctness:
//! - Parseable server bind address
//! - HTTP(S) upstream URLs
//! - Non-zero timeout and fan-out cap
//! - Complete credentials when provided

use super::gateway_config::{Credentials, GatewayConfig};
use crate::profile::SourceKind;
use crate::ProfileError;
use std::net::SocketAddr;

/// Validation error details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub source: Option<SourceKind>,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: None,
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_source(mut self, source: SourceKind) -> Self {
        self.source = Some(source);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(source) = self.source {
            write!(f, "[{}] {}: {}", source, self.field, self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
pub type ValidationResult = std::result::Result<(), Vec<ValidationError>>;

/// Validate a RepoProfiles configuration
pub fn validate_config(config: &GatewayConfig) -> ValidationResult {
    let mut errors = Vec::new();

    if config.server.bind.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind",
            format!("Invalid socket address: {}", config.server.bind),
        ));
    }

    if config.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "request_timeout_secs",
            "Timeout must be at least 1 second",
        ));
    }

    if config.max_concurrent_requests == Some(0) {
        errors.push(ValidationError::new(
            "max_concurrent_requests",
            "Concurrency cap must be at least 1 (omit it for no cap)",
        ));
    }

    for kind in SourceKind::ALL {
        let settings = config.source(kind);

        for (field, url) in [("api_url", &settings.api_url), ("web_url", &settings.web_url)] {
            if !is_http_url(url) {
                errors.push(
                    ValidationError::new(
                        format!("{}.{}", kind, field),
                        format!("Invalid URL: {}", url),
                    )
                    .with_source(kind),
                );
            }
        }

        if let Some(ref creds) = settings.auth {
            if let Err(e) = validate_credentials(kind, creds) {
                errors.push(e.with_source(kind));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_credentials(
    kind: SourceKind,
    creds: &Credentials,
) -> std::result::Result<(), ValidationError> {
    if creds.username.trim().is_empty() {
        return Err(ValidationError::new(
            format!("{}.auth.username", kind),
            "Username cannot be empty",
        ));
    }
    if creds.token.trim().is_empty() {
        return Err(ValidationError::new(
            format!("{}.auth.token", kind),
            "Token cannot be empty",
        ));
    }
    Ok(())
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate and collapse all problems into a single configuration error
pub fn validate_config_result(config: &GatewayConfig) -> crate::Result<()> {
    validate_config(config).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        ProfileError::Config(format!(
            "Configuration validation failed:\n  - {}",
            messages.join("\n  - ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::new()).is_ok());
    }

    #[test]
    fn test_reports_every_problem() {
        let mut config = GatewayConfig::new();
        config.server.bind = "not-an-address".to_string();
        config.request_timeout_secs = 0;
        config.max_concurrent_requests = Some(0);
        config.github.api_url = "ftp://api.github.com".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.field == "server.bind"));
        assert!(errors
            .iter()
            .any(|e| e.field == "github.api_url" && e.source == Some(SourceKind::GitHub)));
    }

    #[test]
    fn test_incomplete_credentials() {
        let mut config = GatewayConfig::new();
        config.bitbucket.auth = Some(Credentials {
            username: "team".to_string(),
            token: " ".to_string(),
        });

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "bitbucket.auth.token");
        assert_eq!(
            errors[0].to_string(),
            "[bitbucket] bitbucket.auth.token: Token cannot be empty"
        );
    }

    #[test]
    fn test_validate_config_result_joins_messages() {
        let mut config = GatewayConfig::new();
        config.request_timeout_secs = 0;

        match validate_config_result(&config) {
            Err(ProfileError::Config(msg)) => {
                assert!(msg.contains("request_timeout_secs"));
            }
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
