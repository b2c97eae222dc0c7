//! Configuration system
//!
//! Loads ~/.config/repoprofiles/config.yaml with support for:
//! - HTTP server bind address
//! - Per-request upstream timeout and optional fan-out cap
//! - Per-source API/web base URLs and credentials

mod gateway_config;
pub mod validation;

pub use gateway_config::{
    BitbucketConfig, Credentials, GatewayConfig, GitHubConfig, ServerConfig, SourceSettings,
};
pub use validation::{validate_config, validate_config_result, ValidationError};
