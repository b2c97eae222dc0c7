//! RepoProfiles - Organization profile aggregation gateway
//!
//! Fetches organization/workspace profiles from GitHub and Bitbucket
//! concurrently, enriches them with per-repository language, topic and
//! watcher data, and merges them into a single cross-source view.
//!
//! # Architecture
//!
//! - **profile**: Data model (ProfileRecord, PublicProfile, MergedProfile, frequency maps)
//! - **sources**: Upstream adapters (GitHub, Bitbucket) and shared HTTP plumbing
//! - **aggregator**: Concurrent multi-source fetch with per-source failure isolation
//! - **server**: HTTP boundary (axum)
//! - **config**: YAML configuration and validation

pub mod aggregator;
pub mod config;
pub mod error;
pub mod logging;
pub mod profile;
pub mod server;
pub mod sources;

// Re-exports
pub use error::{ProfileError, Result};
