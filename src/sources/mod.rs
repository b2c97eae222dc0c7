//! Source adapters
//!
//! Each adapter translates one upstream API into a `ProfileRecord`.
//!
//! # Fetch pipeline
//!
//! Every adapter call follows the same shape:
//!
//! 1. **Root + listing**: the org/workspace lookup and the repository listing
//!    are dispatched together and both awaited before anything is processed.
//!    A failed root lookup aborts the call; a failed listing only empties the
//!    derived fields.
//! 2. **Enrichment**: one request per listed repository (GitHub language
//!    breakdowns, Bitbucket watcher counts), run concurrently and optionally
//!    capped via `max_concurrent_requests`.
//! 3. **Aggregate**: languages, topics and followers are folded from the
//!    listing and enrichment results.
//!
//! Adapters never retry and keep no state between calls.

pub mod bitbucket;
pub mod github;
pub mod upstream;

#[cfg(test)]
pub(crate) mod testing;

use crate::config::SourceSettings;
use crate::profile::{ProfileRecord, SourceKind};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use bitbucket::BitbucketAdapter;
pub use github::GitHubAdapter;
pub use upstream::{fan_out, UpstreamClient};

/// An upstream service that can produce an organization profile
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Which source this adapter speaks for
    fn kind(&self) -> SourceKind;

    /// Fetch and enrich the profile for `identifier`.
    ///
    /// `timeout` applies to each outbound request individually.
    ///
    /// # Errors
    /// `NotFound` when the root lookup returns 404, `Upstream` for any other
    /// root failure, transport fault or malformed payload.
    async fn fetch_profile(&self, identifier: &str, timeout: Duration) -> Result<ProfileRecord>;
}

/// Build the adapter for the given settings
pub fn build_source(settings: SourceSettings) -> Result<Arc<dyn ProfileSource>> {
    Ok(match settings.kind {
        SourceKind::GitHub => Arc::new(GitHubAdapter::new(settings)?),
        SourceKind::Bitbucket => Arc::new(BitbucketAdapter::new(settings)?),
    })
}

/// Profile display name: the upstream `name`, or the identifier when absent
pub(crate) fn display_name(
    metadata: &serde_json::Map<String, serde_json::Value>,
    identifier: &str,
) -> String {
    metadata
        .get("name")
        .and_then(|v| v.as_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(identifier)
        .to_string()
}

/// Lowercased language name, or `None` for null/blank languages
pub(crate) fn normalize_language(language: Option<&str>) -> Option<String> {
    language
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_lowercase)
}
