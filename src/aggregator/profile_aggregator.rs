//! Multi-source profile aggregator implementation

use crate::config::GatewayConfig;
use crate::profile::{MergedProfile, Normalize, ProfileRecord, PublicProfile, SourceKind};
use crate::sources::{build_source, ProfileSource};
use crate::{ProfileError, Result};
use futures::future::join_all;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

/// Status reported for adapter failures that carry no upstream status
const INTERNAL_ERROR_STATUS: u16 = 500;

/// Outcome of one source's fetch within an aggregation
#[derive(Debug, Clone, PartialEq)]
pub enum SourceResult {
    Success(ProfileRecord),
    NotFound {
        service: SourceKind,
        identifier: String,
    },
    UpstreamFailure {
        service: SourceKind,
        status: u16,
        message: String,
    },
}

impl SourceResult {
    /// Tag an adapter outcome
    pub fn from_outcome(service: SourceKind, outcome: Result<ProfileRecord>) -> Self {
        match outcome {
            Ok(record) => SourceResult::Success(record),
            Err(ProfileError::NotFound {
                service,
                identifier,
            }) => SourceResult::NotFound {
                service,
                identifier,
            },
            Err(ProfileError::Upstream {
                service,
                status,
                message,
            }) => SourceResult::UpstreamFailure {
                service,
                status,
                message,
            },
            Err(other) => SourceResult::UpstreamFailure {
                service,
                status: INTERNAL_ERROR_STATUS,
                message: other.to_string(),
            },
        }
    }

    /// Public shape of a successful fetch
    pub fn profile(&self) -> Option<PublicProfile> {
        match self {
            SourceResult::Success(record) => Some(record.normalize()),
            _ => None,
        }
    }
}

/// Reported failure for one source in a merged response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFailure {
    pub status_code: u16,
    pub message: String,
}

/// Result of a multi-source aggregation
///
/// Never contains `NotFound` results: those abort the aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub merged: MergedProfile,
    pub results: BTreeMap<SourceKind, SourceResult>,
}

impl Aggregation {
    /// Normalized profiles of the sources that succeeded
    pub fn profiles(&self) -> BTreeMap<SourceKind, PublicProfile> {
        self.results
            .iter()
            .filter_map(|(kind, result)| result.profile().map(|p| (*kind, p)))
            .collect()
    }

    /// Failures of the sources that did not succeed
    pub fn errors(&self) -> BTreeMap<SourceKind, SourceFailure> {
        self.results
            .iter()
            .filter_map(|(kind, result)| match result {
                SourceResult::UpstreamFailure {
                    status, message, ..
                } => Some((
                    *kind,
                    SourceFailure {
                        status_code: *status,
                        message: message.clone(),
                    },
                )),
                _ => None,
            })
            .collect()
    }
}

/// Merged-profiles response body:
/// `{ "<source>": profile | null, "__errors__": {...}, "__merged__": {...} }`
///
/// `__errors__` is only present when at least one source failed.
impl Serialize for Aggregation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let errors: BTreeMap<&str, SourceFailure> = self
            .errors()
            .into_iter()
            .map(|(kind, failure)| (kind.key(), failure))
            .collect();

        let mut map = serializer.serialize_map(None)?;
        for (kind, result) in &self.results {
            map.serialize_entry(kind.key(), &result.profile())?;
        }
        if !errors.is_empty() {
            map.serialize_entry("__errors__", &errors)?;
        }
        map.serialize_entry("__merged__", &self.merged)?;
        map.end()
    }
}

/// Multi-source profile aggregator
///
/// Holds one adapter per source. Adapters keep no state between calls, so a
/// single aggregator can serve concurrent requests.
pub struct Aggregator {
    sources: BTreeMap<SourceKind, Arc<dyn ProfileSource>>,

    /// Per-request upstream timeout handed to every adapter call
    timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator with no sources
    pub fn new(timeout: Duration) -> Self {
        Self {
            sources: BTreeMap::new(),
            timeout,
        }
    }

    /// Register (or replace) the adapter for the source it speaks for
    pub fn with_source(mut self, source: Arc<dyn ProfileSource>) -> Self {
        self.sources.insert(source.kind(), source);
        self
    }

    /// Create an aggregator with every source configured
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let mut aggregator = Self::new(config.request_timeout());
        for kind in SourceKind::ALL {
            aggregator = aggregator.with_source(build_source(config.source(kind))?);
        }
        Ok(aggregator)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn source(&self, kind: SourceKind) -> Result<&Arc<dyn ProfileSource>> {
        self.sources
            .get(&kind)
            .ok_or_else(|| ProfileError::Config(format!("No adapter registered for {}", kind)))
    }

    /// Fetch one source's profile
    pub async fn fetch(&self, kind: SourceKind, identifier: &str) -> Result<ProfileRecord> {
        self.source(kind)?
            .fetch_profile(identifier, self.timeout)
            .await
    }

    /// Fetch every requested source concurrently and tag each outcome.
    ///
    /// A failing source never cancels or alters another source's call; all
    /// calls complete before any result is returned.
    pub async fn collect(
        &self,
        requests: &BTreeMap<SourceKind, String>,
    ) -> Result<BTreeMap<SourceKind, SourceResult>> {
        if requests.is_empty() {
            return Err(ProfileError::invalid_request());
        }

        let calls = requests.iter().map(|(kind, identifier)| async move {
            let outcome = self.fetch(*kind, identifier).await;
            if let Err(ref e) = outcome {
                tracing::warn!(
                    service = %kind,
                    identifier = %identifier,
                    error = %e,
                    "Source fetch failed"
                );
            }
            (*kind, SourceResult::from_outcome(*kind, outcome))
        });

        Ok(join_all(calls).await.into_iter().collect())
    }

    /// Aggregate the requested sources into per-source results and a merged profile.
    ///
    /// # Errors
    /// `InvalidRequest` when `requests` is empty. `NotFound` when any source's
    /// root entity is missing, even if other sources succeeded; the first in
    /// source-key order is reported.
    pub async fn aggregate(&self, requests: &BTreeMap<SourceKind, String>) -> Result<Aggregation> {
        let results = self.collect(requests).await?;

        if let Some((service, identifier)) = results.values().find_map(|r| match r {
            SourceResult::NotFound {
                service,
                identifier,
            } => Some((*service, identifier.clone())),
            _ => None,
        }) {
            return Err(ProfileError::NotFound {
                service,
                identifier,
            });
        }

        let profiles: Vec<PublicProfile> = results.values().filter_map(|r| r.profile()).collect();
        let merged: MergedProfile = profiles.iter().collect();

        tracing::info!(
            requested = results.len(),
            succeeded = profiles.len(),
            public_repos = merged.public_repos,
            "Aggregated profiles"
        );

        Ok(Aggregation { merged, results })
    }
}

/// Pick the recognised source keys out of a query map.
///
/// Unknown keys and blank identifiers are ignored.
///
/// # Errors
/// `InvalidRequest` naming the valid keys when nothing usable remains.
pub fn parse_requests(params: &HashMap<String, String>) -> Result<BTreeMap<SourceKind, String>> {
    let requests: BTreeMap<SourceKind, String> = params
        .iter()
        .filter_map(|(key, identifier)| {
            let kind = key.parse::<SourceKind>().ok()?;
            let identifier = identifier.trim();
            (!identifier.is_empty()).then(|| (kind, identifier.to_string()))
        })
        .collect();

    if requests.is_empty() {
        return Err(ProfileError::invalid_request());
    }
    Ok(requests)
}
