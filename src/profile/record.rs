//! Enriched per-source profile records and their public shape

use super::FrequencyMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by `ProfileRecord` itself; upstream metadata may not shadow them.
const RECORD_KEYS: [&str; 7] = [
    "href",
    "name",
    "public_repos",
    "followers",
    "languages",
    "topics",
    "language_locs",
];

/// Enriched profile for one organization/workspace on one source
///
/// Counts default to zero and maps to empty when the repository listing was
/// unavailable. `language_locs` is only populated by GitHub. `metadata`
/// carries the raw upstream root lookup and is only exposed in the extended
/// view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub href: String,
    pub name: String,

    #[serde(default)]
    pub public_repos: u64,

    #[serde(default)]
    pub followers: u64,

    #[serde(default)]
    pub languages: FrequencyMap,

    #[serde(default)]
    pub topics: FrequencyMap,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_locs: Option<FrequencyMap>,

    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ProfileRecord {
    /// Create an empty record for the given profile URL and display name
    pub fn new(href: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            name: name.into(),
            public_repos: 0,
            followers: 0,
            languages: FrequencyMap::new(),
            topics: FrequencyMap::new(),
            language_locs: None,
            metadata: Map::new(),
        }
    }

    /// Attach raw upstream metadata, dropping keys the record already owns
    pub fn with_metadata(mut self, mut metadata: Map<String, Value>) -> Self {
        for key in RECORD_KEYS {
            metadata.remove(key);
        }
        self.metadata = metadata;
        self
    }
}

/// Externally-stable profile shape
///
/// Every field is always present so consumers never need null checks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicProfile {
    pub href: String,
    pub name: String,

    #[serde(default)]
    pub public_repos: u64,

    #[serde(default)]
    pub followers: u64,

    #[serde(default)]
    pub languages: FrequencyMap,

    #[serde(default)]
    pub topics: FrequencyMap,
}

/// Reduction to the public profile shape
///
/// Normalizing is idempotent: a normalized profile normalizes to itself.
pub trait Normalize {
    fn normalize(&self) -> PublicProfile;
}

impl Normalize for ProfileRecord {
    fn normalize(&self) -> PublicProfile {
        PublicProfile {
            href: self.href.clone(),
            name: self.name.clone(),
            public_repos: self.public_repos,
            followers: self.followers,
            languages: self.languages.clone(),
            topics: self.topics.clone(),
        }
    }
}

impl Normalize for PublicProfile {
    fn normalize(&self) -> PublicProfile {
        self.clone()
    }
}
