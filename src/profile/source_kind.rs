//! Upstream source identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upstream service a profile is fetched from
///
/// Ordering is alphabetical by key so maps keyed by `SourceKind` serialize
/// deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Bitbucket,
    GitHub,
}

impl SourceKind {
    /// Every known source, in key order
    pub const ALL: [SourceKind; 2] = [SourceKind::Bitbucket, SourceKind::GitHub];

    /// Query-string / JSON key for this source
    pub fn key(&self) -> &'static str {
        match self {
            SourceKind::Bitbucket => "bitbucket",
            SourceKind::GitHub => "github",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bitbucket" => Ok(SourceKind::Bitbucket),
            "github" => Ok(SourceKind::GitHub),
            other => Err(format!(
                "Unknown source '{}'. Must be one of: bitbucket, github",
                other
            )),
        }
    }
}
