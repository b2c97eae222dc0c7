//! In-memory sources for unit tests

use super::ProfileSource;
use crate::profile::{ProfileRecord, SourceKind};
use crate::{ProfileError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;

pub(crate) enum Behavior {
    Profile(ProfileRecord),
    NotFound,
    Upstream(u16),
    /// Wait on the barrier, then return the profile
    Rendezvous(Arc<Barrier>, ProfileRecord),
}

pub(crate) struct StubSource {
    kind: SourceKind,
    behavior: Behavior,
}

#[async_trait]
impl ProfileSource for StubSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch_profile(&self, identifier: &str, _timeout: Duration) -> Result<ProfileRecord> {
        match &self.behavior {
            Behavior::Profile(record) => Ok(record.clone()),
            Behavior::NotFound => Err(ProfileError::NotFound {
                service: self.kind,
                identifier: identifier.to_string(),
            }),
            Behavior::Upstream(status) => {
                Err(ProfileError::upstream(self.kind, *status, "upstream exploded"))
            }
            Behavior::Rendezvous(barrier, record) => {
                barrier.wait().await;
                Ok(record.clone())
            }
        }
    }
}

pub(crate) fn stub(kind: SourceKind, behavior: Behavior) -> Arc<dyn ProfileSource> {
    Arc::new(StubSource { kind, behavior })
}

pub(crate) fn record(
    href: &str,
    public_repos: u64,
    followers: u64,
    languages: &[(&str, u64)],
    topics: &[(&str, u64)],
) -> ProfileRecord {
    let mut record = ProfileRecord::new(href, "Acme");
    record.public_repos = public_repos;
    record.followers = followers;
    record.languages = languages.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    record.topics = topics.iter().map(|(k, v)| (k.to_string(), *v)).collect();
    record
}

pub(crate) fn github_record() -> ProfileRecord {
    record(
        "https://github.com/acme",
        3,
        10,
        &[("go", 2), ("rust", 1)],
        &[],
    )
}

pub(crate) fn bitbucket_record() -> ProfileRecord {
    record("https://bitbucket.org/acme", 2, 5, &[("go", 1)], &[("cli", 1)])
}
