//! Bitbucket workspace adapter
//!
//! Bitbucket has no topic concept, and watcher counts are not part of the
//! repository listing, so followers need one extra request per repository.

use super::upstream::{fan_out, UpstreamClient};
use super::{display_name, normalize_language, ProfileSource};
use crate::config::SourceSettings;
use crate::profile::{count_labels, FrequencyMap, ProfileRecord, SourceKind};
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// First page of `GET /repositories/{workspace}/`
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryPage {
    /// Total number of repositories in the workspace
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub values: Vec<BitbucketRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BitbucketRepository {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub links: RepositoryLinks,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryLinks {
    #[serde(default)]
    pub watchers: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
}

/// Watcher listing requested with `pagelen=0`: only the total is returned
#[derive(Debug, Clone, Deserialize)]
struct WatcherPage {
    #[serde(default)]
    size: u64,
}

/// Bitbucket API adapter
pub struct BitbucketAdapter {
    upstream: UpstreamClient,
    settings: SourceSettings,
}

impl BitbucketAdapter {
    /// Create a new Bitbucket adapter
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let upstream = UpstreamClient::new(SourceKind::Bitbucket, settings.auth.clone())?;
        Ok(Self { upstream, settings })
    }

    fn workspace_url(&self, workspace: &str) -> String {
        format!(
            "{}/workspaces/{}",
            self.settings.api_base(),
            urlencoding::encode(workspace)
        )
    }

    fn repositories_url(&self, workspace: &str) -> String {
        format!(
            "{}/repositories/{}/",
            self.settings.api_base(),
            urlencoding::encode(workspace)
        )
    }

    fn profile_href(&self, workspace: &str) -> String {
        format!("{}/{}", self.settings.web_base(), workspace)
    }

    async fn fetch_repositories(
        &self,
        workspace: &str,
        timeout: Duration,
    ) -> Result<Option<RepositoryPage>> {
        let request = self.upstream.get(&self.repositories_url(workspace), timeout);
        self.upstream.fetch_optional(request, "repositories").await
    }

    /// Sum watcher counts across repositories, one request per repository.
    ///
    /// Repositories without a watchers link and non-success responses
    /// contribute zero.
    async fn count_watchers(
        &self,
        repos: &[BitbucketRepository],
        timeout: Duration,
    ) -> Result<u64> {
        let links = repos
            .iter()
            .filter_map(|r| r.links.watchers.as_ref())
            .map(|link| link.href.as_str());

        let results = fan_out(links, self.settings.max_concurrent_requests, |href| {
            let request = self
                .upstream
                .get(href, timeout)
                .query(&[("pagelen", "0")]);
            self.upstream.fetch_enrichment::<WatcherPage>(request)
        })
        .await;

        let mut total = 0;
        for result in results {
            if let Some(page) = result? {
                total += page.size;
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl ProfileSource for BitbucketAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Bitbucket
    }

    async fn fetch_profile(&self, workspace: &str, timeout: Duration) -> Result<ProfileRecord> {
        debug!(service = "bitbucket", workspace = %workspace, "Fetching Bitbucket workspace profile");

        let workspace_url = self.workspace_url(workspace);
        let (metadata, page) = tokio::join!(
            self.upstream.fetch_root(&workspace_url, workspace, timeout),
            self.fetch_repositories(workspace, timeout),
        );
        let metadata = metadata?;
        let page = page?;

        let mut record = ProfileRecord::new(
            self.profile_href(workspace),
            display_name(&metadata, workspace),
        );

        if let Some(page) = page {
            record.public_repos = page.size;
            record.languages = merge_languages(&page.values);
            record.followers = self.count_watchers(&page.values, timeout).await?;

            info!(
                service = "bitbucket",
                workspace = %workspace,
                repositories = page.values.len(),
                followers = record.followers,
                "Bitbucket profile enriched"
            );
        } else {
            info!(service = "bitbucket", workspace = %workspace, "No repository listing, derived fields empty");
        }

        Ok(record.with_metadata(metadata))
    }
}

/// Count repositories per lowercased primary language, skipping null/blank ones
pub fn merge_languages(repos: &[BitbucketRepository]) -> FrequencyMap {
    count_labels(
        repos
            .iter()
            .filter_map(|r| normalize_language(r.language.as_deref())),
    )
}
