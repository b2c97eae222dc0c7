//! GitHub organization adapter
//!
//! Builds an organization profile from the GitHub REST API: org metadata,
//! the org's repository listing (with topics), and each repository's
//! language breakdown.

use super::upstream::{fan_out, UpstreamClient};
use super::{display_name, normalize_language, ProfileSource};
use crate::config::SourceSettings;
use crate::profile::{count_labels, FrequencyMap, ProfileRecord, SourceKind};
use crate::Result;
use async_trait::async_trait;
use reqwest::header;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;
use tracing::{debug, info};

/// Media type that makes the repository listing include `topics`
const TOPICS_PREVIEW_ACCEPT: &str = "application/vnd.github.mercy-preview+json";

/// Repository entry from `GET /orgs/{org}/repos`
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRepository {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub watchers: u64,
    pub languages_url: String,
}

/// Per-repository language breakdown: language name → bytes/lines of code
pub type LanguageBreakdown = BTreeMap<String, u64>;

/// GitHub API adapter
pub struct GitHubAdapter {
    upstream: UpstreamClient,
    settings: SourceSettings,
}

impl GitHubAdapter {
    /// Create a new GitHub adapter
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(settings: SourceSettings) -> Result<Self> {
        let upstream = UpstreamClient::new(SourceKind::GitHub, settings.auth.clone())?;
        Ok(Self { upstream, settings })
    }

    fn org_url(&self, org: &str) -> String {
        format!(
            "{}/orgs/{}",
            self.settings.api_base(),
            urlencoding::encode(org)
        )
    }

    fn repos_url(&self, org: &str) -> String {
        format!("{}/repos", self.org_url(org))
    }

    fn profile_href(&self, org: &str) -> String {
        format!("{}/{}", self.settings.web_base(), org)
    }

    async fn fetch_repositories(
        &self,
        org: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<GitHubRepository>>> {
        let request = self
            .upstream
            .get(&self.repos_url(org), timeout)
            .header(header::ACCEPT, TOPICS_PREVIEW_ACCEPT);
        self.upstream.fetch_optional(request, "repositories").await
    }

    /// Fetch every repository's language breakdown concurrently
    async fn fetch_language_breakdowns(
        &self,
        repos: &[GitHubRepository],
        timeout: Duration,
    ) -> Result<Vec<LanguageBreakdown>> {
        let results = fan_out(repos, self.settings.max_concurrent_requests, |repo| {
            let request = self.upstream.get(&repo.languages_url, timeout);
            self.upstream.fetch_enrichment::<LanguageBreakdown>(request)
        })
        .await;

        let mut breakdowns = Vec::with_capacity(results.len());
        for result in results {
            if let Some(breakdown) = result? {
                breakdowns.push(breakdown);
            }
        }
        Ok(breakdowns)
    }
}

#[async_trait]
impl ProfileSource for GitHubAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::GitHub
    }

    async fn fetch_profile(&self, org: &str, timeout: Duration) -> Result<ProfileRecord> {
        debug!(service = "github", org = %org, "Fetching GitHub organization profile");

        let org_url = self.org_url(org);
        let (metadata, repositories) = tokio::join!(
            self.upstream.fetch_root(&org_url, org, timeout),
            self.fetch_repositories(org, timeout),
        );
        let metadata = metadata?;
        let repositories = repositories?;

        let mut record = ProfileRecord::new(self.profile_href(org), display_name(&metadata, org));
        record.public_repos = metadata
            .get("public_repos")
            .and_then(|v| v.as_u64())
            .unwrap_or(0);

        match repositories {
            Some(repos) => {
                let breakdowns = self.fetch_language_breakdowns(&repos, timeout).await?;
                let (languages, language_locs) = merge_language_breakdowns(&breakdowns);

                record.languages = languages;
                record.language_locs = Some(language_locs);
                record.followers = merge_watchers(&repos);
                record.topics = merge_topics(&repos);

                info!(
                    service = "github",
                    org = %org,
                    repositories = repos.len(),
                    languages = record.languages.len(),
                    "GitHub profile enriched"
                );
            }
            None => {
                info!(service = "github", org = %org, "No repository listing, derived fields empty");
            }
        }

        Ok(record.with_metadata(metadata))
    }
}

/// Fold language breakdowns into (repositories per language, lines per language).
///
/// Language names are lowercased; a repository counts once per language even
/// if its breakdown lists the same language under different casings.
pub fn merge_language_breakdowns(breakdowns: &[LanguageBreakdown]) -> (FrequencyMap, FrequencyMap) {
    let mut counts = FrequencyMap::new();
    let mut locs = FrequencyMap::new();

    for breakdown in breakdowns {
        let mut seen = BTreeSet::new();
        for (name, lines) in breakdown {
            let Some(language) = normalize_language(Some(name)) else {
                continue;
            };
            *locs.entry(language.clone()).or_insert(0) += lines;
            seen.insert(language);
        }
        for language in seen {
            *counts.entry(language).or_insert(0) += 1;
        }
    }

    (counts, locs)
}

/// Count repositories per topic tag (tags are kept as-is)
pub fn merge_topics(repos: &[GitHubRepository]) -> FrequencyMap {
    count_labels(repos.iter().flat_map(|r| r.topics.iter().cloned()))
}

/// Sum the watcher counts reported in the listing
pub fn merge_watchers(repos: &[GitHubRepository]) -> u64 {
    repos.iter().map(|r| r.watchers).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    fn repo(topics: &[&str], watchers: u64) -> GitHubRepository {
        GitHubRepository {
            name: Some("repo".to_string()),
            language: Some("Go".to_string()),
            topics: topics.iter().map(|t| t.to_string()).collect(),
            watchers,
            languages_url: "https://api.github.com/repos/acme/repo/languages".to_string(),
        }
    }

    fn breakdown(entries: &[(&str, u64)]) -> LanguageBreakdown {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_adapter_urls() {
        let mut config = GatewayConfig::new();
        config.github.api_url = "https://github.example.com/api/v3/".to_string();
        let adapter = GitHubAdapter::new(config.source(SourceKind::GitHub)).unwrap();

        assert_eq!(
            adapter.org_url("acme"),
            "https://github.example.com/api/v3/orgs/acme"
        );
        assert_eq!(
            adapter.repos_url("acme corp"),
            "https://github.example.com/api/v3/orgs/acme%20corp/repos"
        );
        assert_eq!(adapter.profile_href("acme"), "https://github.com/acme");
    }

    #[test]
    fn test_merge_language_breakdowns() {
        let breakdowns = vec![
            breakdown(&[("Go", 1000), ("Shell", 20)]),
            breakdown(&[("Go", 500)]),
            breakdown(&[("Kotlin", 42)]),
        ];

        let (counts, locs) = merge_language_breakdowns(&breakdowns);

        assert_eq!(counts.get("go"), Some(&2));
        assert_eq!(counts.get("shell"), Some(&1));
        assert_eq!(counts.get("kotlin"), Some(&1));
        assert_eq!(locs.get("go"), Some(&1500));
        assert_eq!(locs.get("shell"), Some(&20));
        assert!(counts.get("Go").is_none());
    }

    #[test]
    fn test_breakdown_casing_counts_repo_once() {
        let (counts, locs) = merge_language_breakdowns(&[breakdown(&[("Go", 10), ("GO", 5)])]);
        assert_eq!(counts.get("go"), Some(&1));
        assert_eq!(locs.get("go"), Some(&15));
    }

    #[test]
    fn test_merge_topics_and_watchers() {
        let repos = vec![
            repo(&["cli", "email-marketing"], 4),
            repo(&["cli"], 6),
            repo(&[], 0),
        ];

        let topics = merge_topics(&repos);
        assert_eq!(topics.get("cli"), Some(&2));
        assert_eq!(topics.get("email-marketing"), Some(&1));
        assert_eq!(merge_watchers(&repos), 10);
    }

    #[test]
    fn test_repository_deserializes_without_optional_fields() {
        let repo: GitHubRepository = serde_json::from_str(
            r#"{"languages_url": "https://api.github.com/repos/acme/x/languages"}"#,
        )
        .unwrap();
        assert!(repo.language.is_none());
        assert!(repo.topics.is_empty());
        assert_eq!(repo.watchers, 0);
    }
}
