//! Shared upstream HTTP plumbing
//!
//! Owns transport details for every adapter: client construction, auth,
//! per-request timeouts, status and transport error mapping, JSON decoding,
//! and bounded per-repository fan-out.

use crate::config::Credentials;
use crate::profile::SourceKind;
use crate::{ProfileError, Result};
use futures::future::join_all;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("repoprofiles/", env!("CARGO_PKG_VERSION"));

/// HTTP client bound to one upstream source
pub struct UpstreamClient {
    client: Client,
    kind: SourceKind,
    auth: Option<Credentials>,
}

impl UpstreamClient {
    /// Create a client for the given source
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(kind: SourceKind, auth: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .default_headers({
                let mut headers = header::HeaderMap::new();
                headers.insert(
                    header::USER_AGENT,
                    header::HeaderValue::from_static(USER_AGENT),
                );
                headers
            })
            .build()?; // reqwest::Error converts to ProfileError::Http via #[from]

        Ok(Self { client, kind, auth })
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    /// Start a GET request with auth and the per-request timeout applied
    pub fn get(&self, url: &str, timeout: Duration) -> RequestBuilder {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(ref creds) = self.auth {
            request = request.basic_auth(&creds.username, Some(&creds.token));
        }
        request
    }

    /// Send a request, mapping transport faults to upstream failures
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| ProfileError::transport(self.kind, &e))
    }

    /// Read and decode a JSON body
    ///
    /// A body that cannot be decoded is an unrecoverable failure for the call.
    pub async fn json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let body = response
            .bytes()
            .await
            .map_err(|e| ProfileError::transport(self.kind, &e))?;
        serde_json::from_slice(&body).map_err(|e| ProfileError::malformed(self.kind, e))
    }

    /// Look up the root entity (org/workspace)
    ///
    /// 404 becomes `NotFound`; any other non-success status becomes
    /// `Upstream` carrying the status and response body.
    pub async fn fetch_root(
        &self,
        url: &str,
        identifier: &str,
        timeout: Duration,
    ) -> Result<Map<String, Value>> {
        debug!(service = %self.kind, url = %url, "Fetching root entity");

        let response = self.send(self.get(url, timeout)).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ProfileError::NotFound {
                service: self.kind,
                identifier: identifier.to_string(),
            }),
            status if status.is_success() => self.json(response).await,
            status => {
                let error_body = response.text().await.unwrap_or_default();
                Err(ProfileError::upstream(self.kind, status.as_u16(), error_body))
            }
        }
    }

    /// Fetch a resource whose absence only empties derived fields
    ///
    /// Non-success statuses and transport faults yield `Ok(None)`; a success
    /// response with an undecodable body is still an error.
    pub async fn fetch_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<Option<T>> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(service = %self.kind, what = what, error = %e, "Upstream request failed");
                return Ok(None);
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(
                service = %self.kind,
                what = what,
                status = status.as_u16(),
                "Upstream returned non-success status"
            );
            return Ok(None);
        }

        self.json(response).await.map(Some)
    }

    /// Fetch a per-repository enrichment resource
    ///
    /// Non-success statuses are skipped (`Ok(None)`); transport faults and
    /// undecodable bodies fail the call.
    pub async fn fetch_enrichment<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>> {
        let response = self.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                service = %self.kind,
                url = %response.url(),
                status = status.as_u16(),
                "Skipping enrichment response"
            );
            return Ok(None);
        }

        self.json(response).await.map(Some)
    }
}

/// Run one future per item concurrently, optionally capped at `limit` in flight.
///
/// Results come back in item order regardless of completion order. Futures
/// are created eagerly but do no work until polled, so the cap bounds the
/// number of outstanding requests.
pub async fn fan_out<I, F, Fut, T>(items: I, limit: Option<usize>, f: F) -> Vec<T>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T>,
{
    let permits = limit.map(|n| Arc::new(Semaphore::new(n.max(1))));

    let tasks = items.into_iter().map(|item| {
        let permits = permits.clone();
        let task = f(item);
        async move {
            let _permit = match permits {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            task.await
        }
    });

    join_all(tasks).await
}
