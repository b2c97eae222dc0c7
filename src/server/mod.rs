//! HTTP boundary for RepoProfiles
//!
//! # Routes
//!
//! - `GET /health-check` - Liveness probe
//! - `GET /github/{org}` - GitHub organization profile
//! - `GET /bitbucket/{workspace}` - Bitbucket workspace profile
//! - `GET /merged-profiles?github=..&bitbucket=..` - Merged profile across sources
//!
//! Profile routes return the public profile shape unless `?extended=<anything>`
//! is given, in which case the full enriched record is returned.
//!
//! # Example
//!
//! ```no_run
//! use repoprofiles::aggregator::Aggregator;
//! use repoprofiles::config::GatewayConfig;
//! use repoprofiles::server::ProfileServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GatewayConfig::new();
//!     let aggregator = Aggregator::from_config(&config).expect("Failed to build sources");
//!
//!     ProfileServer::new(aggregator)
//!         .run(&config.server.bind)
//!         .await
//!         .expect("Server failed");
//! }
//! ```

use crate::aggregator::{parse_requests, Aggregator};
use crate::profile::{Normalize, SourceKind};
use crate::ProfileError;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

/// Content type of single-source profile responses
pub const PROFILE_MIMETYPE: &str = "application/vnd+divvydose.repo-profile+json";

/// Content type of merged-profile responses
pub const MERGED_PROFILE_MIMETYPE: &str = "application/vnd+divvydose.repo-profile-merged+json";

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bind error: {0}")]
    Bind(String),
}

/// Shared server state
struct AppState {
    aggregator: Aggregator,
}

/// HTTP server exposing profile lookups
pub struct ProfileServer {
    state: Arc<AppState>,
}

impl ProfileServer {
    pub fn new(aggregator: Aggregator) -> Self {
        Self {
            state: Arc::new(AppState { aggregator }),
        }
    }

    /// Build the router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/health-check", get(health_check))
            .route("/github/{org}", get(github_profile))
            .route("/bitbucket/{workspace}", get(bitbucket_profile))
            .route("/merged-profiles", get(merged_profiles))
            .with_state(self.state.clone())
    }

    /// Run the server on the given address
    pub async fn run(self, addr: &str) -> Result<(), ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        tracing::info!(
            addr = addr,
            timeout_secs = self.state.aggregator.timeout().as_secs_f64(),
            "Profile server listening"
        );

        axum::serve(listener, self.router())
            .await
            .map_err(ServerError::Io)
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

/// Map a profile error onto an HTTP status and JSON body
fn error_response(err: ProfileError) -> HandlerError {
    let status = match err {
        ProfileError::NotFound { .. } => StatusCode::NOT_FOUND,
        ProfileError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Query parameters for single-source profile routes
#[derive(Debug, Default, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub extended: Option<String>,
}

impl ProfileQuery {
    fn is_extended(&self) -> bool {
        self.extended.as_deref().is_some_and(|v| !v.is_empty())
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    tracing::info!("Health check");
    "All Good!"
}

async fn github_profile(
    State(state): State<Arc<AppState>>,
    Path(org): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, HandlerError> {
    profile_response(&state, SourceKind::GitHub, &org, &query).await
}

async fn bitbucket_profile(
    State(state): State<Arc<AppState>>,
    Path(workspace): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Response, HandlerError> {
    profile_response(&state, SourceKind::Bitbucket, &workspace, &query).await
}

async fn profile_response(
    state: &AppState,
    kind: SourceKind,
    identifier: &str,
    query: &ProfileQuery,
) -> Result<Response, HandlerError> {
    let record = state
        .aggregator
        .fetch(kind, identifier)
        .await
        .map_err(error_response)?;

    let body = if query.is_extended() {
        Json(record).into_response()
    } else {
        Json(record.normalize()).into_response()
    };

    Ok(([(header::CONTENT_TYPE, PROFILE_MIMETYPE)], body).into_response())
}

async fn merged_profiles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, HandlerError> {
    let requests = parse_requests(&params).map_err(error_response)?;
    let aggregation = state
        .aggregator
        .aggregate(&requests)
        .await
        .map_err(error_response)?;

    Ok((
        [(header::CONTENT_TYPE, MERGED_PROFILE_MIMETYPE)],
        Json(aggregation),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::testing::{bitbucket_record, github_record, stub, Behavior};
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn create_test_server(github: Behavior, bitbucket: Behavior) -> ProfileServer {
        let aggregator = Aggregator::new(Duration::from_secs(2))
            .with_source(stub(SourceKind::GitHub, github))
            .with_source(stub(SourceKind::Bitbucket, bitbucket));
        ProfileServer::new(aggregator)
    }

    fn healthy_server() -> ProfileServer {
        let mut github = github_record();
        github.language_locs = Some([("go".to_string(), 1200)].into_iter().collect());
        create_test_server(
            Behavior::Profile(github),
            Behavior::Profile(bitbucket_record()),
        )
    }

    async fn get(server: &ProfileServer, uri: &str) -> Response {
        server
            .router()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = get(&healthy_server(), "/health-check").await;

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"All Good!");
    }

    #[tokio::test]
    async fn test_profile_returns_public_shape() {
        let response = get(&healthy_server(), "/github/acme").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), PROFILE_MIMETYPE);

        let body = body_json(response).await;
        assert_eq!(body["href"], "https://github.com/acme");
        assert_eq!(body["languages"], json!({"go": 2, "rust": 1}));
        assert_eq!(body["topics"], json!({}));
        assert!(body.get("language_locs").is_none());
    }

    #[tokio::test]
    async fn test_extended_profile_includes_record_details() {
        let response = get(&healthy_server(), "/github/acme?extended=1").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["language_locs"], json!({"go": 1200}));
    }

    #[tokio::test]
    async fn test_empty_extended_flag_is_ignored() {
        let body = body_json(get(&healthy_server(), "/github/acme?extended=").await).await;
        assert!(body.get("language_locs").is_none());
    }

    #[tokio::test]
    async fn test_unknown_org_is_not_found() {
        let server = create_test_server(Behavior::NotFound, Behavior::Profile(bitbucket_record()));
        let response = get(&server, "/github/ghost").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unknown organization on github: ghost");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let server = create_test_server(Behavior::Profile(github_record()), Behavior::Upstream(503));
        let response = get(&server, "/bitbucket/acme").await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("HTTP 503"));
    }

    #[tokio::test]
    async fn test_merged_profiles() {
        let response = get(&healthy_server(), "/merged-profiles?github=acme&bitbucket=acme").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(content_type(&response), MERGED_PROFILE_MIMETYPE);

        let body = body_json(response).await;
        assert_eq!(
            body["__merged__"],
            json!({
                "public_repos": 5,
                "followers": 15,
                "languages": {"go": 3, "rust": 1},
                "topics": {"cli": 1}
            })
        );
        assert_eq!(body["github"]["name"], "Acme");
        assert!(body.get("__errors__").is_none());
    }

    #[tokio::test]
    async fn test_merged_profiles_reports_upstream_errors() {
        let server = create_test_server(Behavior::Profile(github_record()), Behavior::Upstream(500));
        let response = get(&server, "/merged-profiles?github=acme&bitbucket=acme").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["bitbucket"], Value::Null);
        assert_eq!(body["__errors__"]["bitbucket"]["status_code"], 500);
        assert_eq!(body["__merged__"]["public_repos"], 3);
    }

    #[tokio::test]
    async fn test_merged_profiles_not_found() {
        let server = create_test_server(Behavior::Profile(github_record()), Behavior::NotFound);
        let response = get(&server, "/merged-profiles?github=acme&bitbucket=ghost").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unknown organization on bitbucket: ghost");
    }

    #[tokio::test]
    async fn test_merged_profiles_requires_a_source() {
        let response = get(&healthy_server(), "/merged-profiles?gitlab=acme").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "missing query string parameters: ['bitbucket', 'github']"
        );
    }
}
