//! Version resolution
//!
//! Asks the authoritative API for the commit at the tip of the configured
//! branch. One request, no retries.

use crate::error::{LoaderError, LoaderResult};
use crate::http::{Endpoints, HttpTransport};
use crate::source::SourceIdentity;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Opaque identifier of an immutable remote snapshot
///
/// Compared for equality only; there is no ordering between versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves the latest version of a source
///
/// `None` means freshness could not be determined. Implementations log
/// the reason themselves.
#[async_trait]
pub trait VersionResolver: Send + Sync {
    async fn latest_version(&self, source: &SourceIdentity) -> Option<VersionTag>;
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
}

/// Resolver backed by the GitHub branches endpoint
pub struct GithubResolver {
    transport: Arc<dyn HttpTransport>,
    endpoints: Endpoints,
}

impl GithubResolver {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    async fn resolve(&self, source: &SourceIdentity) -> LoaderResult<VersionTag> {
        let url = self.endpoints.branch_url(source);
        let response = self
            .transport
            .get(self.endpoints.api_request(url.clone()))
            .await?;

        if !response.is_success() {
            return Err(LoaderError::Status {
                url,
                status: response.status,
            });
        }

        let branch: BranchResponse = serde_json::from_str(&response.body)?;
        let sha = branch.commit.sha.trim();
        if sha.is_empty() {
            return Err(LoaderError::Decode("branch commit sha is empty".to_string()));
        }

        Ok(VersionTag::new(sha))
    }
}

#[async_trait]
impl VersionResolver for GithubResolver {
    async fn latest_version(&self, source: &SourceIdentity) -> Option<VersionTag> {
        match self.resolve(source).await {
            Ok(version) => {
                debug!("Latest version of {} is {}", source, version);
                Some(version)
            }
            Err(e) => {
                let failure = LoaderError::ResolutionFailed {
                    target: source.to_string(),
                    reason: e.to_string(),
                };
                warn!("{}", failure);
                None
            }
        }
    }
}
