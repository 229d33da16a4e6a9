//! Content fetching with CDN primary and API fallback
//!
//! The mirror is tried first with a cache-busting query so intermediaries
//! never hand back stale bytes for a version that was just resolved. Only a
//! non-success status from the mirror triggers the contents API, whose body
//! carries the file base64-encoded and line-wrapped.

use crate::error::{LoaderError, LoaderResult};
use crate::http::{Endpoints, HttpRequest, HttpTransport};
use crate::resolver::VersionTag;
use crate::source::SourceIdentity;
use async_trait::async_trait;
use base64::Engine;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-process sequence that keeps cache busters unique within a millisecond
static BUST_SEQ: AtomicU64 = AtomicU64::new(0);

/// Fetches script text pinned to an exact version
///
/// `None` means both paths failed; implementations log why. An empty body
/// from a successful response is valid content.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, source: &SourceIdentity, version: &VersionTag) -> Option<String>;
}

#[derive(Deserialize)]
struct ContentsResponse {
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Fetcher for GitHub-hosted files
pub struct GithubFetcher {
    transport: Arc<dyn HttpTransport>,
    endpoints: Endpoints,
}

impl GithubFetcher {
    pub fn new(transport: Arc<dyn HttpTransport>, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    async fn fetch_code(&self, source: &SourceIdentity, version: &VersionTag) -> LoaderResult<String> {
        let url = cache_busted(
            &self.endpoints.cdn_url(source, version.as_str()),
            version,
            Utc::now().timestamp_millis(),
            BUST_SEQ.fetch_add(1, Ordering::Relaxed),
        );
        let response = self.transport.get(HttpRequest::get(url.clone())).await?;

        if response.is_success() {
            return Ok(response.body);
        }

        info!(
            "CDN returned {} for {}, falling back to contents API",
            response.status, url
        );
        self.fetch_from_api(source, version).await
    }

    async fn fetch_from_api(
        &self,
        source: &SourceIdentity,
        version: &VersionTag,
    ) -> LoaderResult<String> {
        let url = self.endpoints.contents_url(source, version.as_str());
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

        let contents: ContentsResponse = serde_json::from_str(&response.body)?;
        if let Some(encoding) = contents.encoding.as_deref() {
            if encoding != "base64" {
                return Err(LoaderError::Decode(format!(
                    "unsupported content encoding '{}'",
                    encoding
                )));
            }
        }

        decode_content(&contents.content)
    }
}

#[async_trait]
impl ContentFetcher for GithubFetcher {
    async fn fetch(&self, source: &SourceIdentity, version: &VersionTag) -> Option<String> {
        match self.fetch_code(source, version).await {
            Ok(code) => {
                debug!("Fetched {} bytes of {} at {}", code.len(), source, version);
                Some(code)
            }
            Err(e) => {
                let failure = LoaderError::FetchFailed {
                    target: source.to_string(),
                    version: version.to_string(),
                    reason: e.to_string(),
                };
                warn!("{}", failure);
                None
            }
        }
    }
}

/// Append the per-call cache-busting query
fn cache_busted(url: &str, version: &VersionTag, millis: i64, seq: u64) -> String {
    format!(
        "{}?v={}&t={}-{}",
        url,
        utf8_percent_encode(version.as_str(), NON_ALPHANUMERIC),
        millis,
        seq
    )
}

/// Decode line-wrapped base64 into UTF-8 text
fn decode_content(encoded: &str) -> LoaderResult<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| LoaderError::Decode(format!("invalid base64: {}", e)))?;

    String::from_utf8(bytes).map_err(|e| LoaderError::Decode(format!("content is not UTF-8: {}", e)))
}
