//! HTTP transport and remote endpoints
//!
//! The update protocol needs nothing more than "GET a URL, get status and
//! body". [`HttpTransport`] is that seam; [`UreqTransport`] is the real
//! implementation and tests substitute their own.

use crate::config::schema::{EndpointsConfig, HttpConfig};
use crate::error::{LoaderError, LoaderResult};
use crate::source::SourceIdentity;
use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use tracing::debug;

/// Outbound GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![],
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Status and body of a completed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract "fetch URL, get status + body"
///
/// Non-success statuses come back as responses. Only failures to complete
/// the exchange at all (DNS, TLS, timeout, unreadable body) are errors.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: HttpRequest) -> LoaderResult<HttpResponse>;
}

/// Blocking `ureq` agent driven from the tokio blocking pool
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl UreqTransport {
    pub fn new(config: &HttpConfig) -> Self {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            user_agent: config.user_agent.clone(),
        }
    }

    fn get_blocking(
        agent: &ureq::Agent,
        user_agent: &str,
        request: &HttpRequest,
    ) -> LoaderResult<HttpResponse> {
        let mut builder = agent.get(&request.url).header("User-Agent", user_agent);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .call()
            .map_err(|e| LoaderError::http(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| LoaderError::http(&request.url, e))?;

        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for UreqTransport {
    async fn get(&self, request: HttpRequest) -> LoaderResult<HttpResponse> {
        debug!("GET {}", request.url);
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();

        tokio::task::spawn_blocking(move || Self::get_blocking(&agent, &user_agent, &request))
            .await
            .map_err(|e| LoaderError::Internal(format!("HTTP worker panicked: {}", e)))?
    }
}

/// Bytes left unescaped in a path segment or query value (RFC 3986 unreserved)
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a single path segment or query value
fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Percent-encode a repository path, keeping `/` as the separator
fn encode_path(value: &str) -> String {
    value
        .split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

/// Base URLs of the authoritative API and the CDN mirror
#[derive(Debug, Clone)]
pub struct Endpoints {
    api_base: String,
    cdn_base: String,
    token: Option<String>,
}

impl Endpoints {
    pub fn new(endpoints: &EndpointsConfig, http: &HttpConfig) -> Self {
        Self {
            api_base: endpoints.api_base.trim_end_matches('/').to_string(),
            cdn_base: endpoints.cdn_base.trim_end_matches('/').to_string(),
            token: http.token.clone().filter(|t| !t.is_empty()),
        }
    }

    /// Branch metadata endpoint
    pub fn branch_url(&self, source: &SourceIdentity) -> String {
        format!(
            "{}/repos/{}/{}/branches/{}",
            self.api_base,
            encode_segment(source.owner()),
            encode_segment(source.repo()),
            encode_path(source.branch())
        )
    }

    /// Version-pinned mirror URL, without cache busting
    pub fn cdn_url(&self, source: &SourceIdentity, version: &str) -> String {
        format!(
            "{}/gh/{}/{}@{}/{}",
            self.cdn_base,
            encode_segment(source.owner()),
            encode_segment(source.repo()),
            encode_segment(version),
            encode_path(source.file())
        )
    }

    /// Contents-by-reference endpoint
    pub fn contents_url(&self, source: &SourceIdentity, version: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base,
            encode_segment(source.owner()),
            encode_segment(source.repo()),
            encode_path(source.file()),
            encode_segment(version)
        )
    }

    /// Request to the authoritative API, with JSON accept and optional auth
    pub fn api_request(&self, url: String) -> HttpRequest {
        let request = HttpRequest::get(url).header("Accept", "application/vnd.github+json");
        match &self.token {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new(&EndpointsConfig::default(), &HttpConfig::default())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted transport for component tests

    use super::*;
    use std::sync::Mutex;

    /// Answers requests from a list of (url prefix, outcome) routes and
    /// records every URL it was asked for
    #[derive(Default)]
    pub struct FakeTransport {
        routes: Vec<(String, Option<HttpResponse>)>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond to URLs starting with `prefix`
        pub fn route(mut self, prefix: &str, status: u16, body: &str) -> Self {
            self.routes.push((
                prefix.to_string(),
                Some(HttpResponse {
                    status,
                    body: body.to_string(),
                }),
            ));
            self
        }

        /// Fail URLs starting with `prefix` at the transport level
        pub fn unreachable(mut self, prefix: &str) -> Self {
            self.routes.push((prefix.to_string(), None));
            self
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests().into_iter().map(|r| r.url).collect()
        }
    }

    #[async_trait]
    impl HttpTransport for FakeTransport {
        async fn get(&self, request: HttpRequest) -> LoaderResult<HttpResponse> {
            self.requests.lock().unwrap().push(request.clone());
            let route = self
                .routes
                .iter()
                .find(|(prefix, _)| request.url.starts_with(prefix.as_str()));

            match route {
                Some((_, Some(response))) => Ok(response.clone()),
                Some((_, None)) => Err(LoaderError::http(&request.url, "connection refused")),
                None => Ok(HttpResponse {
                    status: 404,
                    body: String::new(),
                }),
            }
        }
    }
}
