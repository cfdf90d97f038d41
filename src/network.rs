//! Network access for the worker
//!
//! Strategies reach the network only through [`Fetcher`], so tests can swap
//! in a scripted network and hosts can pick their own HTTP client. A fetch
//! resolves for any HTTP status; only transport failures are errors, which
//! matches how the browser's `fetch` behaves.

use crate::config::schema::NetworkConfig;
use crate::error::{SwError, SwResult};
use crate::http::{Headers, Method, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Source of network responses
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Perform a request. Errors mean no response was received at all.
    async fn fetch(&self, request: &Request) -> SwResult<Response>;
}

/// Network of a device with no connectivity: every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

#[async_trait]
impl Fetcher for Offline {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        Err(SwError::network(&request.url, "network unavailable (offline)"))
    }
}

/// Blocking `ureq` agent driven from tokio's blocking pool
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpFetcher {
    pub fn new(config: &NetworkConfig) -> Self {
        let mut builder = ureq::Agent::config_builder().http_status_as_error(false);
        if config.timeout_secs > 0 {
            builder = builder.timeout_global(Some(Duration::from_secs(config.timeout_secs)));
        }
        Self {
            agent: builder.build().into(),
            user_agent: config.user_agent.clone(),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> SwResult<Response> {
        Url::parse(&request.url).map_err(|e| SwError::InvalidUrl {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let this = self.clone();
        let request = request.clone();
        let url = request.url.clone();
        let response = tokio::task::spawn_blocking(move || this.fetch_blocking(&request))
            .await
            .map_err(|e| SwError::Internal(format!("fetch task for {url} failed: {e}")))??;

        debug!("{} {}", response.status, url);
        Ok(response)
    }
}

impl HttpFetcher {
    fn fetch_blocking(&self, request: &Request) -> SwResult<Response> {
        let url = request.url.as_str();
        let body = request.body.as_slice();
        let result = match &request.method {
            Method::Get => self.prepare(self.agent.get(url), request).call(),
            Method::Head => self.prepare(self.agent.head(url), request).call(),
            Method::Delete => self.prepare(self.agent.delete(url), request).call(),
            Method::Options => self.prepare(self.agent.options(url), request).call(),
            Method::Post => self.prepare(self.agent.post(url), request).send(body),
            Method::Put => self.prepare(self.agent.put(url), request).send(body),
            Method::Patch => self.prepare(self.agent.patch(url), request).send(body),
            Method::Other(m) => return Err(SwError::UnsupportedMethod(m.clone())),
        };

        let mut response = result.map_err(|e| SwError::network(url, e.to_string()))?;

        let status = response.status();
        let headers: Headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| SwError::network(url, format!("reading body: {e}")))?;

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }

    fn prepare<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        request: &Request,
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if request.headers.get("user-agent").is_none() {
            builder = builder.header("User-Agent", self.user_agent.as_str());
        }
        builder
    }
}
