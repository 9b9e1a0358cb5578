// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core primitives – requests, responses, errors & forwarding.
//!
//! Everything that physically moves through the proxy pipeline is defined
//! in this module.  Socket handling sits in `server` and the header rules in
//! `headers`; [`ProxyCore::forward`] glues route lookup, header
//! sanitisation and the single upstream attempt together.


use std::sync::Arc;
use std::time::{Duration, Instant};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tokio::time::timeout;

use crate::config::{Config, ConfigError};
use crate::headers::{build_forward_headers, build_response_headers};
use crate::router::RouteTable;

/// Upstream timeout used when `proxy.timeout` is not configured.
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can occur during proxy operations.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// No configured prefix matches the request path
    #[error("no route matches '{0}'")]
    NoRouteMatch(String),

    /// The upstream did not answer within the configured timeout
    #[error("upstream timed out after {0:?}")]
    GatewayTimeout(Duration),

    /// Any other transport failure talking to the upstream
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ProxyError {
    /// Classify a failed upstream call.
    pub fn from_upstream(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            ProxyError::GatewayTimeout(limit)
        } else {
            ProxyError::UpstreamUnreachable(err)
        }
    }

    /// HTTP status the error is surfaced as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::NoRouteMatch(_) => StatusCode::NOT_FOUND,
            ProxyError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed plain-text body the error is surfaced with.  Never leaks details.
    pub fn public_message(&self) -> &'static str {
        match self {
            ProxyError::NoRouteMatch(_) => "Not Found",
            ProxyError::GatewayTimeout(_) => "Gateway Timeout",
            _ => "Internal Server Error",
        }
    }
}

/// An inbound request handed to the forwarding engine.
#[derive(Debug)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    /// Raw query string without the leading `?`; `None` when the URI had no `?`
    pub query: Option<String>,
    pub headers: HeaderMap,
    /// Streaming request body; `None` when the caller sent none
    pub body: Option<reqwest::Body>,
}

impl ProxyRequest {
    /// A request without a body.
    pub fn new(method: Method, path: impl Into<String>, query: Option<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query,
            headers: HeaderMap::new(),
            body: None,
        }
    }
}

/// An upstream response ready to be relayed.
#[derive(Debug)]
pub struct ProxyResponse {
    pub status: StatusCode,
    /// Already sanitised, see [`build_response_headers`]
    pub headers: HeaderMap,
    pub body: reqwest::Body,
}

/// Build the outbound HTTP client shared by forwarding, probing and diagnostics.
pub fn build_client() -> Result<reqwest::Client, ProxyError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| ProxyError::Other(format!("failed to build HTTP client: {e}")))
}

/// The forwarding engine.
#[derive(Debug, Clone)]
pub struct ProxyCore {
    client: reqwest::Client,
    routes: Arc<RouteTable>,
    timeout: Duration,
}

impl ProxyCore {
    /// Create a forwarding engine over `routes` with the given upstream timeout.
    pub fn new(client: reqwest::Client, routes: Arc<RouteTable>, timeout: Duration) -> Self {
        Self { client, routes, timeout }
    }

    /// Create a forwarding engine reading `proxy.timeout` (seconds) from configuration.
    pub fn from_config(
        config: &Config,
        client: reqwest::Client,
        routes: Arc<RouteTable>,
    ) -> Result<Self, ProxyError> {
        let timeout_secs: u64 =
            config.get_or_default("proxy.timeout", DEFAULT_UPSTREAM_TIMEOUT.as_secs())?;
        Ok(Self::new(client, routes, Duration::from_secs(timeout_secs)))
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Forward a request to the upstream its path resolves to.
    ///
    /// Exactly one upstream attempt is made.  The request body and the
    /// upstream response body are streamed, never buffered.
    pub async fn forward(&self, request: ProxyRequest) -> Result<ProxyResponse, ProxyError> {
        let overall_start = Instant::now();

        let ProxyRequest { method, path, query, headers, body } = request;

        let url = match self.routes.find(&path) {
            Some(matched) => matched.target_url(query.as_deref()),
            None => return Err(ProxyError::NoRouteMatch(path)),
        };

        /* ---------- build outbound req ---------- */
        let mut builder = self
            .client
            .request(method.clone(), &url)
            .headers(build_forward_headers(&headers))
            .timeout(self.timeout);

        if let Some(body) = body {
            builder = builder.body(body);
        }

        /* ---------- send with timeout ---------- */
        let upstream_start = Instant::now();
        let resp = timeout(self.timeout, builder.send())
            .await
            .map_err(|_| ProxyError::GatewayTimeout(self.timeout))?
            .map_err(|e| ProxyError::from_upstream(e, self.timeout))?;
        let upstream_elapsed = upstream_start.elapsed();

        /* ---------- wrap streaming response ---------- */
        let status = resp.status();
        let headers = build_response_headers(resp.headers());
        let body = reqwest::Body::wrap_stream(resp.bytes_stream());

        // The URL is not logged: some upstreams take their API key in the query
        log::debug!(
            "[timing] {} {} -> {} | total={:?} upstream={:?}",
            method,
            path,
            status.as_u16(),
            overall_start.elapsed(),
            upstream_elapsed,
        );

        Ok(ProxyResponse { status, headers, body })
    }
}
