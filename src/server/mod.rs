// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP server implementation for the relay.
//!
//! The server is a *thin* wrapper around **hyper-util**.  It owns the
//! listening socket, answers the handful of reserved paths itself and hands
//! everything else to [`ProxyCore::forward`].
//!
//! | path                  | answer                                   |
//! |-----------------------|------------------------------------------|
//! | `OPTIONS *`           | 204 with CORS headers                    |
//! | `/`, `/index.html`    | HTML dashboard                           |
//! | `/robots.txt`         | disallow-all                             |
//! | `/health`             | `{"status":"ok"}`                        |
//! | `/debug`              | placement and outbound IP diagnostics    |
//! | `/api/status`         | probe results for every route            |
//! | anything else         | prefix routing                           |
//!
//! Inbound bodies are streamed straight into the upstream connection and
//! upstream bodies straight back; nothing is buffered.

pub mod dashboard;
pub mod debug;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use hyper::body::{Body as HttpBody, Incoming};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use http_body_util::BodyExt;
use log::{debug, error, info, warn};
use reqwest::Body;
use reqwest::header::{CONTENT_TYPE, HOST, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::signal;
use tokio::sync::{RwLock, oneshot};
use tokio::task::{Id, JoinSet};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use crate::core::{ProxyCore, ProxyError, ProxyRequest};
use crate::headers::cors_headers;
use crate::logging::access::AccessLog;
use crate::probe::Prober;
use debug::DebugInspector;

const ROBOTS_TXT: &str = "User-agent: *\nDisallow: /";
const TEXT_PLAIN: &str = "text/plain;charset=UTF-8";
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_secs(30);

/// Configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Answers every inbound request: reserved paths locally, the rest via the core.
#[derive(Debug)]
pub struct RelayHandler {
    core: ProxyCore,
    prober: Prober,
    inspector: DebugInspector,
}

impl RelayHandler {
    pub fn new(core: ProxyCore, prober: Prober, inspector: DebugInspector) -> Self {
        Self { core, prober, inspector }
    }

    pub fn core(&self) -> &ProxyCore {
        &self.core
    }

    /// Dispatch one request.  Never fails; errors become HTTP responses.
    pub async fn handle(&self, req: Request<Incoming>, client_ip: &str) -> Response<Body> {
        let path = req.uri().path().to_owned();
        let access = AccessLog::start(req.method().as_str(), &path, client_ip);

        let response = if req.method() == Method::OPTIONS {
            preflight_response()
        } else {
            match path.as_str() {
                "/" | "/index.html" => {
                    let host = request_host(&req);
                    let html = dashboard::render(&host, self.core.routes());
                    let mut headers = cors_headers();
                    headers.insert(
                        CONTENT_TYPE,
                        HeaderValue::from_static("text/html; charset=utf-8"),
                    );
                    respond(StatusCode::OK, headers, Body::from(html))
                }
                "/robots.txt" => {
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
                    respond(StatusCode::OK, headers, Body::from(ROBOTS_TXT))
                }
                "/health" => json_response(&serde_json::json!({ "status": "ok" })),
                "/debug" => {
                    let info = self.inspector.inspect(req.headers()).await;
                    json_response(&info)
                }
                "/api/status" => {
                    let results = self.prober.probe_all(self.core.routes()).await;
                    json_response(&results)
                }
                _ => self.proxy(req).await,
            }
        };

        access.finish(response.status().as_u16());
        response
    }

    async fn proxy(&self, req: Request<Incoming>) -> Response<Body> {
        let request = convert_hyper_request(req);
        let method = request.method.clone();
        let path = request.path.clone();

        match self.core.forward(request).await {
            Ok(resp) => respond(resp.status, resp.headers, resp.body),
            Err(e) => {
                match &e {
                    ProxyError::NoRouteMatch(_) => {
                        debug!("No route for {} {}", method, path)
                    }
                    ProxyError::GatewayTimeout(d) => {
                        warn!("Request {} {} timed out after {:?}", method, path, d)
                    }
                    _ => error!("Upstream error for {} {}: {}", method, path, e),
                }
                error_response(&e)
            }
        }
    }
}

/// Convert a hyper request into the core's request type, keeping the body streaming.
fn convert_hyper_request(req: Request<Incoming>) -> ProxyRequest {
    let (parts, body) = req.into_parts();

    // A finished body is sent as no body, so GETs are not forwarded chunked
    let body = if body.is_end_stream() {
        None
    } else {
        Some(Body::wrap_stream(body.into_data_stream()))
    };

    log::trace!(
        "Converting request: {} {} with {} headers",
        parts.method,
        parts.uri.path(),
        parts.headers.len()
    );

    ProxyRequest {
        method: parts.method,
        path: parts.uri.path().to_owned(),
        query: parts.uri.query().map(str::to_owned),
        headers: parts.headers,
        body,
    }
}

/// Host the caller used to reach us, for absolute URLs on the dashboard.
fn request_host<B>(req: &Request<B>) -> String {
    req.headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_else(|| "localhost".to_string())
}

fn respond(status: StatusCode, headers: HeaderMap, body: Body) -> Response<Body> {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

fn preflight_response() -> Response<Body> {
    respond(StatusCode::NO_CONTENT, cors_headers(), Body::from(""))
}

fn json_response<T: Serialize>(value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(json) => {
            let mut headers = cors_headers();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            respond(StatusCode::OK, headers, Body::from(json))
        }
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            error_response(&ProxyError::Other(e.to_string()))
        }
    }
}

/// Plain-text response for a proxy error; carries no CORS headers.
fn error_response(err: &ProxyError) -> Response<Body> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(TEXT_PLAIN));
    respond(err.status_code(), headers, Body::from(err.public_message()))
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    #[cfg(unix)]
    let sigterm = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Cannot install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = signal::ctrl_c() => info!("Received Ctrl-C; initiating graceful shutdown"),
        _ = sigterm => info!("Received SIGTERM; initiating graceful shutdown"),
    }
}

/// HTTP server for the relay.
#[derive(Debug, Clone)]
pub struct ProxyServer {
    config: ServerConfig,
    handler: Arc<RelayHandler>,
    /// Shutdown senders for each live connection task
    shutdown_senders: Arc<RwLock<HashMap<Id, oneshot::Sender<()>>>>,
}

impl ProxyServer {
    pub fn new(config: ServerConfig, handler: Arc<RelayHandler>) -> Self {
        Self {
            config,
            handler,
            shutdown_senders: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn handler(&self) -> &RelayHandler {
        &self.handler
    }

    /// Bind the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ProxyError> {
        let addr = format!("{}:{}", self.config.host, self.config.port)
            .parse::<SocketAddr>()
            .map_err(|e| ProxyError::Other(format!("Invalid server address: {e}")))?;

        TcpListener::bind(addr)
            .await
            .map_err(|e| ProxyError::Other(format!("Failed to bind {addr}: {e}")))
    }

    /// Bind and serve until Ctrl-C or SIGTERM.
    pub async fn start(&self) -> Result<(), ProxyError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve connections from `listener` until `shutdown` resolves, then drain.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), ProxyError>
    where
        F: Future<Output = ()>,
    {
        info!("API relay listening on http://{}", listener.local_addr()?);

        tokio::pin!(shutdown);
        let mut join_set = JoinSet::new();

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(joined) = join_set.join_next(), if !join_set.is_empty() => {
                    if let Err(e) = joined {
                        if !e.is_cancelled() {
                            error!("Connection task failed: {}", e);
                        }
                    }
                }
                accept = listener.accept() => {
                    match accept {
                        Ok((stream, remote_addr)) => {
                            let (tx, rx) = oneshot::channel();
                            let handle = join_set.spawn(serve_connection(
                                stream,
                                remote_addr,
                                self.handler.clone(),
                                rx,
                                self.shutdown_senders.clone(),
                            ));
                            self.shutdown_senders.write().await.insert(handle.id(), tx);
                        }
                        Err(e) => error!("Accept error: {}", e),
                    }
                }
            }
        }

        drop(listener);

        {
            let mut senders = self.shutdown_senders.write().await;
            info!("Shutting down; signalling {} connection(s)", senders.len());
            for (_, sender) in senders.drain() {
                let _ = sender.send(());
            }
        }

        let drain = async {
            while let Some(res) = join_set.join_next().await {
                if let Err(e) = res {
                    if !e.is_cancelled() {
                        error!("Connection task failed during shutdown: {}", e);
                    }
                }
            }
        };

        match tokio::time::timeout(SHUTDOWN_GRACE, drain).await {
            Ok(()) => info!("All connections drained gracefully"),
            Err(_) => {
                warn!(
                    "Shutdown timed out after {} seconds, closing remaining connections",
                    SHUTDOWN_GRACE.as_secs()
                );
                join_set.shutdown().await;
            }
        }

        info!("Shutdown complete");
        Ok(())
    }
}

/// Serve one connection, HTTP/1.1 or HTTP/2, until it closes or shutdown is signalled.
async fn serve_connection(
    stream: TcpStream,
    remote_addr: SocketAddr,
    handler: Arc<RelayHandler>,
    shutdown: oneshot::Receiver<()>,
    shutdown_senders: Arc<RwLock<HashMap<Id, oneshot::Sender<()>>>>,
) {
    let client_ip = remote_addr.ip().to_string();
    let service = service_fn(move |req: Request<Incoming>| {
        let handler = handler.clone();
        let client_ip = client_ip.clone();
        async move { Ok::<_, Infallible>(handler.handle(req, &client_ip).await) }
    });

    let builder = AutoBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(stream), service);
    let mut conn = std::pin::pin!(conn);

    let result = tokio::select! {
        res = &mut conn => res,
        _ = shutdown => {
            debug!("Connection from {} received shutdown signal", remote_addr);
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = result {
        let msg = e.to_string();
        if !msg.contains("connection closed") && !msg.contains("connection reset") {
            error!("Connection error from {}: {}", remote_addr, e);
        }
    }

    shutdown_senders.write().await.remove(&tokio::task::id());
}
