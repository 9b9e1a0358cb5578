// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::debug::DebugInspector;
use super::{ProxyServer, RelayHandler, ServerConfig};
use crate::core::{ProxyCore, build_client};
use crate::probe::{ProbeResult, Prober};
use crate::router::{Route, RouteTable};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A relay running on an ephemeral port.
struct RunningRelay {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RunningRelay {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(5), &mut self.task)
            .await
            .expect("relay did not shut down")
            .unwrap();
    }
}

async fn spawn_relay(routes: Vec<Route>, proxy_timeout: Duration) -> RunningRelay {
    let client = build_client().unwrap();
    let table = Arc::new(RouteTable::new(routes).unwrap());
    let handler = RelayHandler::new(
        ProxyCore::new(client.clone(), table, proxy_timeout),
        Prober::new(client.clone(), Duration::from_secs(2)),
        DebugInspector::new(client, "http://127.0.0.1:1/json", Duration::from_millis(500)),
    );
    let server = ProxyServer::new(ServerConfig::default(), Arc::new(handler));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    RunningRelay { addr, shutdown: Some(tx), task }
}

async fn relay_to(upstream: &MockServer) -> RunningRelay {
    spawn_relay(
        vec![
            Route::new("/openai", upstream.uri()),
            Route::new("/claude", format!("{}/anthropic", upstream.uri())),
        ],
        Duration::from_secs(5),
    )
    .await
}

fn header_str<'a>(resp: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    resp.headers().get(name).and_then(|v| v.to_str().ok())
}

#[test]
fn test_server_config_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);

    let parsed: ServerConfig = serde_json::from_value(serde_json::json!({"port": 9090})).unwrap();
    assert_eq!(parsed.host, "127.0.0.1");
    assert_eq!(parsed.port, 9090);
}

#[tokio::test]
async fn test_preflight_answers_locally() {
    let upstream = MockServer::start().await;
    let relay = relay_to(&upstream).await;

    let resp = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, relay.url("/openai/v1/chat/completions"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 204);
    assert_eq!(header_str(&resp, "access-control-allow-origin"), Some("*"));
    assert_eq!(
        header_str(&resp, "access-control-allow-methods"),
        Some("GET, POST, PUT, DELETE, PATCH, OPTIONS")
    );
    assert_eq!(header_str(&resp, "access-control-max-age"), Some("86400"));
    assert!(resp.bytes().await.unwrap().is_empty());

    // Preflight never reaches the upstream
    assert!(upstream.received_requests().await.unwrap().is_empty());
    relay.stop().await;
}

#[tokio::test]
async fn test_health_and_robots() {
    let upstream = MockServer::start().await;
    let relay = relay_to(&upstream).await;
    let client = reqwest::Client::new();

    let health = client.get(relay.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(header_str(&health, "content-type"), Some("application/json"));
    assert_eq!(header_str(&health, "access-control-allow-origin"), Some("*"));
    assert_eq!(health.text().await.unwrap(), r#"{"status":"ok"}"#);

    let robots = client.get(relay.url("/robots.txt")).send().await.unwrap();
    assert_eq!(robots.status(), 200);
    assert_eq!(header_str(&robots, "content-type"), Some("text/plain"));
    assert!(robots.headers().get("access-control-allow-origin").is_none());
    assert_eq!(robots.text().await.unwrap(), "User-agent: *\nDisallow: /");

    relay.stop().await;
}

#[tokio::test]
async fn test_unknown_prefix_is_not_found() {
    let upstream = MockServer::start().await;
    let relay = relay_to(&upstream).await;

    let resp = reqwest::get(relay.url("/notreal")).await.unwrap();
    assert_eq!(resp.status(), 404);
    assert_eq!(header_str(&resp, "content-type"), Some("text/plain;charset=UTF-8"));
    assert!(resp.headers().get("access-control-allow-origin").is_none());
    assert_eq!(resp.text().await.unwrap(), "Not Found");

    relay.stop().await;
}

#[tokio::test]
async fn test_proxies_matching_prefix() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .and(header("authorization", "Bearer sk-test"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .insert_header("x-request-id", "req_123")
                .insert_header("access-control-allow-origin", "https://evil.com")
                .set_body_string(r#"{"object":"list","data":[]}"#),
        )
        .expect(1)
        .mount(&upstream)
        .await;
    let relay = relay_to(&upstream).await;

    let resp = reqwest::Client::new()
        .get(relay.url("/openai/v1/models"))
        .header("authorization", "Bearer sk-test")
        .header("x-forwarded-for", "203.0.113.9")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(header_str(&resp, "x-request-id"), Some("req_123"));
    assert_eq!(header_str(&resp, "access-control-allow-origin"), Some("*"));
    assert_eq!(header_str(&resp, "x-content-type-options"), Some("nosniff"));
    assert_eq!(header_str(&resp, "x-frame-options"), Some("DENY"));
    assert_eq!(header_str(&resp, "referrer-policy"), Some("no-referrer"));
    assert_eq!(resp.text().await.unwrap(), r#"{"object":"list","data":[]}"#);

    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("x-forwarded-for").is_none());

    relay.stop().await;
}

#[tokio::test]
async fn test_post_body_is_streamed_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/anthropic/v1/messages"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .expect(1)
        .mount(&upstream)
        .await;
    let relay = relay_to(&upstream).await;

    let payload = r#"{"model":"claude","max_tokens":16,"messages":[]}"#;
    let resp = reqwest::Client::new()
        .post(relay.url("/claude/v1/messages"))
        .header("content-type", "application/json")
        .body(payload)
        .send()
        .await
        .unwrap();

    // Upstream statuses are passed through untouched
    assert_eq!(resp.status(), 429);
    assert_eq!(resp.text().await.unwrap(), "slow down");

    let received = upstream.received_requests().await.unwrap();
    assert_eq!(received[0].body, payload.as_bytes());

    relay.stop().await;
}

#[tokio::test]
async fn test_upstream_timeout_is_gateway_timeout() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&upstream)
        .await;
    let relay = spawn_relay(
        vec![Route::new("/openai", upstream.uri())],
        Duration::from_millis(200),
    )
    .await;

    let resp = reqwest::get(relay.url("/openai/v1/models")).await.unwrap();
    assert_eq!(resp.status(), 504);
    assert_eq!(header_str(&resp, "content-type"), Some("text/plain;charset=UTF-8"));
    assert_eq!(resp.text().await.unwrap(), "Gateway Timeout");

    relay.stop().await;
}

#[tokio::test]
async fn test_unreachable_upstream_is_internal_error() {
    let relay = spawn_relay(
        vec![Route::new("/openai", "http://127.0.0.1:1")],
        Duration::from_secs(5),
    )
    .await;

    let resp = reqwest::get(relay.url("/openai/v1/models")).await.unwrap();
    assert_eq!(resp.status(), 500);
    assert_eq!(resp.text().await.unwrap(), "Internal Server Error");

    relay.stop().await;
}

#[tokio::test]
async fn test_status_endpoint_probes_every_route() {
    let upstream = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&upstream)
        .await;
    let relay = relay_to(&upstream).await;

    let resp = reqwest::get(relay.url("/api/status")).await.unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(header_str(&resp, "content-type"), Some("application/json"));

    let results: Vec<ProbeResult> = resp.json().await.unwrap();
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["openai", "claude"]);
    assert!(results.iter().all(|r| r.ok && r.status == Some(404)));

    relay.stop().await;
}

#[tokio::test]
async fn test_debug_endpoint_degrades_to_nulls() {
    let upstream = MockServer::start().await;
    let relay = relay_to(&upstream).await;

    let resp = reqwest::Client::new()
        .get(relay.url("/debug"))
        .header("cf-ray", "8a1b2c3d4e5f6a7b-SIN")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["entry_colo"], "SIN");
    assert!(body["placement"].is_null());
    assert!(body["outbound_ip"].is_null());
    assert!(body["outbound_country"].is_null());

    relay.stop().await;
}

#[tokio::test]
async fn test_dashboard_is_html() {
    let upstream = MockServer::start().await;
    let relay = relay_to(&upstream).await;

    for path in ["/", "/index.html"] {
        let resp = reqwest::get(relay.url(path)).await.unwrap();
        assert_eq!(resp.status(), 200);
        assert_eq!(
            header_str(&resp, "content-type"),
            Some("text/html; charset=utf-8")
        );
        let html = resp.text().await.unwrap();
        assert!(html.contains(&format!("https://{}/openai", relay.addr)));
        assert!(html.contains("2 endpoints available"));
        assert!(html.contains("<select id=\"exampleSelect\""));
        assert!(html.contains(&format!(
            "curl https://{}/claude/v1/messages",
            relay.addr
        )));
    }

    // Reserved paths are exact matches only
    let resp = reqwest::get(relay.url("/health/extra")).await.unwrap();
    assert_eq!(resp.status(), 404);

    relay.stop().await;
}
