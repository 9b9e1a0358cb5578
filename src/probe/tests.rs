// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::core::build_client;
use crate::probe::{ProbeResult, Prober};
use crate::router::{Route, RouteTable};
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn upstream(status: u16, delay: Duration) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(status).set_delay(delay))
        .mount(&server)
        .await;
    server
}

async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn test_probe_all_keeps_table_order_and_isolates_failures() {
    // The slow upstream finishes last, but must stay first in the output
    let slow = upstream(200, Duration::from_millis(300)).await;
    let client_error = upstream(404, Duration::ZERO).await;
    let server_error = upstream(503, Duration::ZERO).await;
    let dead = closed_port_url().await;

    let routes = RouteTable::new(vec![
        Route::new("/slow", slow.uri()),
        Route::new("/dead", dead.clone()),
        Route::new("/missing", client_error.uri()),
        Route::new("/broken", server_error.uri()),
    ])
    .unwrap();

    let prober = Prober::new(build_client().unwrap(), Duration::from_secs(2));
    let results = prober.probe_all(&routes).await;

    assert_eq!(results.len(), routes.len());
    let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["slow", "dead", "missing", "broken"]);

    assert!(results[0].ok);
    assert_eq!(results[0].status, Some(200));
    assert!(results[0].latency_ms.unwrap() >= 300);
    assert_eq!(results[0].target, slow.uri());

    assert_eq!(
        results[1],
        ProbeResult {
            name: "dead".into(),
            target: dead,
            ok: false,
            latency_ms: None,
            status: None,
        }
    );

    // Reachability, not correctness: a 4xx is still ok
    assert!(results[2].ok);
    assert_eq!(results[2].status, Some(404));

    assert!(!results[3].ok);
    assert_eq!(results[3].status, Some(503));
    assert!(results[3].latency_ms.is_some());
}

#[tokio::test]
async fn test_probe_timeout_is_not_ok() {
    let stalled = upstream(200, Duration::from_secs(3)).await;
    let prober = Prober::new(build_client().unwrap(), Duration::from_millis(200));

    let result = prober.probe(&Route::new("/stalled", stalled.uri())).await;

    assert!(!result.ok);
    assert_eq!(result.latency_ms, None);
    assert_eq!(result.status, None);
    assert_eq!(result.name, "stalled");
}

#[tokio::test]
async fn test_probe_all_empty_table() {
    let prober = Prober::new(build_client().unwrap(), Duration::from_secs(1));
    let routes = RouteTable::new(Vec::new()).unwrap();
    assert!(prober.probe_all(&routes).await.is_empty());
}

#[test]
fn test_probe_result_json_shape() {
    let result = ProbeResult {
        name: "openai".into(),
        target: "https://api.openai.com".into(),
        ok: false,
        latency_ms: None,
        status: None,
    };

    assert_eq!(
        serde_json::to_value(&result).unwrap(),
        serde_json::json!({
            "name": "openai",
            "target": "https://api.openai.com",
            "ok": false,
            "latency_ms": null,
            "status": null
        })
    );
}
