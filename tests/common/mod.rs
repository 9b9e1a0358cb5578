// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Common test utilities and helpers for the relay's integration tests.

use api_relay::config::{ConfigError, ConfigProvider};
use api_relay::{Relay, RelayLoader};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Test configuration provider for consistent test setups
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct TestConfigProvider {
    values: HashMap<String, Value>,
    name: String,
}

#[allow(dead_code)]
impl TestConfigProvider {
    /// Provider with short timeouts and an unreachable outbound lookup
    pub fn new(name: &str) -> Self {
        let mut values = HashMap::new();
        values.insert("proxy.timeout".to_string(), json!(5));
        values.insert("probe.timeout".to_string(), json!(2));
        values.insert("debug.lookup".to_string(), json!("http://127.0.0.1:1/json"));
        values.insert("debug.timeout".to_string(), json!(1));

        Self {
            values,
            name: name.to_string(),
        }
    }

    /// Add a configuration value
    pub fn with_value<T: Into<Value>>(mut self, key: &str, value: T) -> Self {
        self.values.insert(key.to_string(), value.into());
        self
    }

    /// Replace the route table with `(prefix, target)` pairs, in order
    pub fn with_routes(mut self, routes: &[(&str, String)]) -> Self {
        let routes: Vec<Value> = routes
            .iter()
            .map(|(prefix, target)| json!({ "prefix": prefix, "target": target }))
            .collect();
        self.values.insert("routes".to_string(), Value::Array(routes));
        self
    }
}

impl ConfigProvider for TestConfigProvider {
    fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }
}

/// A relay serving on an ephemeral local port.
#[allow(dead_code)]
pub struct TestRelay {
    pub addr: SocketAddr,
    pub relay: Relay,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

#[allow(dead_code)]
impl TestRelay {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Signal shutdown and wait for the server loop to drain.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), &mut self.task)
            .await
            .expect("relay did not shut down in time")
            .expect("relay task panicked");
    }
}

/// Build a relay from `loader` and serve it on 127.0.0.1:0.
#[allow(dead_code)]
pub async fn start_relay(loader: RelayLoader) -> TestRelay {
    let relay = loader.build().await.expect("relay should build");

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let server = relay.server().clone();
    let task = tokio::spawn(async move {
        server
            .serve(listener, async {
                let _ = rx.await;
            })
            .await
            .expect("server loop failed");
    });

    TestRelay {
        addr,
        relay,
        shutdown: Some(tx),
        task,
    }
}

/// Relay configured through a single [`TestConfigProvider`].
#[allow(dead_code)]
pub async fn start_with(provider: TestConfigProvider) -> TestRelay {
    start_relay(Relay::loader().with_provider(provider)).await
}
