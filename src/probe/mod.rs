// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Upstream reachability probing.
//!
//! [`Prober::probe_all`] issues one `HEAD` per route, all in parallel, and
//! reassembles the results in route-table order.  A probe never fails the
//! caller: transport errors and timeouts become `ok = false` records.

#[cfg(test)]
mod tests;

use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::config::{Config, ConfigError};
use crate::router::{Route, RouteTable};

/// Probe timeout used when `probe.timeout` is not configured.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of probing one upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Route prefix without the leading `/`
    pub name: String,
    /// Upstream base URL that was probed
    pub target: String,
    /// Answered with a status below 500
    pub ok: bool,
    pub latency_ms: Option<u64>,
    pub status: Option<u16>,
}

impl ProbeResult {
    fn unreachable(name: String, target: String) -> Self {
        Self {
            name,
            target,
            ok: false,
            latency_ms: None,
            status: None,
        }
    }
}

/// Concurrent `HEAD` prober.
#[derive(Debug, Clone)]
pub struct Prober {
    client: reqwest::Client,
    timeout: Duration,
}

impl Prober {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Create a prober reading `probe.timeout` (seconds) from configuration.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self, ConfigError> {
        let timeout_secs: u64 =
            config.get_or_default("probe.timeout", DEFAULT_PROBE_TIMEOUT.as_secs())?;
        Ok(Self::new(client, Duration::from_secs(timeout_secs)))
    }

    /// Probe a single upstream.
    pub async fn probe(&self, route: &Route) -> ProbeResult {
        probe_target(
            self.client.clone(),
            route.name().to_string(),
            route.target.clone(),
            self.timeout,
        )
        .await
    }

    /// Probe every route concurrently; output order matches table order.
    pub async fn probe_all(&self, routes: &RouteTable) -> Vec<ProbeResult> {
        let mut slots: Vec<Option<ProbeResult>> = vec![None; routes.len()];
        let mut join_set = JoinSet::new();

        for (index, route) in routes.routes().iter().enumerate() {
            let client = self.client.clone();
            let name = route.name().to_string();
            let target = route.target.clone();
            let timeout = self.timeout;
            join_set.spawn(async move { (index, probe_target(client, name, target, timeout).await) });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => log::error!("Probe task failed: {}", e),
            }
        }

        // A slot left empty belongs to a probe task that panicked
        routes
            .routes()
            .iter()
            .zip(slots)
            .map(|(route, slot)| {
                slot.unwrap_or_else(|| {
                    ProbeResult::unreachable(route.name().to_string(), route.target.clone())
                })
            })
            .collect()
    }
}

async fn probe_target(
    client: reqwest::Client,
    name: String,
    target: String,
    timeout: Duration,
) -> ProbeResult {
    let start = Instant::now();
    let request = client.head(&target).timeout(timeout).send();

    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(response)) => {
            let status = response.status().as_u16();
            let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            log::trace!("Probe {} -> {} in {}ms", name, status, latency_ms);
            ProbeResult {
                name,
                target,
                ok: status < 500,
                latency_ms: Some(latency_ms),
                status: Some(status),
            }
        }
        Ok(Err(e)) => {
            log::debug!("Probe {} failed: {}", name, e);
            ProbeResult::unreachable(name, target)
        }
        Err(_) => {
            log::debug!("Probe {} timed out after {:?}", name, timeout);
            ProbeResult::unreachable(name, target)
        }
    }
}
