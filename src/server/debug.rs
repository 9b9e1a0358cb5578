// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `/debug` diagnostics: where the request entered and where the relay exits.
//!
//! The outbound half asks an IP lookup service which address our upstream
//! traffic leaves from.  Any failure there yields `null` fields; the
//! endpoint itself always answers.

use std::time::Duration;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// Lookup service used when `debug.lookup` is not configured.
pub const DEFAULT_LOOKUP_URL: &str = "https://ipinfo.io/json";
/// Lookup timeout used when `debug.timeout` is not configured.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of the `/debug` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugInfo {
    /// Inbound `cf-placement` header, if any
    pub placement: Option<String>,
    /// Edge location taken from the inbound `cf-ray` header
    pub entry_colo: Option<String>,
    pub outbound_ip: Option<String>,
    pub outbound_city: Option<String>,
    pub outbound_region: Option<String>,
    pub outbound_country: Option<String>,
}

/// The subset of the lookup service's answer we care about.
#[derive(Debug, Default, Deserialize)]
struct OutboundInfo {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DebugInspector {
    client: reqwest::Client,
    lookup_url: String,
    timeout: Duration,
}

impl DebugInspector {
    pub fn new(client: reqwest::Client, lookup_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            lookup_url: lookup_url.into(),
            timeout,
        }
    }

    /// Create an inspector reading `debug.lookup` and `debug.timeout` (seconds).
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self, ConfigError> {
        let lookup_url: String = config.get_or_default("debug.lookup", DEFAULT_LOOKUP_URL.to_string())?;
        let timeout_secs: u64 =
            config.get_or_default("debug.timeout", DEFAULT_LOOKUP_TIMEOUT.as_secs())?;
        Ok(Self::new(client, lookup_url, Duration::from_secs(timeout_secs)))
    }

    /// Collect diagnostics for a request with the given inbound headers.
    pub async fn inspect(&self, headers: &HeaderMap) -> DebugInfo {
        let outbound = self.lookup().await.unwrap_or_default();

        DebugInfo {
            placement: header_string(headers, "cf-placement"),
            entry_colo: entry_colo(headers),
            outbound_ip: outbound.ip,
            outbound_city: outbound.city,
            outbound_region: outbound.region,
            outbound_country: outbound.country,
        }
    }

    async fn lookup(&self) -> Option<OutboundInfo> {
        let request = async {
            self.client
                .get(&self.lookup_url)
                .timeout(self.timeout)
                .send()
                .await?
                .json::<OutboundInfo>()
                .await
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(info)) => Some(info),
            Ok(Err(e)) => {
                log::debug!("Outbound IP lookup failed: {}", e);
                None
            }
            Err(_) => {
                log::debug!("Outbound IP lookup timed out after {:?}", self.timeout);
                None
            }
        }
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

/// `cf-ray` looks like `8a1b2c3d4e5f6a7b-AMS`; the suffix is the colo.
fn entry_colo(headers: &HeaderMap) -> Option<String> {
    let ray = header_string(headers, "cf-ray")?;
    let (_, colo) = ray.rsplit_once('-')?;
    (!colo.is_empty()).then(|| colo.to_string())
}
