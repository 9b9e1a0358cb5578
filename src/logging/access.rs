// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-request access logging.
//!
//! Each inbound request gets a fresh request id that only ever appears in
//! the relay's own logs; it is not added to forwarded headers.

use std::time::Instant;
use uuid::Uuid;

/// Request details captured when the request arrives.
#[derive(Debug, Clone)]
pub struct AccessLog {
    pub request_id: String,
    pub method: String,
    pub path: String,
    pub remote_addr: String,
    started: Instant,
}

impl AccessLog {
    /// Start timing a request and log its arrival at debug level.
    pub fn start(method: &str, path: &str, remote_addr: &str) -> Self {
        let entry = Self {
            request_id: Uuid::new_v4().to_string(),
            method: method.to_string(),
            path: path.to_string(),
            remote_addr: remote_addr.to_string(),
            started: Instant::now(),
        };
        log::debug!(
            "Request received: {} {} from {} (request_id: {})",
            entry.method,
            entry.path,
            entry.remote_addr,
            entry.request_id
        );
        entry
    }

    /// Milliseconds since the request arrived.
    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }

    /// Log completion; server errors at warn, everything else at info.
    pub fn finish(&self, status: u16) {
        let elapsed_ms = self.elapsed_ms();
        if status >= 500 {
            log::warn!(
                "{} {} -> {} in {}ms from {} (request_id: {})",
                self.method, self.path, status, elapsed_ms, self.remote_addr, self.request_id
            );
        } else {
            log::info!(
                "{} {} -> {} in {}ms from {} (request_id: {})",
                self.method, self.path, status, elapsed_ms, self.remote_addr, self.request_id
            );
        }
    }
}
