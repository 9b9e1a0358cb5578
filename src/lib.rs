// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! API Relay - a prefix-routed reverse proxy for third-party AI and messaging APIs
//!
//! Every inbound path is matched against an ordered table of literal
//! prefixes (`/openai`, `/claude`, `/gemini`, ...).  The first prefix that
//! matches is stripped and the remainder, query string included, is appended
//! to that route's upstream origin.
//!
//! # Core Principles
//!
//! - **Sanitised hops**: client-identifying, edge and hop-by-hop headers never
//!   reach the upstream; upstream CORS headers are replaced by the relay's own
//! - **Streaming**: request and response bodies are passed through, not buffered
//! - **Bounded waits**: one upstream attempt, cut off after `proxy.timeout`
//! - **Fixed failure mapping**: 404 for unknown prefixes, 504 for timeouts,
//!   500 for anything else, with no internal detail in the body
//!
//! # Configuration
//!
//! Zero configuration serves the 21 built-in routes on `127.0.0.1:8080`.
//! Files (JSON, TOML, YAML) and `RELAY_`-prefixed environment variables can
//! override the bind address, timeouts, logging and the route table itself.
//!
//! ```rust,no_run
//! use api_relay::Relay;
//!
//! # async fn run() -> Result<(), api_relay::LoaderError> {
//! let relay = Relay::loader().with_env_vars().build().await?;
//! relay.start().await
//! # }
//! ```

pub mod config;
pub mod core;
pub mod headers;
pub mod loader;
pub mod logging;
pub mod probe;
pub mod router;
pub mod server;

// Re-export key types at the crate root for convenience
pub use config::{Config, ConfigError, ConfigProvider, ConfigProviderExt};
pub use core::{ProxyCore, ProxyError, ProxyRequest, ProxyResponse};
pub use loader::{LoaderError, Relay, RelayLoader};
pub use probe::{ProbeResult, Prober};
pub use router::{Route, RouteMatch, RouteTable};
pub use server::{ProxyServer, RelayHandler, ServerConfig};
