// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! High-level entry-point – "turn the key and go".
//!
//! The [`RelayLoader`] consumes configuration, initialises logging, loads the
//! route table and returns a [`Relay`] whose server is ready to start.


use std::env;
use std::sync::Arc;
use log::LevelFilter;
use thiserror::Error;

use crate::config::{Config, ConfigBuilder, ConfigError, ConfigProvider, EnvConfigProvider, FileConfigProvider};
use crate::core::{ProxyCore, ProxyError, build_client};
use crate::logging::{self, config::LoggingConfig};
use crate::probe::Prober;
use crate::router::RouteTable;
use crate::server::debug::DebugInspector;
use crate::server::{ProxyServer, RelayHandler, ServerConfig};
use crate::{info_fmt, warn_fmt};

/// Errors that can occur while bootstrapping the relay.
#[derive(Error, Debug)]
pub enum LoaderError {
    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Proxy error
    #[error("proxy error: {0}")]
    ProxyError(#[from] ProxyError),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Builder for initializing and configuring the relay.
///
/// Providers are layered file first, then environment, then any added with
/// [`with_provider`](Self::with_provider); later layers win.
#[derive(Debug, Default)]
pub struct RelayLoader {
    config: Option<Config>,
    config_file_path: Option<String>,
    use_env_vars: bool,
    env_prefix: Option<String>,
    custom_providers: ConfigBuilder,
}

impl RelayLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fully built configuration instead of assembling one.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set a configuration file to load.
    pub fn with_config_file(mut self, file_path: &str) -> Self {
        self.config_file_path = Some(file_path.to_string());
        self
    }

    /// Enable environment variable configuration.
    pub fn with_env_vars(mut self) -> Self {
        self.use_env_vars = true;
        self
    }

    /// Set a custom prefix for environment variables (default is "RELAY_").
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.use_env_vars = true;
        self
    }

    /// Add a custom configuration provider.
    pub fn with_provider<P: ConfigProvider + 'static>(mut self, provider: P) -> Self {
        self.custom_providers = self.custom_providers.with_provider(provider);
        self
    }

    /// Build and initialize the relay.
    pub async fn build(self) -> Result<Relay, LoaderError> {
        let config = match self.config {
            Some(config) => config,
            None => {
                let mut builder = Config::builder();

                if let Some(file_path) = &self.config_file_path {
                    builder = builder.with_provider(FileConfigProvider::new(file_path)?);
                }

                if self.use_env_vars {
                    let env_provider = match &self.env_prefix {
                        Some(prefix) => EnvConfigProvider::new(prefix),
                        None => EnvConfigProvider::default(),
                    };
                    builder = builder.with_provider(env_provider);
                }

                builder.merge(self.custom_providers).build()
            }
        };
        let config = Arc::new(config);

        init_logging(&config);
        info_fmt!("Startup", "API relay starting up ({} config provider(s))", config.provider_count());

        let routes = Arc::new(RouteTable::from_config(&config)?);
        info_fmt!("Startup", "Serving {} route(s)", routes.len());

        let client = build_client()?;
        let core = ProxyCore::from_config(&config, client.clone(), routes)?;
        let prober = Prober::from_config(&config, client.clone())?;
        let inspector = DebugInspector::from_config(&config, client)?;

        let server_config = ServerConfig {
            host: config.get_or_default("server.host", ServerConfig::default().host)?,
            port: config.get_or_default("server.port", ServerConfig::default().port)?,
        };

        let handler = RelayHandler::new(core, prober, inspector);
        let server = ProxyServer::new(server_config, Arc::new(handler));

        Ok(Relay { config, server })
    }
}

fn init_logging(config: &Config) {
    let level = env::var("RUST_LOG_LEVEL")
        .ok()
        .and_then(|l| logging::parse_level(&l))
        .unwrap_or(LevelFilter::Info);

    match logging_config(config) {
        Ok(Some(logging_config)) => logging::init_with_config(level, &logging_config),
        Ok(None) => logging::init(Some(level)),
        Err(e) => {
            logging::init(Some(level));
            warn_fmt!("Startup", "Ignoring invalid logging configuration: {}", e);
        }
    }
}

/// Resolve `proxy.logging`, letting leaf keys such as `proxy.logging.format`
/// override the object.  Environment variables only ever supply leaf keys.
fn logging_config(config: &Config) -> Result<Option<LoggingConfig>, ConfigError> {
    let base = config.get::<LoggingConfig>("proxy.logging")?;
    let structured = config.get::<bool>("proxy.logging.structured")?;
    let format = config.get::<String>("proxy.logging.format")?;
    let level = config.get::<String>("proxy.logging.level")?;

    if base.is_none() && structured.is_none() && format.is_none() && level.is_none() {
        return Ok(None);
    }

    let mut resolved = base.unwrap_or_default();
    if let Some(structured) = structured {
        resolved.structured = structured;
    }
    if let Some(format) = format {
        resolved.format = format;
    }
    if let Some(level) = level {
        resolved.level = level;
    }
    Ok(Some(resolved))
}

/// An initialized relay, ready to serve.
#[derive(Debug, Clone)]
pub struct Relay {
    config: Arc<Config>,
    server: ProxyServer,
}

impl Relay {
    /// Create a new loader for initializing the relay.
    pub fn loader() -> RelayLoader {
        RelayLoader::new()
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn server(&self) -> &ProxyServer {
        &self.server
    }

    /// Start the server and run until shutdown is signalled.
    pub async fn start(&self) -> Result<(), LoaderError> {
        self.server.start().await.map_err(LoaderError::ProxyError)
    }
}
