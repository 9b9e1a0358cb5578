// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Configuration for logging, read from `proxy.logging`.

use crate::logging::structured::{LogFormat, LoggerConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Route `log` records into slog instead of env_logger
    #[serde(default)]
    pub structured: bool,

    /// `terminal` or `json`; only used when structured
    #[serde(default = "default_format")]
    pub format: String,

    /// Log level
    #[serde(default = "default_level")]
    pub level: String,

    /// Static fields to include in all structured logs
    #[serde(default)]
    pub static_fields: HashMap<String, String>,
}

fn default_format() -> String {
    "terminal".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            structured: false,
            format: default_format(),
            level: default_level(),
            static_fields: HashMap::new(),
        }
    }
}

impl LoggingConfig {
    /// Convert to the slog logger settings at the resolved `level`.
    pub fn to_logger_config(&self, level: LevelFilter) -> LoggerConfig {
        let mut static_fields: Vec<(String, String)> = self
            .static_fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        static_fields.sort();

        LoggerConfig {
            format: match self.format.to_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Terminal,
            },
            level: match level {
                LevelFilter::Trace => slog::Level::Trace,
                LevelFilter::Debug => slog::Level::Debug,
                LevelFilter::Info => slog::Level::Info,
                LevelFilter::Warn => slog::Level::Warning,
                LevelFilter::Error | LevelFilter::Off => slog::Level::Error,
            },
            static_fields,
        }
    }
}
