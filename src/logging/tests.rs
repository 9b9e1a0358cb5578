// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::logging::access::AccessLog;
use crate::logging::config::LoggingConfig;
use crate::logging::structured::{LogFormat, LoggerConfig, create_logger};
use crate::logging::{init, parse_level};
use log::LevelFilter;
use std::collections::HashMap;

#[test]
fn test_parse_level() {
    assert_eq!(parse_level("TRACE"), Some(LevelFilter::Trace));
    assert_eq!(parse_level("warning"), Some(LevelFilter::Warn));
    assert_eq!(parse_level("off"), Some(LevelFilter::Off));
    assert_eq!(parse_level("verbose"), None);
}

#[test]
fn test_logging_config_defaults_from_empty_object() {
    let config: LoggingConfig = serde_json::from_value(serde_json::json!({})).unwrap();
    assert!(!config.structured);
    assert_eq!(config.format, "terminal");
    assert_eq!(config.level, "info");
    assert!(config.static_fields.is_empty());
}

#[test]
fn test_to_logger_config() {
    let config = LoggingConfig {
        structured: true,
        format: "JSON".to_string(),
        level: "debug".to_string(),
        static_fields: HashMap::from([
            ("service".to_string(), "api-relay".to_string()),
            ("env".to_string(), "test".to_string()),
        ]),
    };

    let logger_config = config.to_logger_config(LevelFilter::Warn);
    assert_eq!(logger_config.format, LogFormat::Json);
    assert_eq!(logger_config.level, slog::Level::Warning);
    // Sorted for stable output
    assert_eq!(
        logger_config.static_fields,
        vec![
            ("env".to_string(), "test".to_string()),
            ("service".to_string(), "api-relay".to_string()),
        ]
    );

    let terminal = LoggingConfig::default().to_logger_config(LevelFilter::Off);
    assert_eq!(terminal.format, LogFormat::Terminal);
    assert_eq!(terminal.level, slog::Level::Error);
}

#[test]
fn test_create_logger_does_not_install_globally() {
    let config = LoggerConfig {
        format: LogFormat::Json,
        level: slog::Level::Info,
        static_fields: vec![("service".to_string(), "api-relay".to_string())],
    };
    let logger = create_logger(&config);
    slog::info!(logger, "structured logger built"; "route" => "openai");
}

#[test]
fn test_init_is_idempotent() {
    init(Some(LevelFilter::Debug));
    init(Some(LevelFilter::Error));
    crate::info_fmt!("Test", "logging initialised {}", 1);
}

#[test]
fn test_access_log_ids_are_unique() {
    let first = AccessLog::start("GET", "/openai/v1/models", "127.0.0.1:50000");
    let second = AccessLog::start("GET", "/openai/v1/models", "127.0.0.1:50000");

    assert_ne!(first.request_id, second.request_id);
    assert_eq!(first.request_id.len(), 36);
    assert_eq!(first.path, "/openai/v1/models");
    first.finish(200);
    second.finish(504);
}
