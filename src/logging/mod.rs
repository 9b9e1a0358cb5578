// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Logging utilities for the relay.
//!
//! All code logs through the `log` facade.  By default records go to
//! `env_logger`; with `proxy.logging.structured = true` they are bridged
//! into a global `slog` logger emitting terminal or JSON output.

pub mod access;
pub mod config;
pub mod structured;
pub mod wrapper;

#[cfg(test)]
mod tests;

use log::{LevelFilter, info};
use once_cell::sync::OnceCell;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};

use config::LoggingConfig;
use structured::LoggerGuard;

static INIT: Once = Once::new();
static USING_STRUCTURED: AtomicBool = AtomicBool::new(false);
static STRUCTURED_GUARD: OnceCell<LoggerGuard> = OnceCell::new();

/// Parse a level name, accepting the usual spellings.
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(LevelFilter::Trace),
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Initialize `env_logger` at the given level unless `RUST_LOG` says otherwise.
///
/// Only the first logging initialisation in a process takes effect.
pub fn init(level: Option<LevelFilter>) {
    INIT.call_once(|| init_env_logger(level.unwrap_or(LevelFilter::Info)));
}

/// Initialize logging from a [`LoggingConfig`].
///
/// `level` is used when the configuration's own level does not parse.
pub fn init_with_config(level: LevelFilter, config: &LoggingConfig) {
    INIT.call_once(|| {
        let level = parse_level(&config.level).unwrap_or(level);

        if !config.structured {
            init_env_logger(level);
            return;
        }

        let guard = structured::init_global_logger(&config.to_logger_config(level));
        let _ = STRUCTURED_GUARD.set(guard);

        match level.to_level() {
            Some(bridge_level) => {
                if let Err(e) = slog_stdlog::init_with_level(bridge_level) {
                    eprintln!("Failed to bridge log records into slog: {e}");
                    return;
                }
            }
            None => log::set_max_level(LevelFilter::Off),
        }

        USING_STRUCTURED.store(true, Ordering::SeqCst);
        info!("Structured logging initialized at level: {}", level);
    });
}

/// Whether the structured (`slog`) backend is active.
pub fn is_structured() -> bool {
    USING_STRUCTURED.load(Ordering::SeqCst)
}

fn init_env_logger(level: LevelFilter) {
    let env = env_logger::Env::default().filter_or("RUST_LOG", level.to_string().to_lowercase());

    let result = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .format_target(true)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", log::max_level());
    }
}
