// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Context-tagged logging macros.
//!
//! They expand to the `log` facade with a `[context]` tag in front of the
//! message, so they work with either logging backend:
//!
//! ```rust,no_run
//! api_relay::info_fmt!("Startup", "listening on {}", "127.0.0.1:8080");
//! ```

/// Log at an explicit `log::Level` with a context tag.
#[macro_export]
macro_rules! log_fmt {
    ($level:expr, $context:expr, $($arg:tt)+) => {
        log::log!($level, "[{}] {}", $context, format_args!($($arg)+))
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! error_fmt {
    ($context:expr, $($arg:tt)+) => {
        $crate::log_fmt!(log::Level::Error, $context, $($arg)+)
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! warn_fmt {
    ($context:expr, $($arg:tt)+) => {
        $crate::log_fmt!(log::Level::Warn, $context, $($arg)+)
    };
}

/// Log an info message with context.
#[macro_export]
macro_rules! info_fmt {
    ($context:expr, $($arg:tt)+) => {
        $crate::log_fmt!(log::Level::Info, $context, $($arg)+)
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! debug_fmt {
    ($context:expr, $($arg:tt)+) => {
        $crate::log_fmt!(log::Level::Debug, $context, $($arg)+)
    };
}

/// Log a trace message with context.
#[macro_export]
macro_rules! trace_fmt {
    ($context:expr, $($arg:tt)+) => {
        $crate::log_fmt!(log::Level::Trace, $context, $($arg)+)
    };
}
