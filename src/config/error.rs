// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the configuration module.

use std::fmt;
use std::io;
use thiserror::Error;

/// Errors that can occur while loading or reading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The requested configuration key was not found.
    #[error("configuration key not found")]
    NotFound,

    /// A value could not be parsed or deserialized.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Reading a configuration file failed.
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    /// A specific provider rejected its source.
    #[error("provider error: {provider}: {message}")]
    ProviderError { provider: String, message: String },

    /// A configured route entry is unusable.
    #[error("invalid route '{prefix}': {reason}")]
    InvalidRoute { prefix: String, reason: String },

    /// A generic error.
    #[error("{0}")]
    Other(String),
}

impl ConfigError {
    /// Create a new provider error.
    pub fn provider_error<P: fmt::Display, M: fmt::Display>(provider: P, message: M) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a new route validation error.
    pub fn invalid_route<P: fmt::Display, R: fmt::Display>(prefix: P, reason: R) -> Self {
        Self::InvalidRoute {
            prefix: prefix.to_string(),
            reason: reason.to_string(),
        }
    }
}
