// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Static prefix routing.
//!
//! A [`RouteTable`] owns an ordered vector of [`Route`]s.  The first route
//! whose prefix is a literal, byte-wise prefix of the request path wins; the
//! rest of the path is carried along unchanged.  There is no wildcard, regex
//! or longest-match logic, so table order is part of the observable contract.
//!
//! | prefix         | upstream                                   |
//! |----------------|--------------------------------------------|
//! | `/openai`      | `https://api.openai.com`                   |
//! | `/claude`      | `https://api.anthropic.com`                |
//! | `/gemini`      | `https://generativelanguage.googleapis.com`|
//! | …              | see [`DEFAULT_ROUTES`]                     |


use std::collections::HashSet;
use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};

/// The built-in route table, in match order.
pub const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("/openai", "https://api.openai.com"),
    ("/claude", "https://api.anthropic.com"),
    ("/gemini", "https://generativelanguage.googleapis.com"),
    ("/openrouter", "https://openrouter.ai/api"),
    ("/groq", "https://api.groq.com/openai"),
    ("/xai", "https://api.x.ai"),
    ("/mistral", "https://api.mistral.ai"),
    ("/perplexity", "https://api.perplexity.ai"),
    ("/replicate", "https://api.replicate.com"),
    ("/cohere", "https://api.cohere.com"),
    ("/together", "https://api.together.xyz"),
    ("/fireworks", "https://api.fireworks.ai"),
    ("/huggingface", "https://api-inference.huggingface.co"),
    ("/novita", "https://api.novita.ai"),
    ("/portkey", "https://api.portkey.ai"),
    ("/zenmux", "https://zenmux.ai/api"),
    ("/cerebras", "https://api.cerebras.ai"),
    ("/sambanova", "https://api.sambanova.ai"),
    ("/hyperbolic", "https://api.hyperbolic.xyz"),
    ("/discord", "https://discord.com/api"),
    ("/telegram", "https://api.telegram.org"),
];

/// A path prefix bound to an upstream base URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Literal path prefix, always starting with `/`
    pub prefix: String,
    /// Upstream base URL the remainder of the path is appended to
    pub target: String,
}

impl Route {
    /// Create a route from a prefix and an upstream base.
    pub fn new(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            target: target.into(),
        }
    }

    /// Display name of the route: the prefix without its leading `/`.
    pub fn name(&self) -> &str {
        self.prefix.strip_prefix('/').unwrap_or(&self.prefix)
    }
}

/// Result of a successful prefix lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// The route that matched
    pub route: &'a Route,
    /// The request path with the matched prefix removed; may be empty
    pub remainder: &'a str,
}

impl RouteMatch<'_> {
    /// Build the upstream URL: base + remainder + `?query` when the query is non-empty.
    ///
    /// A bare trailing `?` carries no query and is dropped.
    pub fn target_url(&self, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}{}?{}", self.route.target, self.remainder, q),
            None => format!("{}{}", self.route.target, self.remainder),
        }
    }
}

/// Immutable ordered list of routes, built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            routes: DEFAULT_ROUTES
                .iter()
                .map(|(prefix, target)| Route::new(*prefix, *target))
                .collect(),
        }
    }
}

impl RouteTable {
    /// Build a table from explicit routes, rejecting malformed or duplicate prefixes.
    pub fn new(routes: Vec<Route>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        for route in &routes {
            if !route.prefix.starts_with('/') {
                return Err(ConfigError::invalid_route(
                    &route.prefix,
                    "prefix must start with '/'",
                ));
            }
            if route.target.is_empty() {
                return Err(ConfigError::invalid_route(&route.prefix, "target is empty"));
            }
            if !seen.insert(route.prefix.as_str()) {
                return Err(ConfigError::invalid_route(&route.prefix, "duplicate prefix"));
            }
        }
        Ok(Self { routes })
    }

    /// Load the `routes` key, falling back to the built-in table when absent.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        match config.get::<Vec<Route>>("routes")? {
            Some(routes) => {
                log::info!("Loaded {} route(s) from configuration", routes.len());
                Self::new(routes)
            }
            None => Ok(Self::default()),
        }
    }

    /// First route, in declaration order, whose prefix starts `path`.
    pub fn find<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.routes.iter().find_map(|route| {
            path.strip_prefix(route.prefix.as_str())
                .map(|remainder| RouteMatch { route, remainder })
        })
    }

    /// All routes in declaration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
