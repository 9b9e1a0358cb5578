// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Environment variable-based configuration provider.
//!
//! `RELAY_PROXY_TIMEOUT=10` becomes the key `proxy.timeout` with the JSON
//! value `10`.  Values that parse as JSON are taken verbatim, which allows
//! whole structures such as `RELAY_ROUTES='[{"prefix":"/a","target":"…"}]'`.

use std::collections::HashMap;
use std::env;
use serde_json::{Value, json};

use super::ConfigError;
use super::ConfigProvider;

/// Configuration provider backed by a snapshot of the process environment.
#[derive(Debug)]
pub struct EnvConfigProvider {
    prefix: String,
    cache: HashMap<String, String>,
}

impl EnvConfigProvider {
    /// Create a provider for variables starting with `prefix`.
    pub fn new(prefix: &str) -> Self {
        let mut provider = Self {
            prefix: prefix.to_string(),
            cache: HashMap::new(),
        };
        provider.refresh_cache();
        provider
    }

    /// Re-read the process environment.
    pub fn refresh_cache(&mut self) {
        self.cache = env::vars()
            .filter_map(|(key, value)| {
                key.strip_prefix(&self.prefix)
                    .map(|rest| (rest.to_lowercase().replace('_', "."), value))
            })
            .collect();
    }

    fn parse_value(value: &str) -> Value {
        if let Ok(parsed) = serde_json::from_str(value) {
            return parsed;
        }

        if value.eq_ignore_ascii_case("true") {
            return json!(true);
        }
        if value.eq_ignore_ascii_case("false") {
            return json!(false);
        }
        if let Ok(int_val) = value.parse::<i64>() {
            return json!(int_val);
        }
        if let Ok(float_val) = value.parse::<f64>() {
            return json!(float_val);
        }

        json!(value)
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new("RELAY_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn has(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    fn provider_name(&self) -> &str {
        "env"
    }

    fn get_raw(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.cache.get(key).map(|value| Self::parse_value(value)))
    }
}
