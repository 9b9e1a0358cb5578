// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal CLI wrapper so the library can run as a stand-alone relay.
//!
//!  Build it with `cargo build --release --bin api-relay`
//!  The binary honours RELAY_CONFIG_FILE; without it the built-in defaults apply.
//!  `RELAY_` environment variables always override file values.

use std::env;
use std::error::Error;
use api_relay::{Relay, error_fmt, info_fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("Starting API relay");

    let mut loader = Relay::loader();
    match env::var("RELAY_CONFIG_FILE") {
        Ok(path) => {
            println!("Using configuration from {path}");
            loader = loader.with_config_file(&path);
        }
        Err(_) => println!("No RELAY_CONFIG_FILE env var found. Using built-in defaults."),
    }
    loader = loader.with_env_vars();

    let relay = match loader.build().await {
        Ok(r) => r,
        Err(e) => {
            println!("Failed to build relay: {e}");
            return Err(e.into());
        }
    };

    match relay.start().await {
        Ok(_) => {
            info_fmt!("Relay", "Server stopped gracefully");
        }
        Err(e) => {
            error_fmt!("Relay", "Server failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}
