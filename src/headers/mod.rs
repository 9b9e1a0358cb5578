// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Header sanitisation for both directions of the proxy.
//!
//! Outbound, hop-by-hop headers and anything identifying the edge in front
//! of the relay are dropped; everything else, notably every flavour of
//! credential header, is copied untouched.  Inbound, hop-by-hop headers are
//! dropped and the hardening and CORS headers below always win over
//! whatever the upstream sent.


use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Request headers that are never forwarded upstream.
pub const STRIPPED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "cf-connecting-ip",
    "cf-ipcountry",
    "cf-ray",
    "cf-visitor",
    "cf-worker",
    "cf-ew-via",
    "cf-placement",
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-real-ip",
    "connection",
    "upgrade",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
];

/// Upstream response headers that are never relayed to the caller.
pub const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
];

/// Hardening headers set on every relayed response.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
];

/// CORS headers set on every relayed response and on preflight answers.
pub const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "GET, POST, PUT, DELETE, PATCH, OPTIONS"),
    ("access-control-allow-headers", "*"),
    ("access-control-expose-headers", "*"),
    ("access-control-max-age", "86400"),
];

fn is_listed(name: &HeaderName, denylist: &[&str]) -> bool {
    let name = name.as_str();
    denylist.iter().any(|denied| name.eq_ignore_ascii_case(denied))
}

/// Copy every header whose name is not in `denylist`, keeping repeated values.
fn copy_except(source: &HeaderMap, denylist: &[&str]) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        if !is_listed(name, denylist) {
            headers.append(name.clone(), value.clone());
        }
    }
    headers
}

/// Overwrite `headers` with the given static pairs.
fn insert_static(headers: &mut HeaderMap, pairs: &[(&'static str, &'static str)]) {
    for (name, value) in pairs {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

/// Header set sent upstream for an inbound request.
pub fn build_forward_headers(incoming: &HeaderMap) -> HeaderMap {
    copy_except(incoming, STRIPPED_REQUEST_HEADERS)
}

/// Header set relayed to the caller for an upstream response.
pub fn build_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = copy_except(upstream, STRIPPED_RESPONSE_HEADERS);
    insert_static(&mut headers, SECURITY_HEADERS);
    insert_static(&mut headers, CORS_HEADERS);
    headers
}

/// The five CORS headers on their own.
pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(CORS_HEADERS.len());
    insert_static(&mut headers, CORS_HEADERS);
    headers
}
