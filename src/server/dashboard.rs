// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTML dashboard served at `/` and `/index.html`.
//!
//! One card per route with its public proxy URL and an auth hint, followed by
//! the system endpoints.  Live status and placement are filled in client side
//! from `/api/status` and `/debug`.

use crate::router::{Route, RouteTable};

/// Usage hints shown on a route's card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteDocs {
    pub auth: &'static str,
    pub example_endpoint: &'static str,
    pub note: Option<&'static str>,
}

const fn docs(auth: &'static str, example_endpoint: &'static str) -> RouteDocs {
    RouteDocs { auth, example_endpoint, note: None }
}

const fn noted(auth: &'static str, example_endpoint: &'static str, note: &'static str) -> RouteDocs {
    RouteDocs { auth, example_endpoint, note: Some(note) }
}

const CHAT: &str = "/v1/chat/completions";
const BEARER: &str = "Authorization: Bearer ...";

const ROUTE_DOCS: &[(&str, RouteDocs)] = &[
    ("/openai", docs("Authorization: Bearer sk-...", CHAT)),
    ("/claude", noted(
        "x-api-key: sk-ant-... + anthropic-version: 2023-06-01",
        "/v1/messages",
        "Beta features via anthropic-beta header",
    )),
    ("/gemini", docs(
        "?key=YOUR_KEY (query param)",
        "/v1beta/models/gemini-2.5-flash:generateContent",
    )),
    ("/openrouter", noted(
        "Authorization: Bearer sk-or-...",
        CHAT,
        "Optional: HTTP-Referer, X-Title headers",
    )),
    ("/groq", docs("Authorization: Bearer gsk_...", CHAT)),
    ("/xai", docs("Authorization: Bearer xai-...", CHAT)),
    ("/mistral", docs(BEARER, CHAT)),
    ("/perplexity", docs("Authorization: Bearer pplx-...", "/chat/completions")),
    ("/replicate", docs("Authorization: Token r8_...", "/v1/predictions")),
    ("/cohere", docs(BEARER, "/v2/chat")),
    ("/together", docs(BEARER, CHAT)),
    ("/fireworks", docs(BEARER, "/inference/v1/chat/completions")),
    ("/huggingface", docs("Authorization: Bearer hf_...", "/models/{model_id}")),
    ("/novita", docs(BEARER, "/v3/openai/chat/completions")),
    ("/portkey", docs("Authorization: Bearer ... + x-portkey-api-key", CHAT)),
    ("/zenmux", noted(BEARER, CHAT, "Model format: provider/model-name")),
    ("/cerebras", noted(BEARER, CHAT, "Ultra-fast inference, free 1M tokens/day")),
    ("/sambanova", noted(BEARER, CHAT, "High-speed inference, free tier available")),
    ("/hyperbolic", noted(BEARER, CHAT, "Open-source models (Llama, Qwen, etc.)")),
    ("/discord", docs("Authorization: Bot ...", "/v10/channels/{id}/messages")),
    ("/telegram", docs("Token in URL path", "/bot{token}/sendMessage")),
];

/// Usage hints for a route prefix, if we have any.
pub fn route_docs(prefix: &str) -> Option<&'static RouteDocs> {
    ROUTE_DOCS
        .iter()
        .find(|(p, _)| *p == prefix)
        .map(|(_, docs)| docs)
}

const STYLE: &str = r#"<style>
*{margin:0;padding:0;box-sizing:border-box}
body{background:#0a0a0f;color:#e0e0e0;font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;padding:1.5rem}
.container{max-width:1100px;margin:0 auto}
header{text-align:center;margin-bottom:2rem}
header p,#nodeText{color:#666;font-size:.82rem;margin-top:.3rem}
h2{font-size:.85rem;color:#666;margin:1.8rem 0 .8rem;text-transform:uppercase;letter-spacing:.06em}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(340px,1fr));gap:.8rem}
.card{background:#12121a;border:1px solid #1e1e2e;border-radius:12px;padding:1rem 1.1rem}
.card-head{display:flex;justify-content:space-between;margin-bottom:.5rem}
.card-name{font-weight:600;text-transform:capitalize}
.dot{display:inline-block;width:7px;height:7px;border-radius:50%;background:#eab308}
.dot.ok{background:#22c55e}
.dot.err{background:#ef4444}
.card-url{font-size:.75rem;background:#0d0d14;border-radius:6px;padding:.4rem .6rem;margin-bottom:.4rem;word-break:break-all}
.card-meta{font-size:.7rem;color:#666;line-height:1.5}
.card-note{font-size:.68rem;color:#555;font-style:italic}
code{color:#6c8aff}
.copy-btn{background:none;border:1px solid #1e1e2e;color:#666;border-radius:4px;padding:2px 8px;margin-left:.5rem;cursor:pointer;font-size:.68rem}
.example-block{background:#12121a;border:1px solid #1e1e2e;border-radius:12px;padding:1.1rem}
.example-block select{background:#0a0a0f;color:#e0e0e0;border:1px solid #1e1e2e;border-radius:6px;padding:.3rem .6rem;margin-bottom:.7rem}
.example-block pre{font-size:.75rem;line-height:1.55;white-space:pre-wrap;word-break:break-all;color:#b0b0b0}
ul.card-meta{padding-left:1.2rem}
</style>"#;

const SCRIPT: &str = r#"<script>
function copyText(text, btn) {
  navigator.clipboard.writeText(text).then(() => {
    if (!btn) return;
    const prev = btn.textContent;
    btn.textContent = "Copied!";
    setTimeout(() => btn.textContent = prev, 1200);
  });
}
function updateExample() {
  const selected = document.getElementById("exampleSelect").value;
  for (const pre of document.querySelectorAll(".example-block pre")) {
    pre.hidden = pre.dataset.example !== selected;
  }
}
function copyExample(btn) {
  const pre = document.querySelector(".example-block pre:not([hidden])");
  if (pre) copyText(pre.textContent, btn);
}
updateExample();
fetch("/debug").then(r => r.json()).then(d => {
  const loc = [d.outbound_city, d.outbound_country].filter(Boolean).join(", ");
  document.getElementById("nodeText").textContent = loc ? "Outbound: " + loc : "Node: " + (d.entry_colo || "unknown");
}).catch(() => {
  document.getElementById("nodeText").textContent = "unable to detect";
});
fetch("/api/status").then(r => r.json()).then(data => {
  for (const item of data) {
    const dot = document.getElementById("dot-" + item.name);
    const ms = document.getElementById("ms-" + item.name);
    if (!dot) continue;
    dot.classList.add(item.ok ? "ok" : "err");
    ms.textContent = item.ok ? item.latency_ms + "ms" : "unreachable";
  }
}).catch(() => {});
</script>"#;

const SYSTEM_ENDPOINTS: &[(&str, &str)] = &[
    ("/health", "Returns {\"status\":\"ok\"} for uptime monitoring."),
    ("/api/status", "Probes every upstream (HEAD) and reports name, ok, latency_ms and status."),
    ("/debug", "Entry colo, placement and the outbound IP, city and country of this relay."),
];

/// A ready-to-paste curl call for one provider; `{host}` is substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickStart {
    pub key: &'static str,
    pub label: &'static str,
    pub curl: &'static str,
}

pub const QUICK_START: &[QuickStart] = &[
    QuickStart {
        key: "openai",
        label: "OpenAI",
        curl: r#"curl https://{host}/openai/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer sk-YOUR_KEY" \
  -d '{"model":"gpt-4o","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "claude",
        label: "Claude",
        curl: r#"curl https://{host}/claude/v1/messages \
  -H "Content-Type: application/json" \
  -H "x-api-key: sk-ant-YOUR_KEY" \
  -H "anthropic-version: 2023-06-01" \
  -d '{"model":"claude-sonnet-4-6","max_tokens":1024,"messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "gemini",
        label: "Gemini",
        curl: r#"curl "https://{host}/gemini/v1beta/models/gemini-2.5-flash:generateContent?key=YOUR_KEY" \
  -H "Content-Type: application/json" \
  -d '{"contents":[{"parts":[{"text":"hello"}]}]}'"#,
    },
    QuickStart {
        key: "openrouter",
        label: "OpenRouter",
        curl: r#"curl https://{host}/openrouter/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer sk-or-YOUR_KEY" \
  -d '{"model":"google/gemini-3-flash-preview","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "groq",
        label: "Groq",
        curl: r#"curl https://{host}/groq/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer gsk_YOUR_KEY" \
  -d '{"model":"llama-3.3-70b-versatile","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "mistral",
        label: "Mistral",
        curl: r#"curl https://{host}/mistral/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer YOUR_KEY" \
  -d '{"model":"mistral-large-latest","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "xai",
        label: "xAI",
        curl: r#"curl https://{host}/xai/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer xai-YOUR_KEY" \
  -d '{"model":"grok-3-latest","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "perplexity",
        label: "Perplexity",
        curl: r#"curl https://{host}/perplexity/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer pplx-YOUR_KEY" \
  -d '{"model":"sonar-pro","messages":[{"role":"user","content":"hello"}]}'"#,
    },
    QuickStart {
        key: "zenmux",
        label: "ZenMux",
        curl: r#"curl https://{host}/zenmux/v1/chat/completions \
  -H "Content-Type: application/json" \
  -H "Authorization: Bearer YOUR_KEY" \
  -d '{"model":"openai/gpt-4o","messages":[{"role":"user","content":"hello"}]}'"#,
    },
];

/// Render the dashboard for a client that reached us as `host`.
pub fn render(host: &str, routes: &RouteTable) -> String {
    let mut html = String::with_capacity(24 * 1024);

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\n");
    html.push_str("<title>API Relay</title>\n");
    html.push_str(STYLE);
    html.push_str("\n</head>\n<body>\n<div class=\"container\">\n<header>\n<h1>API Reverse Proxy</h1>\n");
    html.push_str(&format!("<p>{} endpoints available</p>\n", routes.len()));
    html.push_str("<p id=\"nodeText\">detecting...</p>\n</header>\n");

    let host_html = escape_html(host);

    html.push_str("<h2>Endpoints</h2>\n<div class=\"grid\">\n");
    for route in routes.routes() {
        html.push_str(&route_card(&host_html, route));
    }
    html.push_str("</div>\n");

    html.push_str(&quick_start(host));
    html.push_str(&usage(&host_html));

    html.push_str("<h2>System Endpoints</h2>\n<div class=\"grid\">\n");
    for (path, description) in SYSTEM_ENDPOINTS {
        let url = format!("https://{host_html}{path}");
        html.push_str(&format!(
            "<div class=\"card\"><div class=\"card-name\">GET {path}</div>\
             <div class=\"card-url\"><code>{url}</code>{}</div>\
             <div class=\"card-meta\">{}</div></div>\n",
            copy_button(&format!("curl {url}"), "Copy curl"),
            escape_html(description)
        ));
    }
    html.push_str("</div>\n</div>\n");

    html.push_str(SCRIPT);
    html.push_str("\n</body>\n</html>\n");
    html
}

/// A button copying `text`, which must already be HTML-escaped.
fn copy_button(text: &str, label: &str) -> String {
    format!("<button class=\"copy-btn\" data-copy=\"{text}\" onclick=\"copyText(this.dataset.copy,this)\">{label}</button>")
}

fn route_card(host: &str, route: &Route) -> String {
    let name = escape_html(route.name());
    let prefix = escape_html(&route.prefix);
    let proxy_url = format!("https://{host}{prefix}");
    let docs = route_docs(&route.prefix);
    let auth = docs.map(|d| escape_html(d.auth)).unwrap_or_else(|| "-".to_string());
    let endpoint = docs
        .map(|d| escape_html(d.example_endpoint))
        .unwrap_or_else(|| "-".to_string());

    let mut card = format!(
        "<div class=\"card\" data-name=\"{name}\">\n\
         <div class=\"card-head\"><span class=\"card-name\">{name}</span>\
         <span><span class=\"dot\" id=\"dot-{name}\"></span> <span id=\"ms-{name}\">...</span></span></div>\n\
         <div class=\"card-url\"><code>{proxy_url}</code>{}</div>\n\
         <div class=\"card-meta\">Target: {}</div>\n\
         <div class=\"card-meta\">Auth: {auth}</div>\n\
         <div class=\"card-meta\">Endpoint: {endpoint}</div>\n",
        copy_button(&proxy_url, "Copy"),
        escape_html(&route.target)
    );
    if let Some(note) = docs.and_then(|d| d.note) {
        card.push_str(&format!("<div class=\"card-note\">{}</div>\n", escape_html(note)));
    }
    card.push_str("</div>\n");
    card
}

/// Provider picker with one pre-rendered curl call per provider.
fn quick_start(host: &str) -> String {
    let mut block = String::from(
        "<h2>Quick Start</h2>\n<div class=\"example-block\">\n\
         <select id=\"exampleSelect\" onchange=\"updateExample()\">\n",
    );
    for example in QUICK_START {
        block.push_str(&format!(
            "<option value=\"{}\">{}</option>\n",
            example.key, example.label
        ));
    }
    block.push_str("</select>\n<button class=\"copy-btn\" onclick=\"copyExample(this)\">Copy</button>\n");
    for (i, example) in QUICK_START.iter().enumerate() {
        let curl = escape_html(&example.curl.replace("{host}", host));
        let hidden = if i == 0 { "" } else { " hidden" };
        block.push_str(&format!(
            "<pre data-example=\"{}\"{hidden}>{curl}</pre>\n",
            example.key
        ));
    }
    block.push_str("</div>\n");
    block
}

fn usage(host: &str) -> String {
    format!(
        "<h2>Usage</h2>\n<div class=\"card\">\n\
         <div class=\"card-name\">How it works</div>\n\
         <p class=\"card-meta\">Replace the original API base URL with this proxy. All headers \
         (auth, version, beta flags, etc.) are forwarded as-is.</p>\n<ul class=\"card-meta\">\n\
         <li><code>https://api.openai.com</code> &rarr; <code>https://{host}/openai</code></li>\n\
         <li><code>https://api.anthropic.com</code> &rarr; <code>https://{host}/claude</code></li>\n\
         <li>SDK base_url example: <code>base_url=&quot;https://{host}/openai/v1&quot;</code></li>\n\
         </ul>\n<div class=\"card-name\">SDK Examples</div>\n<ul class=\"card-meta\">\n\
         <li>Python (OpenAI SDK): <code>OpenAI(base_url=&quot;https://{host}/openai/v1&quot;)</code></li>\n\
         <li>Python (Anthropic SDK): <code>Anthropic(base_url=&quot;https://{host}/claude&quot;)</code></li>\n\
         <li>Node.js: <code>new OpenAI({{ baseURL: &quot;https://{host}/openai/v1&quot; }})</code></li>\n\
         </ul>\n</div>\n"
    )
}

/// Minimal HTML escaping for text and attribute values.
fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
