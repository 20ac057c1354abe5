//! Offline replay of captured viewer requests.
//!
//! This example shows the hook outside the edge runtime:
//! 1. Load the policy (from a TOML file if given, defaults otherwise)
//! 2. Replay captured requests plus a few synthetic ones
//! 3. Print what the edge runtime would receive back
//!
//! Run with: `RUST_LOG=edge_gatekeeper=debug cargo run --example offline_replay [policy.toml]`

use edge_gatekeeper::{Gatekeeper, PolicyConfig};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

const CAPTURED: [(&str, &str); 3] = [
    (
        "viewer from JP fetching media",
        include_str!("../tests/fixtures/viewer_jp_media.json"),
    ),
    (
        "script fetching the index page",
        include_str!("../tests/fixtures/viewer_index_page.json"),
    ),
    (
        "script fetching the site root",
        include_str!("../tests/fixtures/viewer_root.json"),
    ),
];

fn synthetic(uri: &str, country: &str, client_ip: &str) -> Value {
    json!({
        "body": {"action": "read-only", "data": "", "encoding": "base64", "inputTruncated": false},
        "clientIp": client_ip,
        "headers": {
            "host": [{"key": "Host", "value": "k8s.gokates"}],
            "user-agent": [{"key": "User-Agent", "value": "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)"}],
            "cloudfront-viewer-country": [{"key": "CloudFront-Viewer-Country", "value": country}]
        },
        "method": "GET",
        "origin": {"custom": {"domainName": "gokates-io.s3.amazonaws.com"}},
        "querystring": "",
        "uri": uri
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => PolicyConfig::load_from_path(path)?,
        None => PolicyConfig::default(),
    };
    let gatekeeper = Gatekeeper::new(config)?;

    let mut cases: Vec<(&str, Value)> = Vec::new();
    for (label, text) in CAPTURED {
        cases.push((label, serde_json::from_str(text)?));
    }
    cases.push((
        "viewer from RU opening a profile",
        synthetic("/myProfile", "RU", "245.22.245.212"),
    ));
    cases.push((
        "viewer from UK opening personal data",
        synthetic("/myPersonalData", "UK", "245.22.245.212"),
    ));

    for (label, event) in cases {
        println!("\n=== {} ===", label);
        let response = gatekeeper.handle_event(event);
        println!("{}", serde_json::to_string_pretty(&response)?);
    }

    Ok(())
}
