#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::Result;
use assetbook::config::ResolvedConfig;
use assetbook::market_data::providers::Endpoint;
use tempfile::TempDir;
use wiremock::MockServer;

pub fn endpoint(server: &MockServer, path: &str) -> Endpoint {
    Endpoint::new(reqwest::Client::new(), format!("{}{path}", server.uri()))
}

/// Provider table pointing every source type at `server`.
pub fn providers_toml(server: &MockServer) -> String {
    let uri = server.uri();
    format!(
        r#"
[providers.crypto]
endpoint = "{uri}/v1/ticker?product_code="

[providers.fund_index]
endpoint = "{uri}/fund/"

[providers.stock]
endpoint = "{uri}/stock/"

[providers.gold]
endpoint = "{uri}/gold/bid"
"#
    )
}

/// Writes `assetbook.toml` into a fresh temp dir and loads it, with every
/// source type served by `server`.
pub fn load_config(server: &MockServer, assets_toml: &str) -> Result<(TempDir, ResolvedConfig)> {
    load_config_with(&providers_toml(server), assets_toml)
}

/// Like [`load_config`] but with an explicit provider table.
pub fn load_config_with(providers: &str, assets_toml: &str) -> Result<(TempDir, ResolvedConfig)> {
    let dir = TempDir::new()?;
    let path: PathBuf = dir.path().join("assetbook.toml");
    let content = format!(
        "timezone = \"Asia/Tokyo\"\nfetch_timeout = \"2s\"\n{providers}\n{assets_toml}"
    );
    std::fs::write(&path, content)?;
    let config = ResolvedConfig::load(&path)?;
    Ok((dir, config))
}

/// Body shaped like the gold endpoint: an object whose `data` is a JSON
/// document serialized as a string.
pub fn gold_body(px: &str) -> String {
    let inner = serde_json::json!({ "FGNOK": { "BID": { "px": px } } }).to_string();
    serde_json::json!({ "data": inner }).to_string()
}
