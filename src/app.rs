//! Wiring between configuration, the valuation engine and the projectors.

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::clock::{Clock, SystemClock};
use crate::config::ResolvedConfig;
use crate::format::NumberFormat;
use crate::market_data::SourceRouter;
use crate::portfolio::{Valuation, ValuationEngine};
use crate::report::{
    ChatProjector, DatastoreProjector, DocumentProjector, JsonProjector, ResultProjector, Sink,
};

const USER_AGENT: &str = concat!("assetbook/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client(config: &ResolvedConfig) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.fetch_timeout)
        .build()
        .context("Failed to build HTTP client")
}

pub fn build_router(config: &ResolvedConfig, client: &Client) -> SourceRouter {
    SourceRouter::from_config(&config.providers, client)
}

pub fn build_engine(config: &ResolvedConfig) -> Result<ValuationEngine> {
    build_engine_with_clock(config, Arc::new(SystemClock))
}

pub fn build_engine_with_clock(
    config: &ResolvedConfig,
    clock: Arc<dyn Clock>,
) -> Result<ValuationEngine> {
    let client = build_http_client(config)?;
    Ok(ValuationEngine::new(build_router(config, &client))
        .with_fetch_timeout(Some(config.fetch_timeout))
        .with_clock(clock))
}

/// One valuation run over every configured asset.
pub async fn run_valuation(config: &ResolvedConfig) -> Result<Valuation> {
    let engine = build_engine(config)?;
    Ok(engine.valuate(&config.assets).await?)
}

pub fn projector_for(sink: Sink, config: &ResolvedConfig) -> Box<dyn ResultProjector> {
    let numbers = NumberFormat::from(&config.display);
    match sink {
        Sink::Document => Box::new(DocumentProjector::new(config.timezone, numbers)),
        Sink::Chat => Box::new(ChatProjector::new(config.timezone, numbers)),
        Sink::Datastore => Box::new(DatastoreProjector::new(config.timezone)),
        Sink::Json => Box::new(JsonProjector),
    }
}

/// How each configured asset routes, for display.
pub fn describe_routes(config: &ResolvedConfig, router: &SourceRouter) -> Vec<(String, String)> {
    config
        .assets
        .iter()
        .map(|asset| {
            let route = match router.resolve(asset) {
                Ok(source) => match (asset.source_type(), asset.code.as_deref()) {
                    (Ok(t), None) if t.requires_code() => {
                        format!("{} (missing code)", source.name())
                    }
                    (_, Some(code)) => format!("{} [{code}]", source.name()),
                    _ => source.name().to_string(),
                },
                Err(err) => format!("unroutable: {err}"),
            };
            (asset.name.clone(), route)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DisplayConfig, ProviderConfig, ProvidersConfig};
    use crate::models::{Asset, SourceType};
    use rust_decimal_macros::dec;

    fn config(assets: Vec<Asset>) -> ResolvedConfig {
        ResolvedConfig {
            timezone: chrono_tz::Asia::Tokyo,
            fetch_timeout: std::time::Duration::from_secs(1),
            display: DisplayConfig::default(),
            providers: ProvidersConfig {
                gold: Some(ProviderConfig {
                    endpoint: "http://127.0.0.1:9/gold".to_string(),
                    api_key: None,
                }),
                ..ProvidersConfig::default()
            },
            assets,
        }
    }

    #[test]
    fn describes_each_route() -> Result<()> {
        let config = config(vec![
            Asset::new("Gold", SourceType::Gold, dec!(1), dec!(1)),
            Asset::new("Coin", SourceType::Crypto, dec!(1), dec!(1)).with_code("BTC_JPY"),
        ]);
        let client = build_http_client(&config)?;
        let router = build_router(&config, &client);

        let routes = describe_routes(&config, &router);
        assert_eq!(routes[0], ("Gold".to_string(), "sbi_gold".to_string()));
        assert!(routes[1].1.starts_with("unroutable: no price source is configured for crypto"));
        Ok(())
    }

    #[tokio::test]
    async fn empty_asset_list_fails_the_run() -> Result<()> {
        let err = run_valuation(&config(Vec::new())).await.unwrap_err();
        assert!(err.to_string().contains("no assets to value"));
        Ok(())
    }

    #[test]
    fn every_sink_has_a_projector() {
        let config = config(Vec::new());
        for sink in [Sink::Document, Sink::Chat, Sink::Datastore, Sink::Json] {
            let _ = projector_for(sink, &config);
        }
    }
}
