//! Source-type to price-source routing.
//!
//! One price source per [`SourceType`]; adding a provider means adding a
//! variant and registering its source here, nothing else.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};

use super::providers::{
    BitflyerPriceSource, Endpoint, MinkabuFundPriceSource, MinkabuStockPriceSource,
    SbiGoldPriceSource,
};
use super::PriceSource;
use crate::config::{ProviderConfig, ProvidersConfig};
use crate::models::{Asset, SourceType, UnknownSourceType};

#[derive(Default, Clone)]
pub struct SourceRouter {
    sources: HashMap<SourceType, Arc<dyn PriceSource>>,
}

impl SourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the source used for `source_type`.
    pub fn with_source(mut self, source_type: SourceType, source: Arc<dyn PriceSource>) -> Self {
        self.sources.insert(source_type, source);
        self
    }

    /// Build the router from configured providers. Source types without a
    /// provider entry stay unregistered.
    pub fn from_config(providers: &ProvidersConfig, client: &Client) -> Self {
        let mut router = Self::new();

        for source_type in SourceType::ALL {
            let Some(provider) = providers.get(source_type) else {
                tracing::debug!(%source_type, "no provider configured");
                continue;
            };
            let endpoint = endpoint_for(provider, client);
            let source: Arc<dyn PriceSource> = match source_type {
                SourceType::Crypto => Arc::new(BitflyerPriceSource::new(endpoint)),
                SourceType::FundIndex => Arc::new(MinkabuFundPriceSource::new(endpoint)),
                SourceType::Stock => Arc::new(MinkabuStockPriceSource::new(endpoint)),
                SourceType::Gold => Arc::new(SbiGoldPriceSource::new(endpoint)),
            };
            router.sources.insert(source_type, source);
        }

        router
    }

    pub fn resolve(&self, asset: &Asset) -> Result<Arc<dyn PriceSource>, UnknownSourceType> {
        let source_type = asset.source_type()?;
        self.sources
            .get(&source_type)
            .cloned()
            .ok_or_else(|| UnknownSourceType::Unconfigured {
                asset: asset.name.clone(),
                source_type,
            })
    }

    /// Registered source types, in declaration order.
    pub fn source_types(&self) -> Vec<SourceType> {
        SourceType::ALL
            .into_iter()
            .filter(|t| self.sources.contains_key(t))
            .collect()
    }
}

fn endpoint_for(provider: &ProviderConfig, client: &Client) -> Endpoint {
    let endpoint = Endpoint::new(client.clone(), provider.endpoint.clone());
    match &provider.api_key {
        Some(key) => endpoint.with_api_key(SecretString::from(key.expose_secret().to_string())),
        None => endpoint,
    }
}
