use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use rust_decimal::Decimal;

use crate::clock::{Clock, SystemClock};
use crate::market_data::{PriceSource, SourceRouter};
use crate::models::Asset;

use super::{PortfolioSummary, PriceQuoteResult, Valuation, ValuationLine};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures that abort a whole run. Per-asset price failures are never
/// reported here; they show up as `has_error` lines instead.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValuationError {
    #[error("no assets to value")]
    EmptyPortfolio,
    #[error("asset #{index} has an empty name")]
    EmptyAssetName { index: usize },
    #[error("asset name {0:?} appears more than once")]
    DuplicateAssetName(String),
    #[error("none of the {count} assets could be routed to a price source")]
    NoRoutableAssets { count: usize },
    #[error("no price result for asset {asset:?} ({received} results for {expected} assets)")]
    IncompleteResultSet {
        asset: String,
        expected: usize,
        received: usize,
    },
}

/// Values a list of assets by fetching every price concurrently.
pub struct ValuationEngine {
    router: SourceRouter,
    fetch_timeout: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl ValuationEngine {
    pub fn new(router: SourceRouter) -> Self {
        Self {
            router,
            fetch_timeout: Some(DEFAULT_FETCH_TIMEOUT),
            clock: Arc::new(SystemClock),
        }
    }

    /// Bound each fetch; an expired fetch counts as an absent price.
    /// `None` disables the bound.
    pub fn with_fetch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub async fn valuate(&self, assets: &[Asset]) -> Result<Valuation, ValuationError> {
        validate_assets(assets)?;

        let routed: Vec<(&Asset, Option<Arc<dyn PriceSource>>)> = assets
            .iter()
            .map(|asset| match self.router.resolve(asset) {
                Ok(source) => (asset, Some(source)),
                Err(err) => {
                    tracing::warn!(asset = %asset.name, error = %err, "asset is unroutable");
                    (asset, None)
                }
            })
            .collect();

        if routed.iter().all(|(_, source)| source.is_none()) {
            return Err(ValuationError::NoRoutableAssets {
                count: assets.len(),
            });
        }

        tracing::info!(assets = assets.len(), "fetching prices");
        let quotes = join_all(
            routed
                .into_iter()
                .map(|(asset, source)| self.fetch_quote(asset, source)),
        )
        .await;

        let valuation = assemble(assets, quotes, self.clock.now())?;
        tracing::info!(
            total_purchased = %valuation.summary.total_purchased,
            total_current_value = %valuation.summary.total_current_value,
            failed = valuation.failed_lines().count(),
            "valuation complete"
        );
        Ok(valuation)
    }

    async fn fetch_quote(
        &self,
        asset: &Asset,
        source: Option<Arc<dyn PriceSource>>,
    ) -> PriceQuoteResult {
        let Some(source) = source else {
            return PriceQuoteResult::new(&asset.name, None);
        };

        let fetch = source.fetch_price(asset.code.as_deref());
        let unit_price = match self.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(price) => price,
                Err(_) => {
                    tracing::warn!(
                        asset = %asset.name,
                        source = source.name(),
                        timeout_ms = limit.as_millis() as u64,
                        "price fetch timed out"
                    );
                    None
                }
            },
            None => fetch.await,
        };

        PriceQuoteResult::new(&asset.name, unit_price)
    }
}

fn validate_assets(assets: &[Asset]) -> Result<(), ValuationError> {
    if assets.is_empty() {
        return Err(ValuationError::EmptyPortfolio);
    }

    let mut seen = HashSet::with_capacity(assets.len());
    for (index, asset) in assets.iter().enumerate() {
        if asset.name.trim().is_empty() {
            return Err(ValuationError::EmptyAssetName { index });
        }
        if !seen.insert(asset.name.as_str()) {
            return Err(ValuationError::DuplicateAssetName(asset.name.clone()));
        }
    }
    Ok(())
}

/// Pair every asset with its quote by name and fold the totals.
///
/// Output order follows `assets`, whatever order `quotes` arrived in. An
/// asset without a quote fails the whole run.
pub fn assemble(
    assets: &[Asset],
    quotes: Vec<PriceQuoteResult>,
    as_of: DateTime<Utc>,
) -> Result<Valuation, ValuationError> {
    let received = quotes.len();
    let mut by_name: HashMap<String, Option<Decimal>> = quotes
        .into_iter()
        .map(|quote| (quote.asset_name, quote.unit_price))
        .collect();

    let mut lines = Vec::with_capacity(assets.len());
    for asset in assets {
        let unit_price =
            by_name
                .remove(&asset.name)
                .ok_or_else(|| ValuationError::IncompleteResultSet {
                    asset: asset.name.clone(),
                    expected: assets.len(),
                    received,
                })?;
        lines.push(ValuationLine::from_quote(asset, unit_price));
    }

    let summary = PortfolioSummary::from_lines(&lines);
    Ok(Valuation {
        as_of,
        lines,
        summary,
    })
}
