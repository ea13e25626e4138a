//! Minkabu fund and stock lookups.
//!
//! Both endpoints return a list whose first element is the latest entry:
//! `fund_data[0].fund_price` for funds, `items[0].price` for stocks.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{decimal_field, required_code, Endpoint};
use crate::market_data::{PriceSource, QuoteError};

#[derive(Debug, Deserialize)]
struct FundResponse {
    #[serde(default)]
    fund_data: Vec<FundEntry>,
}

#[derive(Debug, Deserialize)]
struct FundEntry {
    #[serde(default)]
    fund_price: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct StockResponse {
    #[serde(default)]
    items: Vec<StockItem>,
}

#[derive(Debug, Deserialize)]
struct StockItem {
    #[serde(default)]
    price: Option<Value>,
}

impl FundResponse {
    fn latest_price(&self) -> Result<Decimal, QuoteError> {
        let entry = self
            .fund_data
            .first()
            .ok_or(QuoteError::MissingField("fund_data"))?;
        decimal_field(entry.fund_price.as_ref(), "fund_price")
    }
}

impl StockResponse {
    fn latest_price(&self) -> Result<Decimal, QuoteError> {
        let item = self.items.first().ok_or(QuoteError::MissingField("items"))?;
        decimal_field(item.price.as_ref(), "price")
    }
}

/// Investment trust prices keyed by fund code.
pub struct MinkabuFundPriceSource {
    endpoint: Endpoint,
}

impl MinkabuFundPriceSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl PriceSource for MinkabuFundPriceSource {
    async fn try_fetch_price(&self, code: Option<&str>) -> Result<Decimal, QuoteError> {
        let code = required_code(code, "minkabu_fund")?;
        let response: FundResponse = self.endpoint.get_json(code).await?;
        response.latest_price()
    }

    fn name(&self) -> &str {
        "minkabu_fund"
    }
}

/// Listed stock prices keyed by ticker code.
pub struct MinkabuStockPriceSource {
    endpoint: Endpoint,
}

impl MinkabuStockPriceSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl PriceSource for MinkabuStockPriceSource {
    async fn try_fetch_price(&self, code: Option<&str>) -> Result<Decimal, QuoteError> {
        let code = required_code(code, "minkabu_stock")?;
        let response: StockResponse = self.endpoint.get_json(code).await?;
        response.latest_price()
    }

    fn name(&self) -> &str {
        "minkabu_stock"
    }
}
