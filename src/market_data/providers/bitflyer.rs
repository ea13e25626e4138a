//! bitFlyer ticker provider for crypto assets.
//!
//! The ticker endpoint takes a product code (e.g. `BTC_JPY`) and returns the
//! last traded price as `ltp`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{decimal_field, required_code, Endpoint};
use crate::market_data::{PriceSource, QuoteError};

#[derive(Debug, Deserialize)]
struct Ticker {
    #[serde(default)]
    ltp: Option<Value>,
}

pub struct BitflyerPriceSource {
    endpoint: Endpoint,
}

impl BitflyerPriceSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

#[async_trait]
impl PriceSource for BitflyerPriceSource {
    async fn try_fetch_price(&self, code: Option<&str>) -> Result<Decimal, QuoteError> {
        let code = required_code(code, "bitflyer")?;
        let ticker: Ticker = self.endpoint.get_json(code).await?;
        decimal_field(ticker.ltp.as_ref(), "ltp")
    }

    fn name(&self) -> &str {
        "bitflyer"
    }
}
