//! SBI gold bid quote.
//!
//! The endpoint is POSTed without parameters. Its body is a JSON object whose
//! `data` member is itself a JSON document serialized as a string, so the
//! payload needs two parse passes before `FGNOK.BID.px` can be read.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::{decimal_field, Endpoint};
use crate::market_data::{PriceSource, QuoteError};

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<String>,
}

pub struct SbiGoldPriceSource {
    endpoint: Endpoint,
}

impl SbiGoldPriceSource {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }
}

fn parse_bid(body: &str) -> Result<Decimal, QuoteError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    let inner = envelope.data.ok_or(QuoteError::MissingField("data"))?;
    let quote: Value = serde_json::from_str(&inner)?;
    decimal_field(quote.pointer("/FGNOK/BID/px"), "FGNOK.BID.px")
}

#[async_trait]
impl PriceSource for SbiGoldPriceSource {
    // Gold has no per-asset code; any code passed in is ignored.
    async fn try_fetch_price(&self, _code: Option<&str>) -> Result<Decimal, QuoteError> {
        let body = self.endpoint.post_text().await?;
        parse_bid(&body)
    }

    fn name(&self) -> &str {
        "sbi_gold"
    }
}
