use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;

/// Why a single quote could not be obtained.
///
/// These never escape a [`PriceSource`]: [`PriceSource::fetch_price`] turns
/// every one of them into `None`.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("{source_name} requires an asset code")]
    MissingCode { source_name: &'static str },
    #[error("HTTP {status} from {url}")]
    Status { status: StatusCode, url: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("field {0} missing from payload")]
    MissingField(&'static str),
    #[error("field {field} is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },
}

/// One quote provider.
///
/// Implementors only write [`PriceSource::try_fetch_price`]; callers use
/// [`PriceSource::fetch_price`], which logs failures and degrades them to
/// an absent price.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn try_fetch_price(&self, code: Option<&str>) -> Result<Decimal, QuoteError>;

    fn name(&self) -> &str;

    async fn fetch_price(&self, code: Option<&str>) -> Option<Decimal> {
        let code_label = code.unwrap_or("-");
        match self.try_fetch_price(code).await {
            Ok(price) => {
                tracing::debug!(source = self.name(), code = code_label, %price, "fetched price");
                Some(price)
            }
            Err(err) => {
                tracing::warn!(source = self.name(), code = code_label, error = %err, "price fetch failed");
                None
            }
        }
    }
}
