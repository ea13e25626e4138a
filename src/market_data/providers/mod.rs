//! Quote provider adapters.
//!
//! Each adapter knows one upstream response shape and nothing else. The
//! HTTP plumbing they share lives in [`Endpoint`].

pub mod bitflyer;
pub mod minkabu;
pub mod sbi_gold;

pub use bitflyer::BitflyerPriceSource;
pub use minkabu::{MinkabuFundPriceSource, MinkabuStockPriceSource};
pub use sbi_gold::SbiGoldPriceSource;

use std::str::FromStr;

use reqwest::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::QuoteError;

/// An upstream URL plus the client and optional key used to reach it.
///
/// For code-keyed providers `url` is a prefix: the URL-encoded asset code is
/// appended to it verbatim.
pub struct Endpoint {
    client: Client,
    url: String,
    api_key: Option<SecretString>,
}

impl Endpoint {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    fn url_for(&self, code: &str) -> String {
        format!("{}{}", self.url, urlencoding::encode(code.trim()))
    }

    /// GET `{url}{code}` and decode the body as JSON.
    pub async fn get_json<T: DeserializeOwned>(&self, code: &str) -> Result<T, QuoteError> {
        let url = self.url_for(code);
        let response = self.send(self.client.get(&url), &url).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// POST to the bare endpoint and return the body as text.
    pub async fn post_text(&self) -> Result<String, QuoteError> {
        let response = self.send(self.client.post(&self.url), &self.url).await?;
        Ok(response.text().await?)
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, QuoteError> {
        let mut request = request.header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key.expose_secret());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(QuoteError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

/// The asset code with surrounding whitespace removed. Blank codes count as
/// missing so the bare endpoint prefix is never requested.
pub(crate) fn required_code<'a>(
    code: Option<&'a str>,
    source_name: &'static str,
) -> Result<&'a str, QuoteError> {
    code.map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(QuoteError::MissingCode { source_name })
}

/// Coerce a JSON number or numeric string into a decimal.
pub(crate) fn decimal_field(value: Option<&Value>, field: &'static str) -> Result<Decimal, QuoteError> {
    let value = match value {
        None | Some(Value::Null) => return Err(QuoteError::MissingField(field)),
        Some(value) => value,
    };

    let parsed = match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    };

    parsed.ok_or_else(|| QuoteError::NotNumeric {
        field,
        value: value.to_string(),
    })
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let cleaned = raw.replace(',', "");
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
