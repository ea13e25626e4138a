//! Result projectors: turn a [`Valuation`] into something a sink can take.
//!
//! The valuation core hands over plain decimals and flags; every string
//! that reaches a human or an external system is produced here.

mod chat;
mod datastore;
mod document;

pub use chat::ChatProjector;
pub use datastore::DatastoreProjector;
pub use document::DocumentProjector;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::portfolio::Valuation;

pub trait ResultProjector: Send + Sync {
    fn render(&self, valuation: &Valuation) -> Result<String>;
}

/// The raw valuation as pretty JSON, decimals as strings.
pub struct JsonProjector;

impl ResultProjector for JsonProjector {
    fn render(&self, valuation: &Valuation) -> Result<String> {
        Ok(serde_json::to_string_pretty(valuation)?)
    }
}

/// Where a run's result goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sink {
    #[default]
    Document,
    Chat,
    Datastore,
    Json,
}

impl FromStr for Sink {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "document" | "doc" => Ok(Sink::Document),
            "chat" => Ok(Sink::Chat),
            "datastore" => Ok(Sink::Datastore),
            "json" => Ok(Sink::Json),
            other => Err(format!(
                "unknown sink {other:?} (expected document, chat, datastore or json)"
            )),
        }
    }
}

impl fmt::Display for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sink::Document => "document",
            Sink::Chat => "chat",
            Sink::Datastore => "datastore",
            Sink::Json => "json",
        })
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use crate::models::{Asset, SourceType};
    use crate::portfolio::{assemble, PriceQuoteResult, Valuation};

    /// Two lines from the crypto + gold scenario; gold optionally failed.
    pub fn valuation(gold_failed: bool) -> Valuation {
        let assets = vec![
            Asset::new("A", SourceType::Crypto, dec!(1), dec!(1000000))
                .with_code("BTC")
                .with_tag("crypto"),
            Asset::new("B", SourceType::Gold, dec!(2), dec!(20000)).with_tag("metal"),
        ];
        let gold = if gold_failed { None } else { Some(dec!(6000)) };
        let quotes = vec![
            PriceQuoteResult::new("A", Some(dec!(4500000))),
            PriceQuoteResult::new("B", gold),
        ];
        assemble(
            &assets,
            quotes,
            Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap(),
        )
        .expect("fixture assembles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_parses_names() {
        assert_eq!("document".parse::<Sink>(), Ok(Sink::Document));
        assert_eq!("CHAT".parse::<Sink>(), Ok(Sink::Chat));
        assert_eq!("datastore".parse::<Sink>(), Ok(Sink::Datastore));
        assert_eq!("json".parse::<Sink>(), Ok(Sink::Json));
        assert!("pdf".parse::<Sink>().is_err());
        assert_eq!(Sink::Datastore.to_string(), "datastore");
    }

    #[test]
    fn json_projector_keeps_decimals_as_strings() -> Result<()> {
        let rendered = JsonProjector.render(&fixtures::valuation(true))?;
        let value: serde_json::Value = serde_json::from_str(&rendered)?;

        assert_eq!(value["summary"]["total_purchased"], "1020000");
        assert_eq!(value["summary"]["any_error"], true);
        assert_eq!(value["lines"][1]["current_value"], serde_json::Value::Null);
        assert_eq!(value["lines"][1]["has_error"], true);
        Ok(())
    }
}
