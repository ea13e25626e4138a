use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of quote provider an asset is priced against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Crypto,
    FundIndex,
    Stock,
    Gold,
}

impl SourceType {
    pub const ALL: [SourceType; 4] = [
        SourceType::Crypto,
        SourceType::FundIndex,
        SourceType::Stock,
        SourceType::Gold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Crypto => "crypto",
            SourceType::FundIndex => "fund_index",
            SourceType::Stock => "stock",
            SourceType::Gold => "gold",
        }
    }

    /// Whether assets of this type need a provider-specific `code`.
    pub fn requires_code(&self) -> bool {
        !matches!(self, SourceType::Gold)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a declared source type is absent or not one we know.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum UnknownSourceType {
    #[error("asset {asset:?} does not declare a source type")]
    Missing { asset: String },
    #[error("asset {asset:?} declares unknown source type {declared:?}")]
    Unrecognized { asset: String, declared: String },
    #[error("no price source is configured for {source_type} (asset {asset:?})")]
    Unconfigured {
        asset: String,
        source_type: SourceType,
    },
}

impl FromStr for SourceType {
    type Err = String;

    /// Accepts the snake_case names as well as the upstream labels used by
    /// older asset tables (`BITFLYER`, `MINKABU_FUND`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "crypto" | "bitflyer" => Ok(SourceType::Crypto),
            "fund_index" | "fund" | "minkabu_fund" => Ok(SourceType::FundIndex),
            "stock" | "minkabu_stock" => Ok(SourceType::Stock),
            "gold" | "sbi_gold" => Ok(SourceType::Gold),
            other => Err(other.to_string()),
        }
    }
}

/// A holding to be valued.
///
/// `source` is kept as declared so that an unknown value can be reported per
/// asset at routing time instead of rejecting the whole asset list on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub lot: Decimal,
    pub purchased_cost: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl Asset {
    pub fn new(
        name: impl Into<String>,
        source_type: SourceType,
        lot: Decimal,
        purchased_cost: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            source: Some(source_type.as_str().to_string()),
            code: None,
            lot,
            purchased_cost,
            tag: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Declare a raw source label, bypassing the enum.
    pub fn with_declared_source(mut self, source: Option<&str>) -> Self {
        self.source = source.map(str::to_string);
        self
    }

    pub fn source_type(&self) -> Result<SourceType, UnknownSourceType> {
        let declared = match self.source.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(UnknownSourceType::Missing {
                    asset: self.name.clone(),
                })
            }
        };

        declared
            .parse()
            .map_err(|_| UnknownSourceType::Unrecognized {
                asset: self.name.clone(),
                declared: declared.to_string(),
            })
    }
}
