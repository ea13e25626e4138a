use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Asset;

/// Outcome of one price fetch. `None` means the price could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuoteResult {
    pub asset_name: String,
    pub unit_price: Option<Decimal>,
}

impl PriceQuoteResult {
    pub fn new(asset_name: impl Into<String>, unit_price: Option<Decimal>) -> Self {
        Self {
            asset_name: asset_name.into(),
            unit_price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub purchased_cost: Decimal,
    pub unit_price: Option<Decimal>,
    pub current_value: Option<Decimal>,
    /// Zero when `current_value` is absent.
    pub gain: Decimal,
    pub has_error: bool,
}

impl ValuationLine {
    /// Value one asset at `unit_price`. `has_error` is exactly
    /// `current_value.is_none()`; a price whose value or gain overflows
    /// leaves the line unvalued.
    pub fn from_quote(asset: &Asset, unit_price: Option<Decimal>) -> Self {
        let valued = unit_price
            .and_then(|price| asset.lot.checked_mul(price))
            .and_then(|value| Some((value, value.checked_sub(asset.purchased_cost)?)));
        let (current_value, gain) = match valued {
            Some((value, gain)) => (Some(value), gain),
            None => (None, Decimal::ZERO),
        };

        Self {
            name: asset.name.clone(),
            tag: asset.tag.clone(),
            purchased_cost: asset.purchased_cost,
            unit_price,
            current_value,
            gain,
            has_error: current_value.is_none(),
        }
    }

    /// Gain relative to cost basis; `None` on error or zero cost.
    pub fn gain_ratio(&self) -> Option<Decimal> {
        if self.has_error {
            return None;
        }
        ratio(self.gain, self.purchased_cost)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub total_purchased: Decimal,
    /// Sum over lines without error. Presentation layers should show this as
    /// unavailable when `any_error` is set.
    pub total_current_value: Decimal,
    pub total_gain: Decimal,
    pub any_error: bool,
}

impl PortfolioSummary {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a ValuationLine>) -> Self {
        lines
            .into_iter()
            .fold(PortfolioSummary::default(), |mut summary, line| {
                summary.total_purchased =
                    summary.total_purchased.saturating_add(line.purchased_cost);
                let totals = match line.current_value {
                    Some(value) if !line.has_error => summary
                        .total_current_value
                        .checked_add(value)
                        .zip(summary.total_gain.checked_add(line.gain)),
                    _ => None,
                };
                match totals {
                    Some((current_value, gain)) => {
                        summary.total_current_value = current_value;
                        summary.total_gain = gain;
                    }
                    // Overflowing totals are flagged like a missing price.
                    None => summary.any_error = true,
                }
                summary
            })
    }

    pub fn gain_ratio(&self) -> Option<Decimal> {
        if self.any_error {
            return None;
        }
        ratio(self.total_gain, self.total_purchased)
    }
}

fn ratio(gain: Decimal, cost: Decimal) -> Option<Decimal> {
    if cost.is_zero() {
        None
    } else {
        gain.checked_div(cost)
    }
}

/// Result of one valuation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Valuation {
    pub as_of: DateTime<Utc>,
    pub lines: Vec<ValuationLine>,
    pub summary: PortfolioSummary,
}

impl Valuation {
    pub fn failed_lines(&self) -> impl Iterator<Item = &ValuationLine> {
        self.lines.iter().filter(|line| line.has_error)
    }
}
