use anyhow::Result;
use chrono_tz::Tz;
use serde_json::json;

use super::ResultProjector;
use crate::format::NumberFormat;
use crate::portfolio::Valuation;

/// Chat webhook payload: `{"text": "..."}` with the headline totals.
pub struct ChatProjector {
    timezone: Tz,
    numbers: NumberFormat,
}

impl ChatProjector {
    pub fn new(timezone: Tz, numbers: NumberFormat) -> Self {
        Self { timezone, numbers }
    }

    fn text(&self, valuation: &Valuation) -> String {
        let stamp = valuation.as_of.with_timezone(&self.timezone);
        let mut text = format!("Assets [{}]\n", stamp.format("%y/%m/%d %H:%M:%S"));

        let summary = &valuation.summary;
        if summary.any_error {
            text.push_str("unavailable");
            for line in valuation.failed_lines() {
                text.push_str(&format!("\nfailed: {}", line.name));
            }
        } else {
            text.push_str(&format!(
                "{} ({})",
                self.numbers.signed(summary.total_current_value),
                self.numbers.signed(summary.total_gain)
            ));
        }
        text
    }
}

impl ResultProjector for ChatProjector {
    fn render(&self, valuation: &Valuation) -> Result<String> {
        Ok(serde_json::to_string(&json!({ "text": self.text(valuation) }))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;

    fn projector() -> ChatProjector {
        ChatProjector::new(chrono_tz::Asia::Tokyo, NumberFormat::default())
    }

    #[test]
    fn headline_totals() -> Result<()> {
        let rendered = projector().render(&fixtures::valuation(false))?;
        let value: serde_json::Value = serde_json::from_str(&rendered)?;

        assert_eq!(
            value["text"],
            "Assets [24/06/03 18:00:00]\n+4,512,000.00 (+3,492,000.00)"
        );
        Ok(())
    }

    #[test]
    fn any_error_suppresses_totals() -> Result<()> {
        let rendered = projector().render(&fixtures::valuation(true))?;
        let value: serde_json::Value = serde_json::from_str(&rendered)?;

        assert_eq!(
            value["text"],
            "Assets [24/06/03 18:00:00]\nunavailable\nfailed: B"
        );
        Ok(())
    }
}
