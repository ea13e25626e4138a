use std::collections::BTreeMap;

use anyhow::Result;
use chrono_tz::Tz;
use rust_decimal::Decimal;

use super::ResultProjector;
use crate::format::{format_ratio_percent, NumberFormat};
use crate::portfolio::{PortfolioSummary, Valuation, ValuationLine};

const UNAVAILABLE: &str = "n/a";
const UNTAGGED: &str = "untagged";
const HEADER: [&str; 5] = ["Name", "Purchased", "Current", "Gain", "Gain %"];

/// Plain-text report: every asset ranked by gain, then totals per tag.
pub struct DocumentProjector {
    timezone: Tz,
    numbers: NumberFormat,
}

impl DocumentProjector {
    pub fn new(timezone: Tz, numbers: NumberFormat) -> Self {
        Self { timezone, numbers }
    }

    fn row(
        &self,
        name: &str,
        purchased: Decimal,
        current: Option<Decimal>,
        gain: Option<Decimal>,
    ) -> [String; 5] {
        // checked_div is None for a zero cost basis as well as on overflow.
        let percent = gain
            .and_then(|g| g.checked_div(purchased))
            .and_then(format_ratio_percent);
        [
            name.to_string(),
            self.numbers.amount(purchased),
            current.map_or_else(|| UNAVAILABLE.to_string(), |v| self.numbers.amount(v)),
            gain.map_or_else(|| UNAVAILABLE.to_string(), |g| self.numbers.signed(g)),
            percent.unwrap_or_else(|| UNAVAILABLE.to_string()),
        ]
    }

    fn line_row(&self, line: &ValuationLine) -> [String; 5] {
        let gain = (!line.has_error).then_some(line.gain);
        self.row(&line.name, line.purchased_cost, line.current_value, gain)
    }

    fn summary_row(&self, summary: &PortfolioSummary) -> [String; 5] {
        let (current, gain) = if summary.any_error {
            (None, None)
        } else {
            (Some(summary.total_current_value), Some(summary.total_gain))
        };
        self.row("Summary", summary.total_purchased, current, gain)
    }

    fn tag_rows(&self, lines: &[ValuationLine]) -> Vec<[String; 5]> {
        let mut grouped: BTreeMap<&str, Vec<&ValuationLine>> = BTreeMap::new();
        for line in lines {
            grouped
                .entry(line.tag.as_deref().unwrap_or(UNTAGGED))
                .or_default()
                .push(line);
        }

        grouped
            .into_iter()
            .map(|(tag, members)| {
                let mut row = self.summary_row(&PortfolioSummary::from_lines(members));
                row[0] = tag.to_string();
                row
            })
            .collect()
    }
}

impl ResultProjector for DocumentProjector {
    fn render(&self, valuation: &Valuation) -> Result<String> {
        let stamp = valuation.as_of.with_timezone(&self.timezone);
        let mut out = format!("Assets Report - {}\n\n", stamp.format("%y/%m/%d %H:%M"));

        let mut ranked: Vec<&ValuationLine> = valuation.lines.iter().collect();
        // Stable sort: equal gains keep input order.
        ranked.sort_by(|a, b| b.gain.cmp(&a.gain));
        let rows: Vec<_> = ranked.into_iter().map(|line| self.line_row(line)).collect();
        out.push_str(&render_table(&rows, &self.summary_row(&valuation.summary)));

        out.push('\n');
        let tag_rows = self.tag_rows(&valuation.lines);
        out.push_str(&render_table(&tag_rows, &self.summary_row(&valuation.summary)));

        Ok(out)
    }
}

fn render_table(rows: &[[String; 5]], summary: &[String; 5]) -> String {
    let header = HEADER.map(str::to_string);
    let mut widths = [0usize; 5];
    for row in std::iter::once(&header).chain(rows).chain(std::iter::once(summary)) {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |row: &[String; 5]| -> String {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .enumerate()
            .map(|(i, (cell, width))| {
                if i == 0 {
                    format!("{cell:<width$}")
                } else {
                    format!("{cell:>width$}")
                }
            })
            .collect();
        format!("| {} |\n", cells.join(" | "))
    };
    let rule = format!(
        "|{}|\n",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    );

    let mut out = format_row(&header);
    out.push_str(&rule);
    for row in rows {
        out.push_str(&format_row(row));
    }
    out.push_str(&rule);
    out.push_str(&format_row(summary));
    out
}
