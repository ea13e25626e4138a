use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

/// Rendering rules for money in reports. Only projectors use this; the
/// valuation core deals in plain decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberFormat {
    pub decimals: u32,
    pub grouping: bool,
    pub symbol: Option<String>,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            grouping: true,
            symbol: None,
        }
    }
}

impl From<&DisplayConfig> for NumberFormat {
    fn from(display: &DisplayConfig) -> Self {
        Self {
            decimals: display.currency_decimals,
            grouping: display.currency_grouping,
            symbol: display.currency_symbol.clone(),
        }
    }
}

impl NumberFormat {
    /// `1,234,567.50`, `-¥1,234.50`
    pub fn amount(&self, value: Decimal) -> String {
        self.render(value, false)
    }

    /// Like [`NumberFormat::amount`] but always carries a sign: `+1,234.50`.
    pub fn signed(&self, value: Decimal) -> String {
        self.render(value, true)
    }

    fn render(&self, value: Decimal, force_sign: bool) -> String {
        let rounded = round(value, self.decimals);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();

        let mut digits = fixed_dp(rounded.abs(), self.decimals);
        if self.grouping {
            digits = group_thousands(&digits);
        }

        let mut out = String::with_capacity(digits.len() + 4);
        if negative {
            out.push('-');
        } else if force_sign {
            out.push('+');
        }
        if let Some(symbol) = &self.symbol {
            out.push_str(symbol);
        }
        out.push_str(&digits);
        out
    }
}

/// Signed percentage with two decimals from a ratio: `0.1234` -> `+12.34%`.
/// `None` when the percentage is out of decimal range.
pub fn format_ratio_percent(ratio: Decimal) -> Option<String> {
    let percent = round(ratio.checked_mul(Decimal::ONE_HUNDRED)?, 2);
    let sign = if percent.is_sign_negative() && !percent.is_zero() {
        "-"
    } else {
        "+"
    };
    Some(format!("{sign}{}%", fixed_dp(percent.abs(), 2)))
}

fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

fn fixed_dp(value: Decimal, dp: u32) -> String {
    let mut value = value;
    value.rescale(dp);
    value.to_string()
}

fn group_thousands(s: &str) -> String {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s, None),
    };

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        grouped.push(ch);
        let remaining = len - i - 1;
        if remaining > 0 && remaining % 3 == 0 {
            grouped.push(',');
        }
    }

    match frac_part {
        Some(f) => format!("{grouped}.{f}"),
        None => grouped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_groups_and_pads() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.amount(dec!(1234567.5)), "1,234,567.50");
        assert_eq!(fmt.amount(dec!(999)), "999.00");
        assert_eq!(fmt.amount(dec!(0)), "0.00");
    }

    #[test]
    fn signed_always_has_sign() {
        let fmt = NumberFormat::default();
        assert_eq!(fmt.signed(dec!(3492000)), "+3,492,000.00");
        assert_eq!(fmt.signed(dec!(-8000)), "-8,000.00");
        assert_eq!(fmt.signed(dec!(0)), "+0.00");
    }

    #[test]
    fn negative_sign_precedes_symbol() {
        let fmt = NumberFormat {
            symbol: Some("¥".to_string()),
            ..NumberFormat::default()
        };
        assert_eq!(fmt.amount(dec!(-1234.5)), "-¥1,234.50");
        assert_eq!(fmt.signed(dec!(1234.5)), "+¥1,234.50");
    }

    #[test]
    fn zero_decimals_without_grouping() {
        let fmt = NumberFormat {
            decimals: 0,
            grouping: false,
            symbol: None,
        };
        assert_eq!(fmt.amount(dec!(1234567.5)), "1234568");
        assert_eq!(fmt.amount(dec!(-0.4)), "0");
    }

    #[test]
    fn ratio_as_percent() {
        assert_eq!(format_ratio_percent(dec!(3.5)).as_deref(), Some("+350.00%"));
        assert_eq!(format_ratio_percent(dec!(-0.4)).as_deref(), Some("-40.00%"));
        assert_eq!(format_ratio_percent(dec!(0.12345)).as_deref(), Some("+12.35%"));
        assert_eq!(format_ratio_percent(Decimal::MAX), None);
    }
}
