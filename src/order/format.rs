use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::PriceFormatConfig;

/// Renders amounts as currency strings, e.g. `R$ 1.234,50`.
#[derive(Debug, Clone)]
pub struct PriceFormatter {
    symbol: String,
    decimal_separator: String,
    thousands_separator: String,
}

impl Default for PriceFormatter {
    fn default() -> Self {
        Self::from(&PriceFormatConfig::default())
    }
}

impl From<&PriceFormatConfig> for PriceFormatter {
    fn from(cfg: &PriceFormatConfig) -> Self {
        Self {
            symbol: cfg.currency_symbol.clone(),
            decimal_separator: cfg.decimal_separator.clone(),
            thousands_separator: cfg.thousands_separator.clone(),
        }
    }
}

impl PriceFormatter {
    pub fn format(&self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        // always two fractional digits, e.g. "1234.50"
        let plain = format!("{:.2}", rounded.abs());
        let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(ch);
        }

        format!(
            "{sign}{} {grouped}{}{frac_part}",
            self.symbol, self.decimal_separator
        )
    }
}
