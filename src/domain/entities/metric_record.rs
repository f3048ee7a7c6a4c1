use crate::domain::values::metric_key::MetricKey;
use serde::{Deserialize, Serialize};

/// One reported value for a ticker, as returned by the metrics store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub ticker: String,
    pub metric: MetricKey,
    pub value: f64,
    pub fiscal_year: i32,
    /// `None` for annual figures.
    pub fiscal_quarter: Option<u8>,
}

impl MetricRecord {
    pub fn annual(ticker: &str, metric: MetricKey, fiscal_year: i32, value: f64) -> Self {
        Self {
            ticker: ticker.to_string(),
            metric,
            value,
            fiscal_year,
            fiscal_quarter: None,
        }
    }

    pub fn quarterly(
        ticker: &str,
        metric: MetricKey,
        fiscal_year: i32,
        quarter: u8,
        value: f64,
    ) -> Self {
        Self {
            ticker: ticker.to_string(),
            metric,
            value,
            fiscal_year,
            fiscal_quarter: Some(quarter),
        }
    }

    pub fn period_label(&self) -> String {
        match self.fiscal_quarter {
            Some(q) => format!("{}-Q{}", self.fiscal_year, q),
            None => self.fiscal_year.to_string(),
        }
    }

    /// Human-readable value: ratios with two decimals, amounts with thousands separators.
    pub fn display_value(&self) -> String {
        if self.metric.is_ratio() {
            format!("{:.2}", self.value)
        } else {
            format_amount(self.value)
        }
    }
}

fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let digits = format!("{:.0}", value.abs());
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_amounts_and_ratios() {
        let r = MetricRecord::annual("AAPL", MetricKey::Revenue, 2023, 383_285_000_000.0);
        assert_eq!(r.display_value(), "383,285,000,000");
        let m = MetricRecord::annual("AAPL", MetricKey::GrossMargin, 2023, 0.4413);
        assert_eq!(m.display_value(), "0.44");
        let n = MetricRecord::annual("X", MetricKey::NetIncome, 2022, -1_250.0);
        assert_eq!(n.display_value(), "-1,250");
    }

    #[test]
    fn period_labels() {
        assert_eq!(
            MetricRecord::quarterly("MSFT", MetricKey::Revenue, 2024, 1, 1.0).period_label(),
            "2024-Q1"
        );
        assert_eq!(
            MetricRecord::annual("MSFT", MetricKey::Revenue, 2024, 1.0).period_label(),
            "2024"
        );
    }
}
