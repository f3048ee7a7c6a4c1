use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    Revenue,
    NetIncome,
    Eps,
    GrossMargin,
    OperatingMargin,
    NetMargin,
    OperatingIncome,
    FreeCashFlow,
    Ebitda,
    TotalAssets,
    TotalDebt,
    Roe,
    PeRatio,
}

impl MetricKey {
    pub const ALL: [MetricKey; 13] = [
        MetricKey::Revenue,
        MetricKey::NetIncome,
        MetricKey::Eps,
        MetricKey::GrossMargin,
        MetricKey::OperatingMargin,
        MetricKey::NetMargin,
        MetricKey::OperatingIncome,
        MetricKey::FreeCashFlow,
        MetricKey::Ebitda,
        MetricKey::TotalAssets,
        MetricKey::TotalDebt,
        MetricKey::Roe,
        MetricKey::PeRatio,
    ];

    /// Metric used when a fact query names a company and a period but no metric.
    pub const DEFAULT: MetricKey = MetricKey::Revenue;

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::Revenue => "revenue",
            MetricKey::NetIncome => "net_income",
            MetricKey::Eps => "eps",
            MetricKey::GrossMargin => "gross_margin",
            MetricKey::OperatingMargin => "operating_margin",
            MetricKey::NetMargin => "net_margin",
            MetricKey::OperatingIncome => "operating_income",
            MetricKey::FreeCashFlow => "free_cash_flow",
            MetricKey::Ebitda => "ebitda",
            MetricKey::TotalAssets => "total_assets",
            MetricKey::TotalDebt => "total_debt",
            MetricKey::Roe => "roe",
            MetricKey::PeRatio => "pe_ratio",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::Revenue => "revenue",
            MetricKey::NetIncome => "net income",
            MetricKey::Eps => "EPS",
            MetricKey::GrossMargin => "gross margin",
            MetricKey::OperatingMargin => "operating margin",
            MetricKey::NetMargin => "net margin",
            MetricKey::OperatingIncome => "operating income",
            MetricKey::FreeCashFlow => "free cash flow",
            MetricKey::Ebitda => "EBITDA",
            MetricKey::TotalAssets => "total assets",
            MetricKey::TotalDebt => "total debt",
            MetricKey::Roe => "return on equity",
            MetricKey::PeRatio => "P/E ratio",
        }
    }

    /// Lower-case phrases that name this metric in free text.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            MetricKey::Revenue => &["revenue", "revenues", "sales", "top line", "turnover"],
            MetricKey::NetIncome => &[
                "net income",
                "net profit",
                "profit",
                "profits",
                "earnings",
                "bottom line",
            ],
            MetricKey::Eps => &["eps", "earnings per share"],
            MetricKey::GrossMargin => &["gross margin", "gross margins"],
            MetricKey::OperatingMargin => &["operating margin", "operating margins"],
            MetricKey::NetMargin => &["net margin", "profit margin"],
            MetricKey::OperatingIncome => &["operating income", "operating profit"],
            MetricKey::FreeCashFlow => &["free cash flow", "fcf"],
            MetricKey::Ebitda => &["ebitda"],
            MetricKey::TotalAssets => &["total assets", "assets"],
            MetricKey::TotalDebt => &["total debt", "debt"],
            MetricKey::Roe => &["roe", "return on equity"],
            MetricKey::PeRatio => &["pe ratio", "p/e", "p/e ratio", "price to earnings"],
        }
    }

    /// Whether values are ratios rather than currency amounts.
    pub fn is_ratio(&self) -> bool {
        matches!(
            self,
            MetricKey::GrossMargin
                | MetricKey::OperatingMargin
                | MetricKey::NetMargin
                | MetricKey::Roe
                | MetricKey::PeRatio
                | MetricKey::Eps
        )
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        MetricKey::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == key)
            .ok_or_else(|| format!("Unknown metric: {s}"))
    }
}
