use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::metrics_store::MetricsStore;
use crate::domain::ports::narrative_port::NarrativeGenerator;
use crate::domain::values::metric_key::MetricKey;
use std::sync::Arc;

/// Deterministic narrative built from stored annual figures.
pub struct MetricsNarrator {
    metrics: Arc<dyn MetricsStore>,
}

impl MetricsNarrator {
    pub fn new(metrics: Arc<dyn MetricsStore>) -> Self {
        Self { metrics }
    }
}

fn annual_value(records: &[MetricRecord], metric: MetricKey, year: i32) -> Option<&MetricRecord> {
    records
        .iter()
        .find(|r| r.metric == metric && r.fiscal_year == year && r.fiscal_quarter.is_none())
}

#[async_trait::async_trait]
impl NarrativeGenerator for MetricsNarrator {
    async fn generate_summary(&self, ticker: &str) -> Result<String, DomainError> {
        let records = self.metrics.fetch_metrics(ticker, &[])?;
        let Some(latest) = records
            .iter()
            .filter(|r| r.fiscal_quarter.is_none())
            .map(|r| r.fiscal_year)
            .max()
        else {
            return Ok(format!("{ticker}: no annual figures on file."));
        };

        let mut sentences = vec![format!("{ticker} fiscal {latest}.")];

        if let Some(rev) = annual_value(&records, MetricKey::Revenue, latest) {
            let mut s = format!("Revenue was {}", rev.display_value());
            if let Some(prev) = annual_value(&records, MetricKey::Revenue, latest - 1) {
                if prev.value != 0.0 {
                    let growth = (rev.value - prev.value) / prev.value.abs() * 100.0;
                    s.push_str(&format!(", {growth:+.1}% versus {}", latest - 1));
                }
            }
            s.push('.');
            sentences.push(s);

            if let Some(ni) = annual_value(&records, MetricKey::NetIncome, latest) {
                if rev.value != 0.0 {
                    sentences.push(format!(
                        "Net income was {} ({:.1}% net margin).",
                        ni.display_value(),
                        ni.value / rev.value * 100.0
                    ));
                }
            }
        }

        for metric in [MetricKey::Eps, MetricKey::FreeCashFlow, MetricKey::TotalDebt] {
            if let Some(r) = annual_value(&records, metric, latest) {
                sentences.push(format!("{} {}.", capitalize(metric.label()), r.display_value()));
            }
        }

        Ok(sentences.join(" "))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
