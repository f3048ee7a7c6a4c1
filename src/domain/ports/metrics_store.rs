use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::error::DomainError;
use crate::domain::values::period::PeriodFilter;

pub trait MetricsStore: Send + Sync {
    /// Records for `ticker` whose fiscal year falls in any of `filters`.
    /// An empty filter list means every stored period.
    fn fetch_metrics(
        &self,
        ticker: &str,
        filters: &[PeriodFilter],
    ) -> Result<Vec<MetricRecord>, DomainError>;

    /// Whether anything is stored for `ticker`. Used to trust ticker-shaped
    /// tokens the alias index does not know.
    fn has_metrics(&self, ticker: &str) -> Result<bool, DomainError>;
}
