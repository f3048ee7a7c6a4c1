use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::error::DomainError;
use crate::domain::ports::metrics_store::MetricsStore;
use crate::domain::values::metric_key::MetricKey;
use crate::domain::values::period::PeriodFilter;
use crate::domain::values::ticker::canonical_ticker;
use rusqlite::{params, Connection};
use std::sync::Mutex;
use tracing::warn;

/// Annual rows are stored with `fiscal_quarter = 0`.
pub struct SqliteMetricsRepo {
    conn: Mutex<Connection>,
}

impl SqliteMetricsRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Inserts or replaces the value for the record's (ticker, metric, period).
    pub fn upsert(&self, record: &MetricRecord) -> Result<(), DomainError> {
        if let Some(q) = record.fiscal_quarter {
            if !(1..=4).contains(&q) {
                return Err(DomainError::InvalidInput(format!("Invalid quarter: {q}")));
            }
        }
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO metrics (ticker, metric, fiscal_year, fiscal_quarter, value)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                canonical_ticker(&record.ticker),
                record.metric.as_str(),
                record.fiscal_year,
                record.fiscal_quarter.unwrap_or(0),
                record.value,
            ],
        )
        .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> Result<Option<MetricRecord>, rusqlite::Error> {
        let ticker: String = row.get(0)?;
        let metric_str: String = row.get(1)?;
        let quarter: u8 = row.get(3)?;
        let Ok(metric) = metric_str.parse::<MetricKey>() else {
            warn!(ticker = %ticker, metric = %metric_str, "skipping row with unknown metric");
            return Ok(None);
        };
        Ok(Some(MetricRecord {
            ticker,
            metric,
            fiscal_year: row.get(2)?,
            fiscal_quarter: (quarter != 0).then_some(quarter),
            value: row.get(4)?,
        }))
    }
}

impl MetricsStore for SqliteMetricsRepo {
    fn fetch_metrics(
        &self,
        ticker: &str,
        filters: &[PeriodFilter],
    ) -> Result<Vec<MetricRecord>, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let mut stmt = conn
            .prepare(
                "SELECT ticker, metric, fiscal_year, fiscal_quarter, value FROM metrics
                 WHERE ticker = ?1 ORDER BY fiscal_year ASC, fiscal_quarter ASC, metric ASC",
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let rows = stmt
            .query_map(params![canonical_ticker(ticker)], Self::row_to_record)
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut records = Vec::new();
        for row in rows {
            let Some(record) = row.map_err(|e| DomainError::Database(e.to_string()))? else {
                continue;
            };
            let in_window = filters.is_empty()
                || filters
                    .iter()
                    .any(|f| (f.start_year..=f.end_year).contains(&record.fiscal_year));
            if in_window {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn has_metrics(&self, ticker: &str) -> Result<bool, DomainError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let found: i64 = conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM metrics WHERE ticker = ?1)",
                params![canonical_ticker(ticker)],
                |row| row.get(0),
            )
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(found != 0)
    }
}
