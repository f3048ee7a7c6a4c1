//! The four response caches shared by the router.

pub mod bounded;

use crate::config::{CacheConfig, CacheSettings};
use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::entities::parsed_command::ParsedCommand;
use crate::domain::values::period::PeriodFilter;
use bounded::{BoundedCache, CacheStats};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    Reply,
    Context,
    Metrics,
    Summary,
}

impl CacheKind {
    pub const ALL: [CacheKind; 4] = [
        CacheKind::Reply,
        CacheKind::Context,
        CacheKind::Metrics,
        CacheKind::Summary,
    ];
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKind::Reply => write!(f, "reply"),
            CacheKind::Context => write!(f, "context"),
            CacheKind::Metrics => write!(f, "metrics"),
            CacheKind::Summary => write!(f, "summary"),
        }
    }
}

impl FromStr for CacheKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reply" => Ok(CacheKind::Reply),
            "context" => Ok(CacheKind::Context),
            "metrics" => Ok(CacheKind::Metrics),
            "summary" => Ok(CacheKind::Summary),
            _ => Err(format!("Unknown cache: {s}")),
        }
    }
}

/// Reply text plus the structured payload it was rendered from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedReply {
    pub reply: String,
    pub payload: Option<serde_json::Value>,
    /// Command the reply answered, when the prompt normalized to one.
    #[serde(default)]
    pub command: Option<ParsedCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MetricsKey {
    pub ticker: String,
    pub filters: Vec<PeriodFilter>,
}

impl MetricsKey {
    pub fn new(ticker: impl Into<String>, filters: Vec<PeriodFilter>) -> Self {
        Self {
            ticker: ticker.into(),
            filters,
        }
    }
}

/// Context-cache key: sorted, de-duplicated tickers joined by `,`.
pub fn context_key<S: AsRef<str>>(tickers: &[S]) -> String {
    let mut sorted: Vec<&str> = tickers.iter().map(|t| t.as_ref()).collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.join(",")
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheManagerStats {
    pub reply: CacheStats,
    pub context: CacheStats,
    pub metrics: CacheStats,
    pub summary: CacheStats,
}

pub struct CacheManager {
    reply: Mutex<BoundedCache<String, CachedReply>>,
    context: Mutex<BoundedCache<String, String>>,
    metrics: Mutex<BoundedCache<MetricsKey, Vec<MetricRecord>>>,
    summary: Mutex<BoundedCache<String, String>>,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(&CacheConfig::default())
    }
}

fn bounded<K: Eq + Hash + Clone, V: Clone>(s: &CacheSettings) -> Mutex<BoundedCache<K, V>> {
    Mutex::new(BoundedCache::new(s.ttl(), s.max_entries))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CacheManager {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            reply: bounded(&config.reply),
            context: bounded(&config.context),
            metrics: bounded(&config.metrics),
            summary: bounded(&config.summary),
        }
    }

    pub fn get_reply(&self, key: &str) -> Option<CachedReply> {
        let hit = lock(&self.reply).get(&key.to_string());
        debug!(cache = "reply", key, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn put_reply(&self, key: &str, value: CachedReply) {
        lock(&self.reply).put(key.to_string(), value);
    }

    pub fn get_context<S: AsRef<str>>(&self, tickers: &[S]) -> Option<String> {
        let key = context_key(tickers);
        let hit = lock(&self.context).get(&key);
        debug!(cache = "context", key = %key, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn put_context<S: AsRef<str>>(&self, tickers: &[S], context: String) {
        lock(&self.context).put(context_key(tickers), context);
    }

    pub fn get_metrics(&self, key: &MetricsKey) -> Option<Vec<MetricRecord>> {
        let hit = lock(&self.metrics).get(key);
        debug!(cache = "metrics", ticker = %key.ticker, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn put_metrics(&self, key: MetricsKey, records: Vec<MetricRecord>) {
        lock(&self.metrics).put(key, records);
    }

    pub fn get_summary(&self, ticker: &str) -> Option<String> {
        let hit = lock(&self.summary).get(&ticker.to_string());
        debug!(cache = "summary", ticker, hit = hit.is_some(), "cache lookup");
        hit
    }

    pub fn put_summary(&self, ticker: &str, narrative: String) {
        lock(&self.summary).put(ticker.to_string(), narrative);
    }

    pub fn clear(&self, kind: CacheKind) {
        match kind {
            CacheKind::Reply => lock(&self.reply).clear(),
            CacheKind::Context => lock(&self.context).clear(),
            CacheKind::Metrics => lock(&self.metrics).clear(),
            CacheKind::Summary => lock(&self.summary).clear(),
        }
        debug!(cache = %kind, "cache cleared");
    }

    pub fn clear_all(&self) {
        for kind in CacheKind::ALL {
            self.clear(kind);
        }
    }

    pub fn len(&self, kind: CacheKind) -> usize {
        match kind {
            CacheKind::Reply => lock(&self.reply).len(),
            CacheKind::Context => lock(&self.context).len(),
            CacheKind::Metrics => lock(&self.metrics).len(),
            CacheKind::Summary => lock(&self.summary).len(),
        }
    }

    pub fn stats(&self) -> CacheManagerStats {
        CacheManagerStats {
            reply: lock(&self.reply).stats(),
            context: lock(&self.context).stats(),
            metrics: lock(&self.metrics).stats(),
            summary: lock(&self.summary).stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::values::metric_key::MetricKey;
    use crate::domain::values::period::Period;

    #[test]
    fn context_key_ignores_order_and_duplicates() {
        assert_eq!(context_key(&["MSFT", "AAPL", "MSFT"]), "AAPL,MSFT");
        assert_eq!(context_key::<&str>(&[]), "");
    }

    #[test]
    fn caches_are_independent() {
        let caches = CacheManager::default();
        caches.put_reply("fact AAPL 2023 revenue", CachedReply {
            reply: "AAPL revenue 2023: 383,285,000,000".into(),
            payload: None,
            command: None,
        });
        caches.put_summary("AAPL", "Apple narrative".into());
        caches.put_context(&["AAPL", "MSFT"], "ctx".into());

        caches.clear(CacheKind::Reply);
        assert!(caches.get_reply("fact AAPL 2023 revenue").is_none());
        assert_eq!(caches.get_summary("AAPL").as_deref(), Some("Apple narrative"));
        assert_eq!(caches.get_context(&["MSFT", "AAPL"]).as_deref(), Some("ctx"));
    }

    #[test]
    fn metrics_key_includes_filters() {
        let caches = CacheManager::default();
        let k2023 = MetricsKey::new("AAPL", Period::year(2023).filters());
        let k2022 = MetricsKey::new("AAPL", Period::year(2022).filters());
        caches.put_metrics(k2023.clone(), vec![MetricRecord::annual(
            "AAPL",
            MetricKey::Revenue,
            2023,
            1.0,
        )]);
        assert_eq!(caches.get_metrics(&k2023).map(|r| r.len()), Some(1));
        assert!(caches.get_metrics(&k2022).is_none());
    }

    #[test]
    fn clear_all_empties_every_cache() {
        let caches = CacheManager::default();
        caches.put_reply("k", CachedReply {
            reply: "r".into(),
            payload: None,
            command: None,
        });
        caches.put_summary("AAPL", "s".into());
        caches.put_context(&["AAPL"], "c".into());
        caches.put_metrics(MetricsKey::new("AAPL", vec![]), vec![]);

        caches.clear_all();
        for kind in CacheKind::ALL {
            assert_eq!(caches.len(kind), 0, "{kind} not cleared");
        }
    }

    #[test]
    fn respects_configured_bounds() {
        let mut config = CacheConfig::default();
        config.summary = CacheSettings::new(600, 1);
        let caches = CacheManager::new(&config);
        caches.put_summary("AAPL", "a".into());
        caches.put_summary("MSFT", "m".into());
        assert!(caches.get_summary("AAPL").is_none());
        assert_eq!(caches.stats().summary.evictions, 1);
    }

    #[test]
    fn kind_round_trips_through_text() {
        for kind in CacheKind::ALL {
            assert_eq!(kind.to_string().parse::<CacheKind>().unwrap(), kind);
        }
        assert!("bogus".parse::<CacheKind>().is_err());
    }
}
