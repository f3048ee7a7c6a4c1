//! Shared test helpers.
#![allow(dead_code)]

use finroute::application::cache::CacheManager;
use finroute::application::normalizer::CommandNormalizer;
use finroute::application::resolver::alias_index::AliasIndex;
use finroute::application::resolver::EntityResolver;
use finroute::application::router::QueryRouter;
use finroute::domain::entities::message::Message;
use finroute::domain::entities::metric_record::MetricRecord;
use finroute::domain::error::DomainError;
use finroute::domain::ports::completion_port::CompletionProvider;
use finroute::domain::ports::message_store::MessageStore;
use finroute::domain::ports::metrics_store::MetricsStore;
use finroute::domain::ports::narrative_port::NarrativeGenerator;
use finroute::domain::values::metric_key::MetricKey;
use finroute::domain::values::period::PeriodFilter;
use finroute::infrastructure::completion::noop::NoopCompletion;
use finroute::FinRoute;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn setup() -> FinRoute {
    FinRoute::with_providers(":memory:", Arc::new(NoopCompletion)).unwrap()
}

/// A few years of Apple and Microsoft figures.
pub fn sample_records() -> Vec<MetricRecord> {
    vec![
        MetricRecord::annual("AAPL", MetricKey::Revenue, 2020, 274_515_000_000.0),
        MetricRecord::annual("AAPL", MetricKey::Revenue, 2021, 365_817_000_000.0),
        MetricRecord::annual("AAPL", MetricKey::Revenue, 2022, 394_328_000_000.0),
        MetricRecord::annual("AAPL", MetricKey::Revenue, 2023, 383_285_000_000.0),
        MetricRecord::annual("AAPL", MetricKey::NetIncome, 2023, 96_995_000_000.0),
        MetricRecord::annual("AAPL", MetricKey::Eps, 2023, 6.13),
        MetricRecord::quarterly("AAPL", MetricKey::Revenue, 2023, 2, 81_797_000_000.0),
        MetricRecord::annual("MSFT", MetricKey::Revenue, 2022, 198_270_000_000.0),
        MetricRecord::annual("MSFT", MetricKey::Revenue, 2023, 211_915_000_000.0),
        MetricRecord::annual("MSFT", MetricKey::NetIncome, 2023, 72_361_000_000.0),
    ]
}

pub fn seed_metrics(fr: &FinRoute) {
    for record in sample_records() {
        fr.add_metric(&record).unwrap();
    }
}

/// In-memory metrics store counting every fetch and existence check.
#[derive(Default)]
pub struct CountingMetrics {
    pub records: Vec<MetricRecord>,
    pub fetches: AtomicUsize,
    pub checks: AtomicUsize,
}

impl CountingMetrics {
    pub fn new(records: Vec<MetricRecord>) -> Self {
        Self {
            records,
            fetches: AtomicUsize::new(0),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

impl MetricsStore for CountingMetrics {
    fn fetch_metrics(&self, ticker: &str, filters: &[PeriodFilter]) -> Result<Vec<MetricRecord>, DomainError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .records
            .iter()
            .filter(|r| r.ticker == ticker)
            .filter(|r| {
                filters.is_empty()
                    || filters
                        .iter()
                        .any(|f| (f.start_year..=f.end_year).contains(&r.fiscal_year))
            })
            .cloned()
            .collect())
    }

    fn has_metrics(&self, ticker: &str) -> Result<bool, DomainError> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        Ok(self.records.iter().any(|r| r.ticker == ticker))
    }
}

#[derive(Default)]
pub struct CountingNarrator {
    pub calls: AtomicUsize,
}

impl CountingNarrator {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl NarrativeGenerator for CountingNarrator {
    async fn generate_summary(&self, ticker: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{ticker} narrative"))
    }
}

/// Completion provider that always answers with the same text.
pub struct ScriptedCompletion {
    pub answer: String,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedCompletion {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, DomainError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub struct MemoryMessages {
    pub messages: Mutex<Vec<Message>>,
}

impl MessageStore for MemoryMessages {
    fn append(&self, message: &Message) -> Result<(), DomainError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<Message>, DomainError> {
        let all = self.messages.lock().unwrap();
        Ok(all[all.len().saturating_sub(limit)..].to_vec())
    }
}

/// Message store whose writes always fail.
pub struct BrokenMessages;

impl MessageStore for BrokenMessages {
    fn append(&self, _message: &Message) -> Result<(), DomainError> {
        Err(DomainError::Database("disk full".into()))
    }

    fn recent(&self, _limit: usize) -> Result<Vec<Message>, DomainError> {
        Err(DomainError::Database("disk full".into()))
    }
}

/// Router over seed aliases and in-memory collaborators.
pub struct Harness {
    pub router: QueryRouter,
    pub caches: Arc<CacheManager>,
    pub metrics: Arc<CountingMetrics>,
    pub narrator: Arc<CountingNarrator>,
    pub completion: Arc<ScriptedCompletion>,
    pub messages: Arc<MemoryMessages>,
}

pub fn harness(answer: &str) -> Harness {
    build_harness(answer, sample_records(), None)
}

pub fn harness_with_messages(answer: &str, messages: Option<Arc<dyn MessageStore>>) -> Harness {
    build_harness(answer, sample_records(), messages)
}

pub fn harness_with_records(answer: &str, records: Vec<MetricRecord>) -> Harness {
    build_harness(answer, records, None)
}

fn build_harness(
    answer: &str,
    records: Vec<MetricRecord>,
    messages: Option<Arc<dyn MessageStore>>,
) -> Harness {
    let metrics = Arc::new(CountingMetrics::new(records));
    let narrator = Arc::new(CountingNarrator::default());
    let completion = Arc::new(ScriptedCompletion::new(answer));
    let memory = Arc::new(MemoryMessages::default());
    let store: Arc<dyn MessageStore> = match messages {
        Some(store) => store,
        None => memory.clone(),
    };
    let metrics_store: Arc<dyn MetricsStore> = metrics.clone();

    let mut index = AliasIndex::default();
    for (name, ticker) in finroute::application::resolver::seed::SEED_ALIASES {
        index.register(name, ticker);
    }
    let resolver = Arc::new(EntityResolver::with_index(index));
    let normalizer = Arc::new(CommandNormalizer::new(resolver.clone(), Some(metrics_store.clone())));
    let caches = Arc::new(CacheManager::default());

    let router = QueryRouter::new(
        normalizer,
        resolver,
        caches.clone(),
        metrics_store,
        narrator.clone(),
        completion.clone(),
        store,
    );

    Harness {
        router,
        caches,
        metrics,
        narrator,
        completion,
        messages: memory,
    }
}
