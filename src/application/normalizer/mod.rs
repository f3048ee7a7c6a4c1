//! Natural-language text → canonical [`ParsedCommand`].
//!
//! An eligibility gate runs first; then every stage extracts what it can
//! and [`synthesize`] picks the verb. `None` means "handle as free-form".

pub mod cacheability;
pub mod gate;
pub mod lexicon;
pub mod stages;

use crate::application::resolver::alias_index::AliasIndex;
use crate::application::resolver::EntityResolver;
use crate::domain::entities::parsed_command::ParsedCommand;
use crate::domain::ports::metrics_store::MetricsStore;
use crate::domain::values::metric_key::MetricKey;
use crate::domain::values::period::Period;
use crate::domain::values::ticker::{canonical_ticker, is_ticker_symbol};
use crate::domain::values::verb::Verb;
use lexicon::{clean_word, detect_metric, has_comparison_cue, is_caps_stopword, is_metric_word, is_stopword};
use stages::{EntityStage, YearQuarterStage, YearRangeStage};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// A ticker found at a byte offset of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    pub position: usize,
    pub ticker: String,
}

/// What one stage recognised. Stages fill only the fields they own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub period: Option<Period>,
    /// Company resolved next to `period`.
    pub subject: Option<String>,
    pub metric: Option<MetricKey>,
    pub entities: Vec<Mention>,
}

impl Extraction {
    /// Earlier stages take precedence for period, subject and metric.
    pub fn absorb(&mut self, other: Extraction) {
        if self.period.is_none() && other.period.is_some() {
            self.period = other.period;
            self.subject = other.subject;
        }
        if self.metric.is_none() {
            self.metric = other.metric;
        }
        self.entities.extend(other.entities);
    }

    /// Distinct tickers by first appearance; a period subject that no
    /// other stage saw is appended.
    pub fn tickers(&self) -> Vec<String> {
        let mut mentions = self.entities.clone();
        mentions.sort_by_key(|m| m.position);
        let mut seen = HashSet::new();
        let mut tickers: Vec<String> = mentions
            .into_iter()
            .filter(|m| seen.insert(m.ticker.clone()))
            .map(|m| m.ticker)
            .collect();
        if let Some(subject) = &self.subject {
            if !tickers.contains(subject) {
                tickers.push(subject.clone());
            }
        }
        tickers
    }
}

/// Read-only view handed to each stage for one normalization pass.
pub struct StageContext<'a> {
    pub index: &'a AliasIndex,
    pub metrics: Option<&'a dyn MetricsStore>,
}

impl StageContext<'_> {
    /// The index knows the symbol or the metrics store holds data for it.
    pub fn is_known_ticker(&self, token: &str) -> bool {
        if self.index.knows_ticker(token) {
            return true;
        }
        let Some(store) = self.metrics else {
            return false;
        };
        match store.has_metrics(&canonical_ticker(token)) {
            Ok(found) => found,
            Err(e) => {
                debug!(token, error = %e, "metrics lookup failed while validating ticker");
                false
            }
        }
    }

    /// Resolves the longest company phrase in a word window. Stop-words,
    /// metric words and numeric tokens are dropped first. Partial names
    /// must line up with whole words of a registered name.
    pub fn resolve_window(&self, words: &[&str]) -> Option<String> {
        let words: Vec<&str> = words
            .iter()
            .map(|w| clean_word(w))
            .filter(|w| {
                !w.is_empty()
                    && !w.chars().any(|c| c.is_ascii_digit())
                    && !is_stopword(w)
                    && !is_metric_word(w)
            })
            .collect();

        for len in (1..=words.len()).rev() {
            for start in 0..=words.len() - len {
                let slice = &words[start..start + len];
                if len == 1 && is_ticker_symbol(slice[0]) && !is_caps_stopword(slice[0]) {
                    if self.is_known_ticker(slice[0]) {
                        return Some(canonical_ticker(slice[0]));
                    }
                    continue;
                }
                if let Some(hit) = self.index.resolve_aligned(&slice.join(" ")) {
                    return Some(hit.ticker);
                }
            }
        }
        None
    }
}

/// One independent extraction pass over the raw text.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, text: &str, ctx: &StageContext<'_>) -> Extraction;
}

pub struct CommandNormalizer {
    resolver: Arc<EntityResolver>,
    metrics: Option<Arc<dyn MetricsStore>>,
    stages: Vec<Box<dyn Stage>>,
}

impl CommandNormalizer {
    pub fn new(resolver: Arc<EntityResolver>, metrics: Option<Arc<dyn MetricsStore>>) -> Self {
        Self {
            resolver,
            metrics,
            stages: vec![
                Box::new(YearRangeStage),
                Box::new(YearQuarterStage),
                Box::new(EntityStage),
            ],
        }
    }

    pub fn normalize(&self, text: &str) -> Option<ParsedCommand> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if let Some(reason) = gate::check(text) {
            debug!(%reason, "normalizer gate closed");
            return None;
        }

        let extraction = self.extract(text);
        let command = synthesize(text, &extraction);
        debug!(
            verb = command.as_ref().map(|c| c.verb.as_str()),
            tickers = ?extraction.tickers(),
            "normalized"
        );
        command
    }

    /// Runs every stage and merges the results in stage order.
    pub fn extract(&self, text: &str) -> Extraction {
        let index = self.resolver.index();
        let ctx = StageContext {
            index: &index,
            metrics: self.metrics.as_deref(),
        };
        let mut merged = Extraction::default();
        for stage in &self.stages {
            let part = stage.extract(text, &ctx);
            debug!(stage = stage.name(), ?part, "stage extraction");
            merged.absorb(part);
        }
        merged
    }

    /// Tickers mentioned anywhere in `text`, gate rules not applied.
    pub fn detect_entities(&self, text: &str) -> Vec<String> {
        self.extract(text).tickers()
    }
}

/// Verb choice from the merged extraction.
///
/// One entity with a period gives `fact`/`fact-range`; several entities
/// with a comparison cue give `compare`; any entity gives `metrics`.
pub fn synthesize(text: &str, extraction: &Extraction) -> Option<ParsedCommand> {
    let tickers = extraction.tickers();
    let metric = extraction
        .metric
        .or_else(|| detect_metric(text).map(|h| h.metric));

    match (tickers.len(), extraction.period) {
        (0, _) => None,
        (1, Some(period)) => Some(ParsedCommand::fact(
            tickers[0].clone(),
            period,
            metric.unwrap_or(MetricKey::DEFAULT),
        )),
        (n, period) if n >= 2 && has_comparison_cue(text) => Some(
            ParsedCommand::new(Verb::Compare, tickers)
                .with_period(period)
                .with_metric(metric),
        ),
        (_, period) => Some(
            ParsedCommand::new(Verb::Metrics, tickers)
                .with_period(period)
                .with_metric(metric),
        ),
    }
}
