//! Per-turn request handling: reply cache, normalization, execution.

use crate::application::cache::{CacheKind, CacheManager, CachedReply, MetricsKey};
use crate::application::normalizer::cacheability::is_cacheable;
use crate::application::normalizer::CommandNormalizer;
use crate::application::resolver::EntityResolver;
use crate::domain::entities::message::{Message, Role};
use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::entities::parsed_command::ParsedCommand;
use crate::domain::error::DomainError;
use crate::domain::ports::completion_port::CompletionProvider;
use crate::domain::ports::message_store::MessageStore;
use crate::domain::ports::metrics_store::MetricsStore;
use crate::domain::ports::narrative_port::NarrativeGenerator;
use crate::domain::values::metric_key::MetricKey;
use crate::domain::values::period::Period;
use crate::domain::values::verb::Verb;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "You are a financial analysis assistant. Answer from the company \
data provided in the context. Say so when the context does not contain the answer.";

const HISTORY_TURNS: usize = 6;

/// Metrics shown by `compare` when the command names none.
const COMPARE_DEFAULTS: [MetricKey; 3] = [MetricKey::Revenue, MetricKey::NetIncome, MetricKey::Eps];

static DISCLAIMER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(not (?:intended as )?financial advice|for informational purposes only|i(?:'m| am) not a (?:licensed )?financial advis[eo]r|consult (?:a|your) (?:licensed )?financial (?:advis[eo]r|professional)|as an ai(?: language model)?)",
    )
    .expect("disclaimer regex")
});

/// Whether `text` carries boilerplate that must never be replayed from cache.
pub fn has_disclaimer(text: &str) -> bool {
    DISCLAIMER.is_match(text)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Cache,
    Structured,
    FreeForm,
    Delegated,
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouterReply {
    pub text: String,
    pub source: ReplySource,
    pub command: Option<ParsedCommand>,
    pub payload: Option<serde_json::Value>,
}

impl RouterReply {
    fn new(text: String, source: ReplySource, command: Option<ParsedCommand>) -> Self {
        Self {
            text,
            source,
            command,
            payload: None,
        }
    }

    fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }
}

pub struct QueryRouter {
    normalizer: Arc<CommandNormalizer>,
    resolver: Arc<EntityResolver>,
    caches: Arc<CacheManager>,
    metrics: Arc<dyn MetricsStore>,
    narrator: Arc<dyn NarrativeGenerator>,
    completion: Arc<dyn CompletionProvider>,
    messages: Arc<dyn MessageStore>,
}

impl QueryRouter {
    pub fn new(
        normalizer: Arc<CommandNormalizer>,
        resolver: Arc<EntityResolver>,
        caches: Arc<CacheManager>,
        metrics: Arc<dyn MetricsStore>,
        narrator: Arc<dyn NarrativeGenerator>,
        completion: Arc<dyn CompletionProvider>,
        messages: Arc<dyn MessageStore>,
    ) -> Self {
        Self {
            normalizer,
            resolver,
            caches,
            metrics,
            narrator,
            completion,
            messages,
        }
    }

    pub async fn handle(&self, text: &str) -> Result<RouterReply, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::InvalidInput("Empty query".into()));
        }

        let prompt_key = prompt_key(text);
        if let Some(reply) = self.cached(&prompt_key, text, None) {
            return Ok(reply);
        }

        let command = self
            .normalizer
            .normalize(text)
            .or_else(|| ParsedCommand::parse_canonical(text));
        let key = match &command {
            Some(cmd) => cmd.canonical(),
            None => collapse(text),
        };
        let cacheable = is_cacheable(&key);

        if cacheable {
            if let Some(reply) = self.cached(&key, text, command.as_ref()) {
                return Ok(reply);
            }
        }

        let reply = match &command {
            Some(cmd) => self.execute(cmd).await?,
            None => self.free_form(text).await?,
        };
        info!(key = %key, source = ?reply.source, "routed");

        if cacheable && reply.source != ReplySource::NotFound && !has_disclaimer(&reply.text) {
            let cached = CachedReply {
                reply: reply.text.clone(),
                payload: reply.payload.clone(),
                command: command.clone(),
            };
            self.caches.put_reply(&prompt_key, cached.clone());
            self.caches.put_reply(&key, cached);
        }

        self.persist(text, &reply.text);
        Ok(reply)
    }

    /// Replays the reply stored under `key`. A stored disclaimer is never
    /// replayed; it clears every cache instead.
    fn cached(&self, key: &str, text: &str, command: Option<&ParsedCommand>) -> Option<RouterReply> {
        let hit = self.caches.get_reply(key)?;
        if has_disclaimer(&hit.reply) {
            warn!(key, "cached reply carries a disclaimer, clearing caches");
            self.caches.clear_all();
            return None;
        }
        info!(key, source = "cache", "routed");
        let reply = RouterReply {
            text: hit.reply,
            source: ReplySource::Cache,
            command: hit.command.or_else(|| command.cloned()),
            payload: hit.payload,
        };
        self.persist(text, &reply.text);
        Some(reply)
    }

    /// Runs a structured command, bypassing the reply cache.
    pub async fn execute(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        if cmd.verb != Verb::Ingest {
            for ticker in &cmd.tickers {
                if !self.is_known(ticker)? {
                    return Ok(RouterReply::new(
                        format!("Ticker not found: {ticker}"),
                        ReplySource::NotFound,
                        Some(cmd.clone()),
                    ));
                }
            }
        }

        match cmd.verb {
            Verb::Fact | Verb::FactRange => self.fact(cmd),
            Verb::Metrics => self.metrics_overview(cmd),
            Verb::Compare => self.compare(cmd),
            Verb::Audit => self.audit(cmd),
            Verb::Summary => self.summary(cmd).await,
            Verb::Scenario => self.scenario(cmd).await,
            Verb::Ingest => Ok(self.ingest(cmd)),
        }
    }

    fn is_known(&self, ticker: &str) -> Result<bool, DomainError> {
        Ok(self.resolver.knows_ticker(ticker) || self.metrics.has_metrics(ticker)?)
    }

    /// Records for `ticker` within `period`, through the metrics cache.
    fn records(&self, ticker: &str, period: Option<Period>) -> Result<Vec<MetricRecord>, DomainError> {
        let filters = period.map(|p| p.filters()).unwrap_or_default();
        let key = MetricsKey::new(ticker, filters);
        let records = match self.caches.get_metrics(&key) {
            Some(records) => records,
            None => {
                let fetched = self.metrics.fetch_metrics(ticker, &key.filters)?;
                debug!(ticker, count = fetched.len(), "fetched metrics");
                self.caches.put_metrics(key, fetched.clone());
                fetched
            }
        };
        Ok(match period {
            Some(p) => records
                .into_iter()
                .filter(|r| p.contains(r.fiscal_year, r.fiscal_quarter))
                .collect(),
            None => records,
        })
    }

    /// Annual records of the latest fiscal year on file.
    fn latest_annual(&self, ticker: &str) -> Result<Vec<MetricRecord>, DomainError> {
        let annual: Vec<MetricRecord> = self
            .records(ticker, None)?
            .into_iter()
            .filter(|r| r.fiscal_quarter.is_none())
            .collect();
        let Some(latest) = annual.iter().map(|r| r.fiscal_year).max() else {
            return Ok(Vec::new());
        };
        Ok(annual.into_iter().filter(|r| r.fiscal_year == latest).collect())
    }

    fn fact(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let (Some(ticker), Some(period), Some(metric)) = (cmd.primary_ticker(), cmd.period, cmd.metric) else {
            return Err(DomainError::InvalidInput(format!("Incomplete command: {}", cmd.canonical())));
        };
        let mut records: Vec<MetricRecord> = self
            .records(ticker, Some(period))?
            .into_iter()
            .filter(|r| r.metric == metric)
            .collect();
        sort_records(&mut records);

        let text = if records.is_empty() {
            format!("No {} data for {ticker} in {period}.", metric.label())
        } else {
            render_records(&records)
        };
        Ok(RouterReply::new(text, ReplySource::Structured, Some(cmd.clone()))
            .with_payload(json!({ "records": records })))
    }

    fn metrics_overview(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let mut sections = Vec::new();
        let mut all = Vec::new();
        for ticker in &cmd.tickers {
            let mut records = match cmd.period {
                Some(p) => self.records(ticker, Some(p))?,
                None => self.latest_annual(ticker)?,
            };
            if let Some(metric) = cmd.metric {
                records.retain(|r| r.metric == metric);
            }
            sort_records(&mut records);
            if records.is_empty() {
                sections.push(format!("{ticker}: no data on file."));
            } else {
                sections.push(render_records(&records));
            }
            all.extend(records);
        }
        Ok(RouterReply::new(sections.join("\n"), ReplySource::Structured, Some(cmd.clone()))
            .with_payload(json!({ "records": all })))
    }

    fn compare(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let wanted: Vec<MetricKey> = match cmd.metric {
            Some(m) => vec![m],
            None => COMPARE_DEFAULTS.to_vec(),
        };

        let mut rows = Vec::new();
        let mut table = serde_json::Map::new();
        for ticker in &cmd.tickers {
            let records = match cmd.period {
                Some(p) => self.records(ticker, Some(p))?,
                None => self.latest_annual(ticker)?,
            };
            let mut cells = serde_json::Map::new();
            let mut parts = Vec::new();
            for metric in &wanted {
                let mut matching: Vec<&MetricRecord> = records.iter().filter(|r| r.metric == *metric).collect();
                matching.sort_by_key(|r| (r.fiscal_year, r.fiscal_quarter));
                match matching.last() {
                    Some(r) => {
                        parts.push(format!("{} {} ({})", metric.label(), r.display_value(), r.period_label()));
                        cells.insert(metric.as_str().to_string(), json!(r.value));
                    }
                    None => {
                        parts.push(format!("{} n/a", metric.label()));
                        cells.insert(metric.as_str().to_string(), serde_json::Value::Null);
                    }
                }
            }
            rows.push(format!("{ticker}: {}", parts.join("; ")));
            table.insert(ticker.clone(), serde_json::Value::Object(cells));
        }

        Ok(RouterReply::new(rows.join("\n"), ReplySource::Structured, Some(cmd.clone()))
            .with_payload(json!({ "comparison": table })))
    }

    /// Coverage report: stored years and metrics with no values.
    fn audit(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let mut lines = Vec::new();
        let mut report = Vec::new();
        for ticker in &cmd.tickers {
            let records = self.metrics.fetch_metrics(ticker, &[])?;
            let years: BTreeSet<i32> = records.iter().map(|r| r.fiscal_year).collect();
            let present: BTreeSet<&str> = records.iter().map(|r| r.metric.as_str()).collect();
            let missing: Vec<&str> = MetricKey::ALL
                .iter()
                .map(|m| m.as_str())
                .filter(|m| !present.contains(m))
                .collect();

            let span = match (years.first(), years.last()) {
                (Some(a), Some(b)) => format!("{a}-{b}"),
                _ => "none".to_string(),
            };
            lines.push(format!(
                "{ticker}: {} records, years {span}, missing {}",
                records.len(),
                if missing.is_empty() { "nothing".to_string() } else { missing.join(", ") }
            ));
            report.push(json!({
                "ticker": ticker,
                "records": records.len(),
                "years": years,
                "missing": missing,
            }));
        }
        Ok(RouterReply::new(lines.join("\n"), ReplySource::Structured, Some(cmd.clone()))
            .with_payload(json!({ "audit": report })))
    }

    async fn summary(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let mut parts = Vec::new();
        for ticker in &cmd.tickers {
            let narrative = match self.caches.get_summary(ticker) {
                Some(cached) => cached,
                None => {
                    let fresh = self.narrator.generate_summary(ticker).await?;
                    self.caches.put_summary(ticker, fresh.clone());
                    fresh
                }
            };
            parts.push(narrative);
        }
        Ok(RouterReply::new(parts.join("\n\n"), ReplySource::Structured, Some(cmd.clone())))
    }

    async fn scenario(&self, cmd: &ParsedCommand) -> Result<RouterReply, DomainError> {
        let context = self.context_for(&cmd.tickers)?;
        let scenario = if cmd.arguments.is_empty() {
            "base case".to_string()
        } else {
            cmd.arguments.join(" ")
        };
        let prompt = format!(
            "Context:\n{context}\n\nDescribe the {scenario} scenario for {}.",
            cmd.tickers.join(", ")
        );
        let text = self.completion.complete(SYSTEM_PROMPT, &prompt).await?;
        Ok(RouterReply::new(text, ReplySource::Structured, Some(cmd.clone())))
    }

    fn ingest(&self, cmd: &ParsedCommand) -> RouterReply {
        for kind in [CacheKind::Metrics, CacheKind::Context, CacheKind::Summary] {
            self.caches.clear(kind);
        }
        info!(command = %cmd.canonical(), "ingest delegated");
        RouterReply::new(
            format!("Delegated: {}", cmd.canonical()),
            ReplySource::Delegated,
            Some(cmd.clone()),
        )
    }

    async fn free_form(&self, text: &str) -> Result<RouterReply, DomainError> {
        let tickers = self.normalizer.detect_entities(text);
        let context = if tickers.is_empty() {
            String::new()
        } else {
            self.context_for(&tickers)?
        };

        let history = match self.messages.recent(HISTORY_TURNS) {
            Ok(turns) => turns
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                warn!(error = %e, "could not load conversation history");
                String::new()
            }
        };

        let mut prompt = String::new();
        if !history.is_empty() {
            prompt.push_str(&format!("Conversation so far:\n{history}\n\n"));
        }
        if !context.is_empty() {
            prompt.push_str(&format!("Context:\n{context}\n\n"));
        }
        prompt.push_str(&format!("Question: {text}"));

        let answer = self.completion.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!(provider = self.completion.name(), tickers = ?tickers, "free-form completion");
        Ok(RouterReply::new(answer, ReplySource::FreeForm, None))
    }

    /// Latest annual figures for each ticker, through the context cache.
    fn context_for(&self, tickers: &[String]) -> Result<String, DomainError> {
        if let Some(cached) = self.caches.get_context(tickers) {
            return Ok(cached);
        }
        let mut sections = Vec::new();
        for ticker in tickers {
            let mut records = self.latest_annual(ticker)?;
            sort_records(&mut records);
            if records.is_empty() {
                sections.push(format!("{ticker}: no data on file."));
            } else {
                sections.push(render_records(&records));
            }
        }
        let context = sections.join("\n");
        self.caches.put_context(tickers, context.clone());
        Ok(context)
    }

    fn persist(&self, question: &str, answer: &str) {
        for message in [
            Message::new(Role::User, question.to_string()),
            Message::new(Role::Assistant, answer.to_string()),
        ] {
            if let Err(e) = self.messages.append(&message) {
                warn!(error = %e, role = %message.role, "failed to persist message");
            }
        }
    }
}

/// Lower-cased text with whitespace runs collapsed; the reply-cache key
/// for prompts that did not normalize.
/// Reply-cache key for the prompt as typed, kept apart from canonical keys.
pub fn prompt_key(text: &str) -> String {
    format!("prompt:{}", collapse(text))
}

pub fn collapse(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn sort_records(records: &mut [MetricRecord]) {
    records.sort_by(|a, b| {
        (a.ticker.as_str(), a.fiscal_year, a.fiscal_quarter, a.metric.as_str())
            .cmp(&(b.ticker.as_str(), b.fiscal_year, b.fiscal_quarter, b.metric.as_str()))
    });
}

fn render_records(records: &[MetricRecord]) -> String {
    records
        .iter()
        .map(|r| {
            format!(
                "{} {} ({}): {}",
                r.ticker,
                r.metric.label(),
                r.period_label(),
                r.display_value()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
