pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

use crate::application::cache::{CacheKind, CacheManager, CacheManagerStats};
use crate::application::normalizer::CommandNormalizer;
use crate::application::resolver::alias_index::{FuzzyMatch, IndexStats, Resolution};
use crate::application::resolver::EntityResolver;
use crate::application::router::{QueryRouter, RouterReply};
use crate::config::{CompletionBackend, FinRouteConfig};
use crate::domain::entities::message::Message;
use crate::domain::entities::metric_record::MetricRecord;
use crate::domain::entities::parsed_command::ParsedCommand;
use crate::domain::error::DomainError;
use crate::domain::ports::completion_port::CompletionProvider;
use crate::domain::ports::message_store::MessageStore;
use crate::domain::ports::metrics_store::MetricsStore;
use crate::domain::ports::narrative_port::NarrativeGenerator;
use crate::domain::values::normalized_name::NormalizedName;
use crate::domain::values::verb::Verb;
use crate::infrastructure::completion::noop::NoopCompletion;
use crate::infrastructure::completion::openai::OpenAiCompletion;
use crate::infrastructure::narrative::metrics_narrator::MetricsNarrator;
use crate::infrastructure::sqlite::alias_repo::{parse_alias_csv, SqliteAliasRepo};
use crate::infrastructure::sqlite::message_repo::SqliteMessageRepo;
use crate::infrastructure::sqlite::metrics_repo::SqliteMetricsRepo;
use crate::infrastructure::sqlite::migrations::run_migrations;
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct FinRoute {
    resolver: Arc<EntityResolver>,
    normalizer: Arc<CommandNormalizer>,
    caches: Arc<CacheManager>,
    router: QueryRouter,
    alias_repo: Arc<SqliteAliasRepo>,
    metrics_repo: Arc<SqliteMetricsRepo>,
    messages: Arc<dyn MessageStore>,
}

fn open(db_path: &str) -> Result<Connection, DomainError> {
    let conn = Connection::open(db_path).map_err(|e| DomainError::Database(format!("DB error: {e}")))?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .map_err(|e| DomainError::Database(format!("WAL error: {e}")))?;
    // each connection to ":memory:" is its own database
    run_migrations(&conn)?;
    Ok(conn)
}

impl FinRoute {
    /// Opens `db_path` with the rest of the configuration taken from the environment.
    pub fn new(db_path: &str) -> Result<Self, DomainError> {
        let mut config = FinRouteConfig::from_env()?;
        config.db_path = db_path.to_string();
        Self::from_config(config)
    }

    pub fn from_config(config: FinRouteConfig) -> Result<Self, DomainError> {
        let completion: Arc<dyn CompletionProvider> = match &config.completion {
            CompletionBackend::OpenAi { api_key, model } => {
                Arc::new(OpenAiCompletion::new(api_key.clone(), model.clone()))
            }
            CompletionBackend::Noop => Arc::new(NoopCompletion),
        };
        Self::with_collaborators(config, completion, None)
    }

    /// Default configuration with an explicit completion provider.
    pub fn with_providers(
        db_path: &str,
        completion: Arc<dyn CompletionProvider>,
    ) -> Result<Self, DomainError> {
        let config = FinRouteConfig {
            db_path: db_path.to_string(),
            ..FinRouteConfig::default()
        };
        Self::with_collaborators(config, completion, None)
    }

    /// Full wiring. Without a narrator, summaries come from stored metrics.
    pub fn with_collaborators(
        config: FinRouteConfig,
        completion: Arc<dyn CompletionProvider>,
        narrator: Option<Arc<dyn NarrativeGenerator>>,
    ) -> Result<Self, DomainError> {
        let alias_repo = Arc::new(SqliteAliasRepo::new(open(&config.db_path)?));
        let metrics_repo = Arc::new(SqliteMetricsRepo::new(open(&config.db_path)?));
        let messages: Arc<dyn MessageStore> = Arc::new(SqliteMessageRepo::new(open(&config.db_path)?));
        let metrics: Arc<dyn MetricsStore> = metrics_repo.clone();

        let narrator: Arc<dyn NarrativeGenerator> = match narrator {
            Some(n) => n,
            None => Arc::new(MetricsNarrator::new(metrics.clone())),
        };
        let resolver = Arc::new(EntityResolver::new(alias_repo.clone(), config.corporate_suffixes.clone()));
        let normalizer = Arc::new(CommandNormalizer::new(resolver.clone(), Some(metrics.clone())));
        let caches = Arc::new(CacheManager::new(&config.caches));

        info!(db = %config.db_path, completion = completion.name(), "finroute ready");

        Ok(Self {
            router: QueryRouter::new(
                normalizer.clone(),
                resolver.clone(),
                caches.clone(),
                metrics,
                narrator,
                completion,
                messages.clone(),
            ),
            resolver,
            normalizer,
            caches,
            alias_repo,
            metrics_repo,
            messages,
        })
    }

    // Delegating methods
    pub async fn ask(&self, text: &str) -> Result<RouterReply, DomainError> {
        self.router.handle(text).await
    }

    pub fn parse(&self, text: &str) -> Option<ParsedCommand> {
        self.normalizer.normalize(text)
    }

    pub fn normalize_name(&self, phrase: &str) -> NormalizedName {
        self.resolver.normalize(phrase)
    }

    pub fn resolve(&self, phrase: &str) -> Option<Resolution> {
        self.resolver.resolve_detailed(phrase)
    }

    pub fn resolve_fuzzy(&self, phrase: &str, n: usize, cutoff: f64) -> Vec<FuzzyMatch> {
        self.resolver.resolve_fuzzy(phrase, n, cutoff)
    }

    /// Persists an alias. A new alias is usable as soon as this returns.
    pub fn add_alias(&self, name: &str, ticker: &str) -> Result<bool, DomainError> {
        let added = self.alias_repo.add_alias(name, ticker)?;
        if added {
            self.reload_aliases();
        }
        Ok(added)
    }

    pub fn import_aliases<P: AsRef<Path>>(&self, csv_path: P) -> Result<usize, DomainError> {
        let path = csv_path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| DomainError::InvalidInput(format!("Reading {}: {e}", path.display())))?;
        let pairs = parse_alias_csv(&content)?;
        let imported = self.alias_repo.import(&pairs)?;
        if imported > 0 {
            self.reload_aliases();
        }
        Ok(imported)
    }

    /// Rebuilds the alias index from the database. Replies keyed by prompt
    /// text may have resolved through the old index, so they are dropped.
    pub fn reload_aliases(&self) -> IndexStats {
        let stats = self.resolver.reload();
        self.caches.clear(CacheKind::Reply);
        stats
    }

    pub fn index_stats(&self) -> IndexStats {
        self.resolver.stats()
    }

    /// Stores a metric value and drops cached answers derived from metrics.
    pub fn add_metric(&self, record: &MetricRecord) -> Result<(), DomainError> {
        self.metrics_repo.upsert(record)?;
        self.caches.clear_all();
        Ok(())
    }

    pub async fn summary(&self, ticker: &str) -> Result<RouterReply, DomainError> {
        let cmd = ParsedCommand::new(Verb::Summary, vec![ticker.to_uppercase()]);
        self.router.execute(&cmd).await
    }

    pub fn history(&self, limit: usize) -> Result<Vec<Message>, DomainError> {
        self.messages.recent(limit)
    }

    pub fn caches(&self) -> &CacheManager {
        &self.caches
    }

    pub fn clear_cache(&self, kind: CacheKind) {
        self.caches.clear(kind)
    }

    pub fn clear_all_caches(&self) {
        self.caches.clear_all()
    }

    pub fn cache_stats(&self) -> CacheManagerStats {
        self.caches.stats()
    }
}
