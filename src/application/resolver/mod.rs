//! Company phrase → ticker resolution.
//!
//! The index is built from the built-in seed table followed by the alias
//! source. Readers take an `Arc` snapshot; `reload` builds a complete
//! replacement before swapping it in.

pub mod alias_index;
pub mod fuzzy;
pub mod seed;

use crate::domain::error::DomainError;
use crate::domain::ports::alias_source::AliasSource;
use crate::domain::values::normalized_name::NormalizedName;
use alias_index::{AliasIndex, FuzzyMatch, IndexStats, Resolution};
use seed::SEED_ALIASES;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

pub struct EntityResolver {
    source: Option<Arc<dyn AliasSource>>,
    suffixes: Vec<String>,
    index: RwLock<Arc<AliasIndex>>,
}

impl EntityResolver {
    pub fn new(source: Arc<dyn AliasSource>, suffixes: Vec<String>) -> Self {
        let index = build_index(Some(source.as_ref()), &suffixes);
        Self {
            source: Some(source),
            suffixes,
            index: RwLock::new(Arc::new(index)),
        }
    }

    /// Resolver over a prebuilt index, without an alias source. `reload`
    /// rebuilds from the seed table only.
    pub fn with_index(index: AliasIndex) -> Self {
        Self {
            source: None,
            suffixes: index.suffixes().to_vec(),
            index: RwLock::new(Arc::new(index)),
        }
    }

    /// Current index snapshot.
    pub fn index(&self) -> Arc<AliasIndex> {
        match self.index.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn normalize(&self, phrase: &str) -> NormalizedName {
        NormalizedName::with_suffixes(phrase, &self.suffixes)
    }

    pub fn resolve(&self, phrase: &str) -> Option<String> {
        self.resolve_detailed(phrase).map(|r| r.ticker)
    }

    pub fn resolve_detailed(&self, phrase: &str) -> Option<Resolution> {
        let hit = self.index().resolve(phrase);
        debug!(phrase, hit = ?hit, "resolve");
        hit
    }

    /// Slow, imprecise fallback for when `resolve` misses.
    pub fn resolve_fuzzy(&self, phrase: &str, n: usize, cutoff: f64) -> Vec<FuzzyMatch> {
        self.index().resolve_fuzzy(phrase, n, cutoff)
    }

    pub fn knows_ticker(&self, ticker: &str) -> bool {
        self.index().knows_ticker(ticker)
    }

    pub fn stats(&self) -> IndexStats {
        self.index().stats()
    }

    /// Rebuilds the index from the alias source and swaps it in.
    pub fn reload(&self) -> IndexStats {
        let fresh = Arc::new(build_index(self.source.as_deref(), &self.suffixes));
        let stats = fresh.stats();
        match self.index.write() {
            Ok(mut guard) => *guard = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!(names = stats.names, tickers = stats.tickers, degraded = stats.degraded, "alias index reloaded");
        stats
    }
}

fn build_index(source: Option<&dyn AliasSource>, suffixes: &[String]) -> AliasIndex {
    let mut index = AliasIndex::new(suffixes.to_vec());
    for (name, ticker) in SEED_ALIASES {
        index.register(name, ticker);
    }

    if let Some(source) = source {
        match source.load_aliases() {
            Ok(pairs) => {
                for pair in &pairs {
                    index.register(&pair.name, &pair.ticker);
                }
            }
            Err(e) => {
                let e = DomainError::IndexUnavailable(e.to_string());
                warn!(error = %e, "alias source failed, serving seed aliases only");
                index.mark_degraded();
            }
        }
    }

    let stats = index.stats();
    info!(names = stats.names, tickers = stats.tickers, "alias index built");
    index
}
