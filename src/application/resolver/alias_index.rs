use crate::application::resolver::fuzzy::block_ratio;
use crate::domain::ports::alias_source::AliasPair;
use crate::domain::values::normalized_name::{NormalizedName, DEFAULT_CORPORATE_SUFFIXES};
use crate::domain::values::ticker::{canonical_ticker, has_class_suffix};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Shortest query allowed to match part of a name.
pub const MIN_PARTIAL_LEN: usize = 4;

/// Which resolution step produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Prefix,
    Substring,
    TokenOverlap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub ticker: String,
    pub kind: MatchKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuzzyMatch {
    pub ticker: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub names: usize,
    pub tickers: usize,
    /// Built from seed aliases only because the alias source failed.
    pub degraded: bool,
}

/// Name → ticker index. Immutable once built; replaced wholesale on reload.
///
/// Every key of `exact` also appears in `entries`. For duplicate names the
/// first-registered ticker is kept, except that a dual-class ticker
/// (`BRK-B`) gives way to a later plain-class one (`BRK`).
#[derive(Debug, Clone)]
pub struct AliasIndex {
    suffixes: Vec<String>,
    exact: HashMap<String, String>,
    entries: Vec<(NormalizedName, String)>,
    seen: HashSet<(String, String)>,
    tickers: HashSet<String>,
    degraded: bool,
}

impl Default for AliasIndex {
    fn default() -> Self {
        Self::new(
            DEFAULT_CORPORATE_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }
}

impl AliasIndex {
    pub fn new(suffixes: Vec<String>) -> Self {
        Self {
            suffixes,
            exact: HashMap::new(),
            entries: Vec::new(),
            seen: HashSet::new(),
            tickers: HashSet::new(),
            degraded: false,
        }
    }

    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = AliasPair>,
    {
        let mut index = Self::default();
        for pair in pairs {
            index.register(&pair.name, &pair.ticker);
        }
        index
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }

    pub fn normalize(&self, phrase: &str) -> NormalizedName {
        NormalizedName::with_suffixes(phrase, &self.suffixes)
    }

    /// Adds one alias. Empty names and tickers are ignored.
    pub fn register(&mut self, name: &str, ticker: &str) {
        let ticker = canonical_ticker(ticker);
        let key = self.normalize(name);
        if ticker.is_empty() || key.is_empty() {
            return;
        }
        self.tickers.insert(ticker.clone());

        if self.seen.insert((key.as_str().to_string(), ticker.clone())) {
            self.entries.push((key.clone(), ticker.clone()));
        }

        match self.exact.get_mut(key.as_str()) {
            None => {
                self.exact.insert(key.as_str().to_string(), ticker);
            }
            Some(existing) => {
                if has_class_suffix(existing) && !has_class_suffix(&ticker) {
                    *existing = ticker;
                }
            }
        }
    }

    pub(crate) fn mark_degraded(&mut self) {
        self.degraded = true;
    }

    pub fn knows_ticker(&self, ticker: &str) -> bool {
        self.tickers.contains(&canonical_ticker(ticker))
    }

    pub fn lookup_exact(&self, phrase: &str) -> Option<&str> {
        let key = self.normalize(phrase);
        self.exact.get(key.as_str()).map(String::as_str)
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            names: self.entries.len(),
            tickers: self.tickers.len(),
            degraded: self.degraded,
        }
    }

    /// Exact, then prefix, then substring, then best token overlap.
    pub fn resolve(&self, phrase: &str) -> Option<Resolution> {
        let query = self.normalize(phrase);
        if query.is_empty() {
            return None;
        }
        let q = query.as_str();

        if let Some(ticker) = self.exact.get(q) {
            return Some(Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Exact,
            });
        }

        if let Some((_, ticker)) = self.entries.iter().find(|(n, _)| n.as_str().starts_with(q)) {
            return Some(Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Prefix,
            });
        }

        if let Some((_, ticker)) = self.entries.iter().find(|(n, _)| n.as_str().contains(q)) {
            return Some(Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Substring,
            });
        }

        let query_tokens: HashSet<&str> = query.tokens().collect();
        let mut best: Option<(f64, &str)> = None;
        for (name, ticker) in &self.entries {
            let name_tokens: HashSet<&str> = name.tokens().collect();
            let shared = query_tokens.intersection(&name_tokens).count();
            if shared == 0 {
                continue;
            }
            let score = shared as f64 / query_tokens.len() as f64;
            // strictly greater: ties stay with the first-registered entry
            if best.map_or(true, |(s, _)| score > s) {
                best = Some((score, ticker));
            }
        }
        best.map(|(_, ticker)| Resolution {
            ticker: ticker.to_string(),
            kind: MatchKind::TokenOverlap,
        })
    }

    /// Exact match, or a name whose words start with (then contain) the
    /// query as whole words. Queries shorter than [`MIN_PARTIAL_LEN`]
    /// only match exactly.
    pub fn resolve_aligned(&self, phrase: &str) -> Option<Resolution> {
        let query = self.normalize(phrase);
        if query.is_empty() {
            return None;
        }
        if let Some(ticker) = self.exact.get(query.as_str()) {
            return Some(Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Exact,
            });
        }
        if query.as_str().len() < MIN_PARTIAL_LEN {
            return None;
        }

        let wanted: Vec<&str> = query.tokens().collect();
        let position = |name: &NormalizedName| {
            let tokens: Vec<&str> = name.tokens().collect();
            tokens.windows(wanted.len()).position(|w| w == wanted.as_slice())
        };
        if let Some((_, ticker)) = self.entries.iter().find(|(n, _)| position(n) == Some(0)) {
            return Some(Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Prefix,
            });
        }
        self.entries
            .iter()
            .find(|(n, _)| position(n).is_some())
            .map(|(_, ticker)| Resolution {
                ticker: ticker.clone(),
                kind: MatchKind::Substring,
            })
    }

    /// Ranked block-ratio matches at or above `cutoff`, one per ticker, at most `n`.
    pub fn resolve_fuzzy(&self, phrase: &str, n: usize, cutoff: f64) -> Vec<FuzzyMatch> {
        let query = self.normalize(phrase);
        if query.is_empty() || n == 0 {
            return Vec::new();
        }

        let mut scored: Vec<FuzzyMatch> = self
            .entries
            .iter()
            .filter_map(|(name, ticker)| {
                let score = block_ratio(query.as_str(), name.as_str());
                (score >= cutoff).then(|| FuzzyMatch {
                    ticker: ticker.clone(),
                    score,
                })
            })
            .collect();
        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut seen = HashSet::new();
        scored.retain(|m| seen.insert(m.ticker.clone()));
        scored.truncate(n);
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(pairs: &[(&str, &str)]) -> AliasIndex {
        AliasIndex::from_pairs(pairs.iter().map(|(n, t)| AliasPair::new(*n, *t)))
    }

    #[test]
    fn exact_beats_prefix() {
        let idx = index(&[("apple computer", "AAPL2"), ("apple", "AAPL")]);
        let r = idx.resolve("apple").unwrap();
        assert_eq!(r.ticker, "AAPL");
        assert_eq!(r.kind, MatchKind::Exact);
    }

    #[test]
    fn prefix_then_substring_then_overlap() {
        let idx = index(&[
            ("general motors", "GM"),
            ("american express", "AXP"),
            ("bank of new york mellon", "BK"),
        ]);
        assert_eq!(
            idx.resolve("general").unwrap(),
            Resolution {
                ticker: "GM".into(),
                kind: MatchKind::Prefix
            }
        );
        assert_eq!(
            idx.resolve("express").unwrap(),
            Resolution {
                ticker: "AXP".into(),
                kind: MatchKind::Substring
            }
        );
        assert_eq!(
            idx.resolve("mellon bank").unwrap(),
            Resolution {
                ticker: "BK".into(),
                kind: MatchKind::TokenOverlap
            }
        );
        assert!(idx.resolve("zzz").is_none());
        assert!(idx.resolve("   ").is_none());
    }

    #[test]
    fn aligned_resolution_needs_whole_words() {
        let idx = index(&[
            ("microsoft", "MSFT"),
            ("amazon", "AMZN"),
            ("alphabet", "GOOGL"),
            ("general motors", "GM"),
            ("bank of new york mellon", "BK"),
        ]);
        assert!(idx.resolve("so").is_some(), "plain resolve still matches inside words");
        for fragment in ["so", "am", "al", "micro", "ellon"] {
            assert!(idx.resolve_aligned(fragment).is_none(), "{fragment}");
        }
        assert_eq!(idx.resolve_aligned("amazon").unwrap().kind, MatchKind::Exact);
        assert_eq!(
            idx.resolve_aligned("general").unwrap(),
            Resolution {
                ticker: "GM".into(),
                kind: MatchKind::Prefix
            }
        );
        assert_eq!(
            idx.resolve_aligned("new york mellon").unwrap(),
            Resolution {
                ticker: "BK".into(),
                kind: MatchKind::Substring
            }
        );
        assert!(idx.resolve_aligned("mellon bank").is_none(), "no token overlap");
    }

    #[test]
    fn overlap_ties_go_to_first_registered() {
        let idx = index(&[("alpha one", "AAA"), ("alpha two", "BBB")]);
        // one shared token of two in both names
        let r = idx.resolve("alpha three").unwrap();
        assert_eq!(r.ticker, "AAA");
    }

    #[test]
    fn overlap_prefers_higher_score() {
        let idx = index(&[("first national", "FN"), ("first national bank", "FNB")]);
        let r = idx.resolve("national bank first").unwrap();
        assert_eq!(r.ticker, "FNB");
        assert_eq!(r.kind, MatchKind::TokenOverlap);
    }

    #[test]
    fn duplicate_names_keep_first_but_prefer_plain_class() {
        let idx = index(&[("Berkshire Hathaway", "BRK-B"), ("Berkshire Hathaway Inc", "BRK")]);
        assert_eq!(idx.lookup_exact("berkshire hathaway"), Some("BRK"));

        let idx = index(&[("Acme", "ACME"), ("Acme Corp", "ACM")]);
        assert_eq!(idx.lookup_exact("acme"), Some("ACME"));

        let idx = index(&[("Fox", "FOXA"), ("Fox Corp", "FOX-B")]);
        assert_eq!(idx.lookup_exact("fox"), Some("FOXA"));
    }

    #[test]
    fn every_exact_key_is_listed() {
        let idx = index(&[("Berkshire Hathaway", "BRK-B"), ("Berkshire Hathaway", "BRK")]);
        for (name, ticker) in &idx.exact {
            assert!(idx
                .entries
                .iter()
                .any(|(n, t)| n.as_str() == name && t == ticker));
        }
        assert_eq!(idx.stats().names, 2);
        assert_eq!(idx.stats().tickers, 2);
    }

    #[test]
    fn fuzzy_ranks_dedupes_and_truncates() {
        let idx = index(&[
            ("microsoft", "MSFT"),
            ("microsoft corp class a", "MSFT"),
            ("micron technology", "MU"),
            ("apple", "AAPL"),
        ]);
        let hits = idx.resolve_fuzzy("microsft", 5, 0.5);
        assert_eq!(hits[0].ticker, "MSFT");
        assert_eq!(hits.iter().filter(|m| m.ticker == "MSFT").count(), 1);
        assert!(hits.iter().all(|m| m.score >= 0.5));
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(!hits.iter().any(|m| m.ticker == "AAPL"));

        assert_eq!(idx.resolve_fuzzy("microsft", 1, 0.0).len(), 1);
        assert!(idx.resolve_fuzzy("", 5, 0.0).is_empty());
    }

    #[test]
    fn knows_registered_tickers() {
        let idx = index(&[("Berkshire", "brk.b")]);
        assert!(idx.knows_ticker("BRK-B"));
        assert!(idx.knows_ticker("brk.b"));
        assert!(!idx.knows_ticker("AAPL"));
    }
}
