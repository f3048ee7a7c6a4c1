//! Word lists and phrase detection shared by the normalizer stages.

use crate::domain::values::metric_key::MetricKey;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Lower-case filler words that never name a company.
static STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "against", "all", "an", "and", "annual", "any", "are", "as", "at", "be",
        "better", "between", "by", "can", "compare", "compared", "comparison", "company",
        "data", "did", "do", "does", "during", "each", "figure", "figures", "fiscal", "for",
        "from", "fy", "get", "give", "had", "has", "have", "how", "i", "in", "is", "it", "its",
        "last", "list", "look", "me", "much", "my", "number", "numbers", "of", "on", "or",
        "outperform", "outperformed", "please", "q1", "q2", "q3", "q4", "quarter",
        "quarterly", "relative", "report", "reported", "show", "stock", "tell", "than",
        "that", "the", "their", "them", "through", "to", "vs", "versus", "was", "were",
        "what", "whats", "which", "who", "with", "worse", "year", "years", "you",
    ]
    .into_iter()
    .collect()
});

/// Capitalized words shaped like tickers that are not tickers.
static CAPS_STOPLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "A", "AI", "AN", "AND", "ARE", "AS", "AT", "CEO", "CFO", "COO", "CTO", "DO", "EBITDA",
        "EPS", "ETF", "FCF", "FOR", "FY", "GAAP", "GDP", "HOW", "I", "IN", "IPO", "IS", "IT",
        "OF", "OK", "ON", "OR", "PE", "Q", "QOQ", "ROE", "SEC", "THE", "TO", "TTM", "US", "USA",
        "USD", "VS", "WHAT", "YOY",
    ]
    .into_iter()
    .collect()
});

/// Every word that appears in some metric alias.
static METRIC_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    MetricKey::ALL
        .iter()
        .flat_map(|m| m.aliases().iter())
        .flat_map(|alias| alias.split_whitespace())
        .collect()
});

struct MetricPattern {
    re: Regex,
    metric: MetricKey,
    len: usize,
}

static METRIC_PATTERNS: Lazy<Vec<MetricPattern>> = Lazy::new(|| {
    MetricKey::ALL
        .iter()
        .flat_map(|m| {
            m.aliases().iter().filter_map(move |alias| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(alias))).ok()?;
                Some(MetricPattern {
                    re,
                    metric: *m,
                    len: alias.len(),
                })
            })
        })
        .collect()
});

static COMPARISON_CUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(compare|compared|comparison|versus|vs\.?|against|relative to|better than|worse than|outperform\w*|and)\b",
    )
    .expect("comparison cue regex")
});

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

pub fn is_caps_stopword(token: &str) -> bool {
    CAPS_STOPLIST.contains(token)
}

pub fn is_metric_word(word: &str) -> bool {
    METRIC_WORDS.contains(word.to_lowercase().as_str())
}

pub fn has_comparison_cue(text: &str) -> bool {
    COMPARISON_CUE.is_match(text)
}

/// Metric alias found in text, with its byte span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricHit {
    pub metric: MetricKey,
    pub start: usize,
    pub end: usize,
}

/// Longest matching metric alias; earliest position breaks ties.
pub fn detect_metric(text: &str) -> Option<MetricHit> {
    let mut best: Option<(usize, MetricHit)> = None;
    for pattern in METRIC_PATTERNS.iter() {
        let Some(m) = pattern.re.find(text) else {
            continue;
        };
        let hit = MetricHit {
            metric: pattern.metric,
            start: m.start(),
            end: m.end(),
        };
        let better = match best {
            None => true,
            Some((len, prev)) => pattern.len > len || (pattern.len == len && hit.start < prev.start),
        };
        if better {
            best = Some((pattern.len, hit));
        }
    }
    best.map(|(_, hit)| hit)
}

/// Trims surrounding punctuation and a trailing possessive from a word.
pub fn clean_word(word: &str) -> &str {
    let trimmed = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '&');
    trimmed
        .strip_suffix("'s")
        .or_else(|| trimmed.strip_suffix("’s"))
        .map(|s| if s.is_empty() { trimmed } else { s })
        .unwrap_or(trimmed)
}
