//! The extraction stages run by [`CommandNormalizer`](super::CommandNormalizer).

use super::lexicon::{clean_word, detect_metric, is_caps_stopword, is_stopword};
use super::{Extraction, Mention, Stage, StageContext};
use crate::domain::values::period::{is_valid_year, Period};
use crate::domain::values::ticker::{canonical_ticker, is_ticker_symbol};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Words scanned on each side of a period token for the company phrase.
const WINDOW_WORDS: usize = 6;
const MAX_NAME_WORDS: usize = 4;

static YEAR_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<head>.*?)\b(?:between|from)\s+(?:fy\s?)?(?P<y1>[0-9]{4})\s*(?:and|to|through|thru|-|–)\s*(?:fy\s?)?(?P<y2>[0-9]{4})\b",
    )
    .expect("year range regex")
});

static YEAR_QUARTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:q(?P<qa>[1-4])[\s-]*(?:fy\s?)?(?P<ya>[0-9]{4})|(?:fy\s?)?(?P<yb>[0-9]{4})(?:[\s-]*q(?P<qb>[1-4]))?)\b",
    )
    .expect("year/quarter regex")
});

/// `<company> <metric> between|from Y1 and|to|through|- Y2`.
pub struct YearRangeStage;

impl Stage for YearRangeStage {
    fn name(&self) -> &'static str {
        "year-range"
    }

    fn extract(&self, text: &str, ctx: &StageContext<'_>) -> Extraction {
        let Some(caps) = YEAR_RANGE.captures(text) else {
            return Extraction::default();
        };
        let (Some(y1), Some(y2)) = (
            caps.name("y1").and_then(|m| m.as_str().parse::<i32>().ok()),
            caps.name("y2").and_then(|m| m.as_str().parse::<i32>().ok()),
        ) else {
            return Extraction::default();
        };
        if !is_valid_year(y1) || !is_valid_year(y2) {
            return Extraction::default();
        }

        let head = caps.name("head").map_or("", |m| m.as_str());
        let hit = detect_metric(head);
        let subject = match hit {
            Some(h) => {
                let before: Vec<&str> = head[..h.start].split_whitespace().collect();
                let after: Vec<&str> = head[h.end..].split_whitespace().collect();
                ctx.resolve_window(tail(&before, WINDOW_WORDS))
                    .or_else(|| ctx.resolve_window(&after[..after.len().min(WINDOW_WORDS)]))
            }
            None => {
                let words: Vec<&str> = head.split_whitespace().collect();
                ctx.resolve_window(tail(&words, WINDOW_WORDS))
            }
        };

        Extraction {
            period: Some(Period::range(y1, y2)),
            subject,
            metric: hit.map(|h| h.metric),
            entities: Vec::new(),
        }
    }
}

/// `2023`, `FY2023`, `Q2 2023`, `2023 Q2`.
pub struct YearQuarterStage;

impl Stage for YearQuarterStage {
    fn name(&self) -> &'static str {
        "year-quarter"
    }

    fn extract(&self, text: &str, ctx: &StageContext<'_>) -> Extraction {
        for caps in YEAR_QUARTER.captures_iter(text) {
            let year = caps
                .name("ya")
                .or_else(|| caps.name("yb"))
                .and_then(|m| m.as_str().parse::<i32>().ok());
            let Some(year) = year.filter(|y| is_valid_year(*y)) else {
                continue;
            };
            let quarter = caps
                .name("qa")
                .or_else(|| caps.name("qb"))
                .and_then(|m| m.as_str().parse::<u8>().ok());
            let period = match quarter {
                Some(q) => Period::quarter(year, q),
                None => Period::year(year),
            };

            let Some(whole) = caps.get(0) else {
                continue;
            };
            let before: Vec<&str> = text[..whole.start()].split_whitespace().collect();
            let after: Vec<&str> = text[whole.end()..].split_whitespace().collect();
            let subject = ctx
                .resolve_window(tail(&before, WINDOW_WORDS))
                .or_else(|| ctx.resolve_window(&after[..after.len().min(WINDOW_WORDS)]));

            return Extraction {
                period: Some(period),
                subject,
                metric: None,
                entities: Vec::new(),
            };
        }
        Extraction::default()
    }
}

/// Ticker-shaped tokens plus exact company-name n-grams.
pub struct EntityStage;

impl Stage for EntityStage {
    fn name(&self) -> &'static str {
        "entities"
    }

    fn extract(&self, text: &str, ctx: &StageContext<'_>) -> Extraction {
        let words: Vec<(usize, &str)> = text
            .split_whitespace()
            .map(|w| (offset_in(text, w), w))
            .collect();
        let mut taken = vec![false; words.len()];
        let mut mentions = Vec::new();

        for (i, (pos, raw)) in words.iter().enumerate() {
            let token = clean_word(raw);
            if is_ticker_symbol(token) && !is_caps_stopword(token) && ctx.is_known_ticker(token) {
                mentions.push(Mention {
                    position: *pos,
                    ticker: canonical_ticker(token),
                });
                taken[i] = true;
            }
        }

        for len in (1..=MAX_NAME_WORDS.min(words.len())).rev() {
            for start in 0..=words.len() - len {
                let span = start..start + len;
                if taken[span.clone()].iter().any(|t| *t) {
                    continue;
                }
                let slice = &words[span.clone()];
                let first = clean_word(slice[0].1);
                let last = clean_word(slice[len - 1].1);
                if first.is_empty() || is_stopword(first) || is_stopword(last) {
                    continue;
                }

                let cleaned: Vec<&str> = slice.iter().map(|(_, w)| clean_word(w)).collect();
                let raw: Vec<&str> = slice
                    .iter()
                    .map(|(_, w)| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
                    .collect();
                let ticker = ctx
                    .index
                    .lookup_exact(&cleaned.join(" "))
                    .or_else(|| ctx.index.lookup_exact(&raw.join(" ")));

                if let Some(ticker) = ticker {
                    mentions.push(Mention {
                        position: slice[0].0,
                        ticker: ticker.to_string(),
                    });
                    for t in &mut taken[span] {
                        *t = true;
                    }
                }
            }
        }

        mentions.sort_by_key(|m| m.position);
        let mut seen = HashSet::new();
        mentions.retain(|m| seen.insert(m.ticker.clone()));

        Extraction {
            entities: mentions,
            ..Extraction::default()
        }
    }
}

fn tail<'a, T>(items: &'a [T], n: usize) -> &'a [T] {
    &items[items.len().saturating_sub(n)..]
}

// `word` is a subslice of `text` produced by `split_whitespace`.
fn offset_in(text: &str, word: &str) -> usize {
    (word.as_ptr() as usize).saturating_sub(text.as_ptr() as usize)
}
