use serde::{Deserialize, Serialize};
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Corporate suffixes trimmed from the end of a company phrase.
pub const DEFAULT_CORPORATE_SUFFIXES: &[&str] = &[
    "inc",
    "incorporated",
    "corp",
    "corporation",
    "co",
    "company",
    "ltd",
    "limited",
    "llc",
    "plc",
    "holdings",
    "holding",
    "group",
    "sa",
    "ag",
    "nv",
    "lp",
];

/// Canonical lookup key for a company phrase.
///
/// Lower-cased, diacritics stripped, everything outside `[a-z0-9 &-]` turned
/// into a space, whitespace collapsed and trailing corporate suffixes dropped.
/// An empty name is valid and means "no name".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NormalizedName(String);

impl NormalizedName {
    pub fn new(phrase: &str) -> Self {
        Self::with_suffixes(phrase, DEFAULT_CORPORATE_SUFFIXES)
    }

    pub fn with_suffixes<S: AsRef<str>>(phrase: &str, suffixes: &[S]) -> Self {
        let folded: String = phrase
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .map(|c| match c {
                'a'..='z' | '0'..='9' | ' ' | '&' | '-' => c,
                _ => ' ',
            })
            .collect();

        let mut tokens: Vec<&str> = folded.split_whitespace().collect();
        while let Some(last) = tokens.last() {
            if suffixes
                .iter()
                .any(|s| s.as_ref().eq_ignore_ascii_case(last))
            {
                tokens.pop();
            } else {
                break;
            }
        }

        NormalizedName(tokens.join(" "))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }
}

impl fmt::Display for NormalizedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
