use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Command verb of a canonical command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verb {
    Metrics,
    Compare,
    Fact,
    FactRange,
    Audit,
    Ingest,
    Scenario,
    Summary,
}

impl Verb {
    pub const ALL: [Verb; 8] = [
        Verb::Metrics,
        Verb::Compare,
        Verb::Fact,
        Verb::FactRange,
        Verb::Audit,
        Verb::Ingest,
        Verb::Scenario,
        Verb::Summary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Metrics => "metrics",
            Verb::Compare => "compare",
            Verb::Fact => "fact",
            Verb::FactRange => "fact-range",
            Verb::Audit => "audit",
            Verb::Ingest => "ingest",
            Verb::Scenario => "scenario",
            Verb::Summary => "summary",
        }
    }

    /// Verbs whose execution changes stored data or reports on it and must
    /// never be rewritten or replayed.
    pub fn is_side_effecting(&self) -> bool {
        matches!(self, Verb::Ingest | Verb::Audit)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let v = s.trim().to_lowercase();
        Verb::ALL
            .iter()
            .copied()
            .find(|verb| verb.as_str() == v)
            .ok_or_else(|| format!("Unknown verb: {s}"))
    }
}
