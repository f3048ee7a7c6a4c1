use crate::domain::error::DomainError;
use crate::domain::values::metric_key::MetricKey;
use crate::domain::values::period::Period;
use crate::domain::values::ticker::is_ticker_symbol;
use crate::domain::values::verb::Verb;
use serde::{Deserialize, Serialize};

/// Canonical structured command produced from user text.
///
/// "Fall back to free-form handling" is represented as `Option::None` by the
/// producers, never as a variant here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub verb: Verb,
    pub tickers: Vec<String>,
    pub period: Option<Period>,
    pub metric: Option<MetricKey>,
    /// Verb-specific trailing arguments (`ingest TSLA 5`, `scenario AAPL bear case`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,
}

impl ParsedCommand {
    pub fn new(verb: Verb, tickers: Vec<String>) -> Self {
        Self {
            verb,
            tickers,
            period: None,
            metric: None,
            arguments: Vec::new(),
        }
    }

    pub fn fact(ticker: impl Into<String>, period: Period, metric: MetricKey) -> Self {
        let verb = if period.is_range() {
            Verb::FactRange
        } else {
            Verb::Fact
        };
        Self::new(verb, vec![ticker.into()])
            .with_period(Some(period))
            .with_metric(Some(metric))
    }

    pub fn with_period(mut self, period: Option<Period>) -> Self {
        self.period = period;
        self
    }

    pub fn with_metric(mut self, metric: Option<MetricKey>) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<String>) -> Self {
        self.arguments = arguments;
        self
    }

    pub fn primary_ticker(&self) -> Option<&str> {
        self.tickers.first().map(String::as_str)
    }

    /// Checks the per-verb shape invariants.
    pub fn validate(&self) -> Result<(), DomainError> {
        let invalid = |msg: &str| Err(DomainError::InvalidInput(format!("{}: {msg}", self.verb)));
        match self.verb {
            Verb::Fact => {
                if self.tickers.len() != 1 {
                    return invalid("exactly one ticker required");
                }
                match self.period {
                    Some(p) if !p.is_range() => {}
                    _ => return invalid("a single year or quarter is required"),
                }
                if self.metric.is_none() {
                    return invalid("a metric is required");
                }
            }
            Verb::FactRange => {
                if self.tickers.len() != 1 {
                    return invalid("exactly one ticker required");
                }
                match self.period {
                    Some(p) if p.is_range() => {}
                    _ => return invalid("a year range is required"),
                }
                if self.metric.is_none() {
                    return invalid("a metric is required");
                }
            }
            Verb::Compare => {
                if self.tickers.len() < 2 {
                    return invalid("at least two tickers required");
                }
            }
            Verb::Ingest => {
                if self.tickers.is_empty() {
                    return invalid("a ticker is required");
                }
                if let Some(years) = self.arguments.first() {
                    if years.parse::<u32>().is_err() {
                        return invalid("year count must be a number");
                    }
                }
            }
            Verb::Metrics | Verb::Audit | Verb::Scenario | Verb::Summary => {
                if self.tickers.is_empty() {
                    return invalid("a ticker is required");
                }
            }
        }
        Ok(())
    }

    /// Canonical text form: `<verb> <TICKER>... [period] [metric] [arguments...]`.
    pub fn canonical(&self) -> String {
        let mut parts: Vec<String> = vec![self.verb.to_string()];
        parts.extend(self.tickers.iter().cloned());
        if let Some(p) = &self.period {
            parts.push(p.to_string());
        }
        if let Some(m) = &self.metric {
            parts.push(m.to_string());
        }
        parts.extend(self.arguments.iter().cloned());
        parts.join(" ")
    }

    /// Strict parser for text that is already in canonical form.
    ///
    /// Tickers must be upper-case symbols and come right after the verb.
    /// Unknown words are only accepted as trailing arguments of `ingest` and
    /// `scenario`; anything else means the text is not canonical.
    pub fn parse_canonical(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let verb: Verb = words.next()?.parse().ok()?;
        let mut cmd = ParsedCommand::new(verb, Vec::new());

        for word in words {
            let in_args = !cmd.arguments.is_empty();
            if !in_args && cmd.period.is_none() && cmd.metric.is_none() && is_ticker_symbol(word) {
                cmd.tickers.push(word.to_string());
                continue;
            }
            if !in_args && cmd.period.is_none() {
                if let Ok(p) = word.parse::<Period>() {
                    cmd.period = Some(p);
                    continue;
                }
            }
            if !in_args && cmd.metric.is_none() {
                if let Ok(m) = word.parse::<MetricKey>() {
                    cmd.metric = Some(m);
                    continue;
                }
            }
            if matches!(verb, Verb::Ingest | Verb::Scenario) && !cmd.tickers.is_empty() {
                cmd.arguments.push(word.to_string());
                continue;
            }
            return None;
        }

        cmd.validate().ok()?;
        Some(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fact_constructor_picks_verb_from_period() {
        let f = ParsedCommand::fact("AAPL", Period::year(2023), MetricKey::Revenue);
        assert_eq!(f.verb, Verb::Fact);
        let r = ParsedCommand::fact("AAPL", Period::range(2020, 2022), MetricKey::Revenue);
        assert_eq!(r.verb, Verb::FactRange);
        assert_eq!(r.canonical(), "fact-range AAPL 2020-2022 revenue");
    }

    #[test]
    fn parses_canonical_commands() {
        let c = ParsedCommand::parse_canonical("compare AAPL MSFT 2023 net_income").unwrap();
        assert_eq!(c.verb, Verb::Compare);
        assert_eq!(c.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(c.period, Some(Period::year(2023)));
        assert_eq!(c.metric, Some(MetricKey::NetIncome));

        let i = ParsedCommand::parse_canonical("ingest TSLA 5").unwrap();
        assert_eq!(i.verb, Verb::Ingest);
        assert_eq!(i.arguments, vec!["5"]);

        let s = ParsedCommand::parse_canonical("scenario NVDA bear case").unwrap();
        assert_eq!(s.arguments, vec!["bear", "case"]);
    }

    #[test]
    fn rejects_natural_text() {
        assert!(ParsedCommand::parse_canonical("compare AAPL and MSFT revenue 2023").is_none());
        assert!(ParsedCommand::parse_canonical("compare aapl msft").is_none());
        assert!(ParsedCommand::parse_canonical("what is AAPL revenue").is_none());
        assert!(ParsedCommand::parse_canonical("").is_none());
    }

    #[test]
    fn rejects_invariant_violations() {
        assert!(ParsedCommand::parse_canonical("compare AAPL").is_none());
        assert!(ParsedCommand::parse_canonical("fact AAPL 2023").is_none());
        assert!(ParsedCommand::parse_canonical("fact AAPL 2020-2022 revenue").is_none());
        assert!(ParsedCommand::parse_canonical("fact-range AAPL 2023 revenue").is_none());
        assert!(ParsedCommand::parse_canonical("ingest TSLA five").is_none());
    }

    #[test]
    fn canonical_round_trips_through_parser() {
        let cmd = ParsedCommand::fact("MSFT", Period::quarter(2024, 2), MetricKey::Eps);
        assert_eq!(ParsedCommand::parse_canonical(&cmd.canonical()), Some(cmd));
    }
}
