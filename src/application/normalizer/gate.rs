use crate::domain::entities::parsed_command::ParsedCommand;
use crate::domain::values::verb::Verb;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static LIVE_REFRESH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(refresh|re-?fetch|re-?pull|live data|live prices?|real[- ]?time|latest price|current price|update the data|fresh data|pull new data)\b",
    )
    .expect("live refresh regex")
});

static FORECAST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(forecast\w*|predict\w*|projections?|projected|project(?:ing)? (?:revenue|earnings|growth)|outlook|(?:analyst|consensus|street) estimates?|estimates? for (?:next|the coming|fy ?20[0-9]{2})|next (?:quarter|year|fiscal year)|guidance|will .{1,40} be)\b",
    )
    .expect("forecast regex")
});

/// Why text was kept away from NL normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateReason {
    LiveRefresh,
    Forecast,
    AlreadyCanonical,
}

impl fmt::Display for GateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateReason::LiveRefresh => write!(f, "live-refresh"),
            GateReason::Forecast => write!(f, "forecast"),
            GateReason::AlreadyCanonical => write!(f, "already-canonical"),
        }
    }
}

pub fn is_live_refresh(text: &str) -> bool {
    LIVE_REFRESH.is_match(text)
}

pub fn is_forecast(text: &str) -> bool {
    FORECAST.is_match(text)
}

/// Starts with a canonical verb and is either side-effecting or already
/// parses as a canonical command. "compare Apple and Microsoft" is not
/// canonical and still gets normalized.
pub fn is_canonical(text: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let Ok(verb) = first.to_lowercase().parse::<Verb>() else {
        return false;
    };
    verb.is_side_effecting() || ParsedCommand::parse_canonical(text).is_some()
}

/// First gate rule that blocks `text`, if any.
pub fn check(text: &str) -> Option<GateReason> {
    if is_live_refresh(text) {
        Some(GateReason::LiveRefresh)
    } else if is_forecast(text) {
        Some(GateReason::Forecast)
    } else if is_canonical(text) {
        Some(GateReason::AlreadyCanonical)
    } else {
        None
    }
}
