use super::gate::is_forecast;

const ALLOWED_PREFIXES: &[&str] = &[
    "compare", "fact", "fact-range", "table", "scenario", "metric", "summary", "snapshot",
    "overview", "help",
];

const DENIED_PREFIXES: &[&str] = &["ingest", "audit", "update ", "refresh "];

/// Whether a reply to `text` (canonical or collapsed prompt) may be stored
/// in the reply cache.
pub fn is_cacheable(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    if DENIED_PREFIXES.iter().any(|p| lowered.starts_with(p)) {
        return false;
    }
    ALLOWED_PREFIXES.iter().any(|p| lowered.starts_with(p)) && !is_forecast(&lowered)
}
