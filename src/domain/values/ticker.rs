use once_cell::sync::Lazy;
use regex::Regex;

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,5}(?:[.-][A-Z])?$").expect("ticker regex"));

/// Upper-case exchange symbol, optionally with a share-class suffix (`BRK-B`, `BF.B`).
pub fn is_ticker_symbol(s: &str) -> bool {
    TICKER_RE.is_match(s)
}

/// True for dual-class listings such as `BRK-B` or `BRK.B`.
pub fn has_class_suffix(ticker: &str) -> bool {
    let bytes = ticker.as_bytes();
    bytes.len() >= 3
        && matches!(bytes[bytes.len() - 2], b'-' | b'.')
        && bytes[bytes.len() - 1].is_ascii_alphabetic()
}

/// Trims and upper-cases a symbol; `.` class separators become `-`.
pub fn canonical_ticker(raw: &str) -> String {
    raw.trim().to_ascii_uppercase().replace('.', "-")
}
