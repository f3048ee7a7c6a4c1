use crate::domain::error::DomainError;

/// A company name paired with the ticker it should resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasPair {
    pub name: String,
    pub ticker: String,
}

impl AliasPair {
    pub fn new(name: impl Into<String>, ticker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ticker: ticker.into(),
        }
    }
}

/// Persistent source of `(company_name, ticker)` pairs, read at startup and on reload.
pub trait AliasSource: Send + Sync {
    /// Pairs in registration order.
    fn load_aliases(&self) -> Result<Vec<AliasPair>, DomainError>;
}
