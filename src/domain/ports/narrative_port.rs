use crate::domain::error::DomainError;

/// Produces the narrative summary for one ticker.
#[async_trait::async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate_summary(&self, ticker: &str) -> Result<String, DomainError>;
}
