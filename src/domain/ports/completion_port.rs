use crate::domain::error::DomainError;

/// Language-model completion used for free-form questions and scenarios.
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, DomainError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
