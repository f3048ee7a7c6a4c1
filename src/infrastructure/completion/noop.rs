use crate::domain::error::DomainError;
use crate::domain::ports::completion_port::CompletionProvider;

/// Offline provider: echoes the question back instead of calling a model.
pub struct NoopCompletion;

#[async_trait::async_trait]
impl CompletionProvider for NoopCompletion {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String, DomainError> {
        let question = prompt
            .rsplit_once("Question: ")
            .map(|(_, q)| q)
            .unwrap_or(prompt);
        Ok(format!("No completion provider configured. Unanswered: {}", question.trim()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_the_question() {
        let out = NoopCompletion
            .complete("sys", "Context:\nAAPL\n\nQuestion: how is apple doing")
            .await
            .unwrap();
        assert!(out.ends_with("how is apple doing"));
    }
}
