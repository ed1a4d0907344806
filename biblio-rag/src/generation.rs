//! Generation provider trait for producing text completions.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that produces a text completion for a prompt.
///
/// Implementations wrap remote generation services. Failures surface as
/// [`EngineError::Generation`](crate::EngineError::Generation); callers at
/// the query boundary translate them into a graceful failure answer.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Human-readable provider name, used in logs and error reports.
    fn name(&self) -> &str;

    /// Produce a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Produce a concise summary of `text` using the given provider.
///
/// # Errors
///
/// Propagates the provider's [`EngineError::Generation`](crate::EngineError::Generation)
/// failure unchanged.
pub async fn summarize(provider: &dyn GenerationProvider, text: &str) -> Result<String> {
    let prompt =
        format!("Provide a concise summary of the following text:\n\n{text}\n\nSummary:");
    provider.generate(&prompt).await
}
