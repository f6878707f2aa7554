//! Embedding trait definitions.

use async_trait::async_trait;

/// Trait for embedding providers.
///
/// The provider is the engine's only network-bound collaborator. Callers
/// must treat a failed call, or a response with a mismatched vector count,
/// as "semantic score unavailable" and degrade to lexical-only scoring.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text.
    async fn embed(&self, texts: &[String]) -> crate::error::Result<Vec<Vec<f32>>>;

    /// Return the embedding dimension.
    fn dimension(&self) -> usize;

    /// Return the maximum batch size.
    fn max_batch_size(&self) -> usize {
        100
    }
}
