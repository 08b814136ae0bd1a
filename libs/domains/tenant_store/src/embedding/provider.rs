use async_trait::async_trait;

use crate::error::TenantStoreResult;

/// Turns text into fixed-length embeddings.
///
/// Implementations must be deterministic for a given model and return exactly
/// one vector of length [`dimension`](Self::dimension) per input, in order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Length of every vector this provider returns
    fn dimension(&self) -> usize;

    /// Encode texts in batch
    async fn encode(&self, texts: &[String]) -> TenantStoreResult<Vec<Vec<f32>>>;
}
