use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;
use crate::similarity::l2_normalize;

/// Same width as all-MiniLM-L6-v2, a common local sentence embedder
pub const DEFAULT_HASHING_DIMENSION: usize = 384;

/// Local feature-hashing embedder.
///
/// Lowercased alphanumeric tokens are hashed with SHA-256 into signed buckets
/// and the result is L2-normalised. Texts sharing words land close together
/// under cosine similarity. No network, fully deterministic.
#[derive(Debug, Clone)]
pub struct HashingProvider {
    dimension: usize,
}

impl HashingProvider {
    /// `dimension` is clamped to at least 1
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);

            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        l2_normalize(&mut vector);
        vector
    }
}

impl Default for HashingProvider {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

#[async_trait]
impl EmbeddingProvider for HashingProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> crate::error::TenantStoreResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::{cosine, norm};

    #[test]
    fn test_embedding_has_configured_dimension_and_unit_norm() {
        let provider = HashingProvider::new(64);
        let v = provider.embed("Quarterly revenue report");
        assert_eq!(v.len(), 64);
        assert!((norm(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_embedding_is_deterministic_and_case_insensitive() {
        let provider = HashingProvider::default();
        assert_eq!(provider.embed("Confidential memo"), provider.embed("confidential MEMO!"));
    }

    #[test]
    fn test_shared_words_score_higher() {
        let provider = HashingProvider::default();
        let query = provider.embed("confidential");
        let related = provider.embed("Tenant A confidential data");
        let unrelated = provider.embed("weather forecast sunny");

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let provider = HashingProvider::new(8);
        assert_eq!(provider.embed("  ...  "), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_encode_preserves_order() {
        let provider = HashingProvider::new(16);
        let texts = vec!["alpha".to_string(), "beta".to_string()];
        let vectors = provider.encode(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], provider.embed("alpha"));
        assert_eq!(vectors[1], provider.embed("beta"));
    }
}
