use std::sync::Arc;

use core_config::{ConfigError, FromEnv, env_parse_or};
use strum::{Display, EnumString};

use crate::backend::{InMemoryBackend, QdrantBackend, QdrantConfig, VectorBackend};
use crate::embedding::{EmbeddingProvider, HashingProvider, OpenAIProvider};
use crate::error::{TenantStoreError, TenantStoreResult};
use crate::models::{CollectionConfig, DistanceMetric, DuplicatePolicy};

/// Which vector backend the store talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BackendKind {
    #[default]
    Memory,
    Qdrant,
}

/// Which embedding provider encodes text inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EmbeddingProviderKind {
    #[default]
    Hashing,
    #[strum(serialize = "openai")]
    OpenAI,
}

/// Embedding provider selection
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProviderKind,
}

impl FromEnv for EmbeddingSettings {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            provider: env_parse_or("EMBEDDING_PROVIDER", EmbeddingProviderKind::default())?,
        })
    }
}

/// Store-wide configuration
///
/// Environment variables:
/// - TENANT_STORE_BACKEND: `memory` (default) or `qdrant`
/// - TENANT_STORE_DIMENSION: embedding width for new collections (default 384)
/// - TENANT_STORE_DISTANCE: `cosine` (default), `dot_product`, `euclidean`
/// - TENANT_STORE_DUPLICATE_POLICY: `reject` (default) or `overwrite`
/// - TENANT_STORE_TELEMETRY: emit telemetry events (default false)
/// - QDRANT_* and EMBEDDING_PROVIDER, see [`QdrantConfig`] and [`EmbeddingSettings`]
#[derive(Debug, Clone)]
pub struct TenantStoreConfig {
    pub backend: BackendKind,
    pub dimension: usize,
    pub distance: DistanceMetric,
    pub duplicate_policy: DuplicatePolicy,
    pub telemetry_enabled: bool,
    pub qdrant: QdrantConfig,
    pub embedding: EmbeddingSettings,
}

impl TenantStoreConfig {
    /// Config applied to collections this store creates
    pub fn collection_config(&self) -> CollectionConfig {
        CollectionConfig::new(self.dimension)
            .with_distance(self.distance)
            .with_duplicate_policy(self.duplicate_policy)
    }

    pub fn build_backend(&self) -> TenantStoreResult<Arc<dyn VectorBackend>> {
        let backend: Arc<dyn VectorBackend> = match self.backend {
            BackendKind::Memory => Arc::new(InMemoryBackend::new()),
            BackendKind::Qdrant => Arc::new(QdrantBackend::new(self.qdrant.clone())?),
        };
        tracing::info!(backend = %self.backend, "Vector backend configured");
        Ok(backend)
    }

    /// Build the configured provider; its width must match `dimension`.
    pub fn build_embedding_provider(&self) -> TenantStoreResult<Arc<dyn EmbeddingProvider>> {
        let provider: Arc<dyn EmbeddingProvider> = match self.embedding.provider {
            EmbeddingProviderKind::Hashing => Arc::new(HashingProvider::new(self.dimension)),
            EmbeddingProviderKind::OpenAI => Arc::new(OpenAIProvider::from_env()?),
        };

        if provider.dimension() != self.dimension {
            return Err(TenantStoreError::Config(format!(
                "Embedding provider '{}' produces {} dimensions but TENANT_STORE_DIMENSION is {}",
                self.embedding.provider,
                provider.dimension(),
                self.dimension
            )));
        }

        Ok(provider)
    }
}

impl FromEnv for TenantStoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let dimension: usize = env_parse_or("TENANT_STORE_DIMENSION", 384)?;
        if dimension == 0 {
            return Err(ConfigError::ParseError {
                key: "TENANT_STORE_DIMENSION".to_string(),
                details: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            backend: env_parse_or("TENANT_STORE_BACKEND", BackendKind::default())?,
            dimension,
            distance: env_parse_or("TENANT_STORE_DISTANCE", DistanceMetric::default())?,
            duplicate_policy: env_parse_or(
                "TENANT_STORE_DUPLICATE_POLICY",
                DuplicatePolicy::default(),
            )?,
            telemetry_enabled: env_parse_or("TENANT_STORE_TELEMETRY", false)?,
            qdrant: QdrantConfig::from_env()?,
            embedding: EmbeddingSettings::from_env()?,
        })
    }
}

impl Default for TenantStoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            dimension: 384,
            distance: DistanceMetric::default(),
            duplicate_policy: DuplicatePolicy::default(),
            telemetry_enabled: false,
            qdrant: QdrantConfig::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: [&str; 6] = [
        "TENANT_STORE_BACKEND",
        "TENANT_STORE_DIMENSION",
        "TENANT_STORE_DISTANCE",
        "TENANT_STORE_DUPLICATE_POLICY",
        "TENANT_STORE_TELEMETRY",
        "EMBEDDING_PROVIDER",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(VARS, || {
            let config = TenantStoreConfig::from_env().unwrap();
            assert_eq!(config.backend, BackendKind::Memory);
            assert_eq!(config.dimension, 384);
            assert_eq!(config.distance, DistanceMetric::Cosine);
            assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
            assert!(!config.telemetry_enabled);
            assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hashing);
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("TENANT_STORE_BACKEND", Some("qdrant")),
                ("TENANT_STORE_DIMENSION", Some("1536")),
                ("TENANT_STORE_DISTANCE", Some("euclidean")),
                ("TENANT_STORE_DUPLICATE_POLICY", Some("Overwrite")),
                ("TENANT_STORE_TELEMETRY", Some("true")),
                ("EMBEDDING_PROVIDER", Some("openai")),
            ],
            || {
                let config = TenantStoreConfig::from_env().unwrap();
                assert_eq!(config.backend, BackendKind::Qdrant);
                assert_eq!(config.dimension, 1536);
                assert_eq!(config.distance, DistanceMetric::Euclidean);
                assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
                assert!(config.telemetry_enabled);
                assert_eq!(config.embedding.provider, EmbeddingProviderKind::OpenAI);
            },
        );
    }

    #[test]
    fn test_invalid_values_are_errors() {
        temp_env::with_var("TENANT_STORE_BACKEND", Some("sqlite"), || {
            let err = TenantStoreConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("TENANT_STORE_BACKEND"));
        });

        temp_env::with_var("TENANT_STORE_DIMENSION", Some("0"), || {
            assert!(TenantStoreConfig::from_env().is_err());
        });
    }

    #[test]
    fn test_collection_config_reflects_settings() {
        let config = TenantStoreConfig {
            dimension: 8,
            distance: DistanceMetric::DotProduct,
            duplicate_policy: DuplicatePolicy::Overwrite,
            ..TenantStoreConfig::default()
        };

        let collection = config.collection_config();
        assert_eq!(collection.dimension, 8);
        assert_eq!(collection.distance, DistanceMetric::DotProduct);
        assert_eq!(collection.duplicate_policy, DuplicatePolicy::Overwrite);
    }

    #[test]
    fn test_hashing_provider_matches_dimension() {
        let config = TenantStoreConfig {
            dimension: 32,
            ..TenantStoreConfig::default()
        };
        assert_eq!(config.build_embedding_provider().unwrap().dimension(), 32);
    }

    #[test]
    fn test_openai_dimension_mismatch_is_config_error() {
        temp_env::with_vars(
            [
                ("OPENAI_API_KEY", Some("sk-test")),
                ("OPENAI_EMBEDDING_MODEL", None),
                ("OPENAI_EMBEDDING_DIMENSION", None),
            ],
            || {
                let config = TenantStoreConfig {
                    embedding: EmbeddingSettings {
                        provider: EmbeddingProviderKind::OpenAI,
                    },
                    ..TenantStoreConfig::default()
                };
                assert!(matches!(
                    config.build_embedding_provider(),
                    Err(TenantStoreError::Config(_))
                ));
            },
        );
    }
}
