use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{TenantStoreError, TenantStoreResult};

pub const DEFAULT_OPENAI_MODEL: &str = "text-embedding-3-small";

/// Native output width of the known OpenAI embedding models
fn model_dimension(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        _ => None,
    }
}

/// OpenAI embedding provider configuration
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Requested output width; `None` uses the model's native width
    pub dimension: Option<usize>,
}

impl OpenAIConfig {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            dimension: None,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Width of the vectors this configuration produces
    pub fn effective_dimension(&self) -> TenantStoreResult<usize> {
        self.dimension
            .or_else(|| model_dimension(&self.model))
            .ok_or_else(|| {
                TenantStoreError::Config(format!(
                    "Unknown dimension for model '{}'; set OPENAI_EMBEDDING_DIMENSION",
                    self.model
                ))
            })
    }
}

impl FromEnv for OpenAIConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let dimension = match std::env::var("OPENAI_EMBEDDING_DIMENSION") {
            Ok(raw) => Some(raw.parse().map_err(|e| ConfigError::ParseError {
                key: "OPENAI_EMBEDDING_DIMENSION".to_string(),
                details: format!("{}", e),
            })?),
            Err(_) => None,
        };

        Ok(Self {
            api_key: env_required("OPENAI_API_KEY")?,
            base_url: env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            model: env_or_default("OPENAI_EMBEDDING_MODEL", DEFAULT_OPENAI_MODEL),
            dimension,
        })
    }
}

/// OpenAI embeddings provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
    dimension: usize,
}

impl OpenAIProvider {
    pub fn new(config: OpenAIConfig) -> TenantStoreResult<Self> {
        let dimension = config.effective_dimension()?;
        Ok(Self {
            client: Client::new(),
            config,
            dimension,
        })
    }

    pub fn from_env() -> TenantStoreResult<Self> {
        let config = OpenAIConfig::from_env().map_err(|e| TenantStoreError::Config(e.to_string()))?;
        Self::new(config)
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

impl EmbeddingResponse {
    /// Vectors in request order, checked against the expected count and width
    fn into_vectors(self, expected: usize, dimension: usize) -> TenantStoreResult<Vec<Vec<f32>>> {
        let mut data = self.data;
        // Sort by index to maintain order
        data.sort_by_key(|d| d.index);

        if data.len() != expected {
            return Err(TenantStoreError::Embedding(format!(
                "OpenAI returned {} embeddings for {} inputs",
                data.len(),
                expected
            )));
        }

        data.into_iter()
            .map(|d| {
                if d.embedding.len() == dimension {
                    Ok(d.embedding)
                } else {
                    Err(TenantStoreError::DimensionMismatch {
                        expected: dimension,
                        actual: d.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, texts: &[String]) -> TenantStoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input: texts.to_vec(),
            dimensions: self.config.dimension,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(TenantStoreError::Embedding(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let embedding_response: EmbeddingResponse = response.json().await?;
        tracing::debug!(model = %self.config.model, count = texts.len(), "Encoded texts");

        embedding_response.into_vectors(texts.len(), self.dimension)
    }
}
