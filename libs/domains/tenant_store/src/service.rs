use std::sync::Arc;

use crate::backend::VectorBackend;
use crate::embedding::EmbeddingProvider;
use crate::error::{TenantStoreError, TenantStoreResult};
use crate::models::{CollectionConfig, CollectionHandle, Document, ScoredDocument, TextInput};
use crate::naming::{CollectionKey, compose};

const TELEMETRY_TARGET: &str = "tenant_store::telemetry";

/// Tenant-scoped facade over a vector backend.
///
/// Every operation derives its collection key from the tenant it is given, so
/// a caller can never address a collection owned by another tenant.
pub struct TenantStore<B: VectorBackend> {
    backend: B,
    default_config: CollectionConfig,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    telemetry_enabled: bool,
}

impl<B: VectorBackend> TenantStore<B> {
    pub fn new(backend: B, default_config: CollectionConfig) -> Self {
        Self {
            backend,
            default_config,
            embedding_provider: None,
            telemetry_enabled: false,
        }
    }

    pub fn with_embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    pub fn with_telemetry(mut self, enabled: bool) -> Self {
        self.telemetry_enabled = enabled;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn default_config(&self) -> CollectionConfig {
        self.default_config
    }

    pub fn has_embedding_provider(&self) -> bool {
        self.embedding_provider.is_some()
    }

    fn telemetry(&self, operation: &str, key: &CollectionKey, count: usize) {
        if self.telemetry_enabled {
            tracing::info!(target: TELEMETRY_TARGET, operation, collection = %key, count);
        }
    }

    async fn resolve(&self, key: &CollectionKey) -> TenantStoreResult<CollectionHandle> {
        self.backend
            .get_or_create_collection(key, self.default_config)
            .await
    }

    /// Return the tenant's collection, creating it on first use.
    pub async fn get_or_create(&self, tenant: &str, name: &str) -> TenantStoreResult<CollectionHandle> {
        let key = compose(tenant, name)?;
        let handle = self.resolve(&key).await?;
        self.telemetry("get_or_create", &key, 0);
        Ok(handle)
    }

    /// Add documents to the tenant's collection.
    ///
    /// The whole batch is validated before anything is written.
    pub async fn add(&self, tenant: &str, name: &str, documents: Vec<Document>) -> TenantStoreResult<()> {
        let key = compose(tenant, name)?;
        let handle = self.resolve(&key).await?;

        if documents.is_empty() {
            return Ok(());
        }

        validate_documents(&documents, handle.config.dimension)?;

        let count = documents.len();
        self.backend.add(&handle, documents).await?;

        tracing::debug!(collection = %key, count, "Added documents");
        self.telemetry("add", &key, count);
        Ok(())
    }

    /// Up to `k` most similar documents in the tenant's collection.
    pub async fn query(
        &self,
        tenant: &str,
        name: &str,
        embedding: &[f32],
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>> {
        let key = compose(tenant, name)?;

        if k == 0 {
            return Err(TenantStoreError::InvalidQuery("k must be at least 1".to_string()));
        }

        let handle = self.resolve(&key).await?;
        check_embedding(handle.config.dimension, embedding)?;

        let results = self.backend.query(&handle, embedding, k).await?;
        self.telemetry("query", &key, results.len());
        Ok(results)
    }

    /// Encode texts with the configured provider, then [`add`](Self::add) them.
    pub async fn add_texts(&self, tenant: &str, name: &str, inputs: Vec<TextInput>) -> TenantStoreResult<()> {
        // Validate before paying for encoding
        compose(tenant, name)?;

        let texts: Vec<String> = inputs.iter().map(|i| i.text.clone()).collect();
        let embeddings = self.encode(&texts).await?;

        let documents = inputs
            .into_iter()
            .zip(embeddings)
            .map(|(input, embedding)| Document::new(input.id, input.text, embedding))
            .collect();

        self.add(tenant, name, documents).await
    }

    /// Encode `text` with the configured provider, then [`query`](Self::query).
    pub async fn query_text(
        &self,
        tenant: &str,
        name: &str,
        text: &str,
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>> {
        compose(tenant, name)?;
        if k == 0 {
            return Err(TenantStoreError::InvalidQuery("k must be at least 1".to_string()));
        }

        let embedding = self
            .encode(&[text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| TenantStoreError::Embedding("No embedding returned".to_string()))?;

        self.query(tenant, name, &embedding, k).await
    }

    /// Encode through the configured provider, checking one vector comes back per text.
    pub async fn encode(&self, texts: &[String]) -> TenantStoreResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let provider = self.embedding_provider.as_ref().ok_or_else(|| {
            TenantStoreError::Config("No embedding provider configured".to_string())
        })?;

        let embeddings = provider.encode(texts).await?;
        if embeddings.len() != texts.len() {
            return Err(TenantStoreError::Embedding(format!(
                "Provider returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    pub async fn health_check(&self) -> TenantStoreResult<()> {
        self.backend.health_check().await
    }
}

/// Length must match the collection and every component must be finite.
fn check_embedding(expected: usize, embedding: &[f32]) -> TenantStoreResult<()> {
    if embedding.len() != expected {
        return Err(TenantStoreError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    match embedding.iter().position(|x| !x.is_finite()) {
        Some(index) => Err(TenantStoreError::NonFiniteEmbedding { index }),
        None => Ok(()),
    }
}

fn validate_documents(documents: &[Document], dimension: usize) -> TenantStoreResult<()> {
    documents.iter().try_for_each(|document| {
        if document.id.is_empty() {
            return Err(TenantStoreError::InvalidIdentifier(
                "Document id must not be empty".to_string(),
            ));
        }
        check_embedding(dimension, &document.embedding)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockVectorBackend;
    use crate::embedding::MockEmbeddingProvider;

    fn backend_creating_collections() -> MockVectorBackend {
        let mut backend = MockVectorBackend::new();
        backend
            .expect_get_or_create_collection()
            .returning(|key, config| Ok(CollectionHandle::new(key.clone(), config)));
        backend
    }

    #[tokio::test]
    async fn test_get_or_create_uses_composed_key_and_default_config() {
        let mut backend = MockVectorBackend::new();
        backend
            .expect_get_or_create_collection()
            .withf(|key, config| key.as_str() == "tenant_acme_docs" && config.dimension == 4)
            .times(1)
            .returning(|key, config| Ok(CollectionHandle::new(key.clone(), config)));

        let store = TenantStore::new(backend, CollectionConfig::new(4));
        let handle = store.get_or_create("acme", "docs").await.unwrap();

        assert_eq!(handle.key.as_str(), "tenant_acme_docs");
    }

    #[tokio::test]
    async fn test_invalid_identifier_never_reaches_backend() {
        let mut backend = MockVectorBackend::new();
        backend.expect_get_or_create_collection().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store.add("acme", "my_docs", vec![]).await;

        assert!(matches!(result, Err(TenantStoreError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_add_rejects_dimension_mismatch_before_writing() {
        let mut backend = backend_creating_collections();
        backend.expect_add().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(3));
        let result = store
            .add(
                "acme",
                "docs",
                vec![
                    Document::new("ok", "", vec![1.0, 0.0, 0.0]),
                    Document::new("bad", "", vec![1.0, 0.0]),
                ],
            )
            .await;

        assert!(matches!(
            result,
            Err(TenantStoreError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_empty_document_id() {
        let mut backend = backend_creating_collections();
        backend.expect_add().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(1));
        let result = store.add("acme", "docs", vec![Document::new("", "", vec![1.0])]).await;

        assert!(matches!(result, Err(TenantStoreError::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_add_empty_batch_creates_collection_only() {
        let mut backend = MockVectorBackend::new();
        backend
            .expect_get_or_create_collection()
            .times(1)
            .returning(|key, config| Ok(CollectionHandle::new(key.clone(), config)));
        backend.expect_add().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(1));
        store.add("acme", "docs", vec![]).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_uses_stored_collection_dimension() {
        let mut backend = MockVectorBackend::new();
        // Collection already exists with a different dimension than the store default
        backend
            .expect_get_or_create_collection()
            .returning(|key, _| Ok(CollectionHandle::new(key.clone(), CollectionConfig::new(2))));
        backend.expect_add().times(1).returning(|_, _| Ok(()));

        let store = TenantStore::new(backend, CollectionConfig::new(5));
        store
            .add("acme", "docs", vec![Document::new("a", "", vec![1.0, 2.0])])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_rejects_zero_k() {
        let mut backend = MockVectorBackend::new();
        backend.expect_get_or_create_collection().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store.query("acme", "docs", &[1.0, 0.0], 0).await;

        assert!(matches!(result, Err(TenantStoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_query_rejects_dimension_mismatch() {
        let mut backend = backend_creating_collections();
        backend.expect_query().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store.query("acme", "docs", &[1.0, 0.0, 0.0], 1).await;

        assert!(matches!(
            result,
            Err(TenantStoreError::DimensionMismatch { expected: 2, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_add_rejects_non_finite_components_before_writing() {
        let mut backend = backend_creating_collections();
        backend.expect_add().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store
            .add(
                "acme",
                "docs",
                vec![
                    Document::new("ok", "", vec![1.0, 0.0]),
                    Document::new("nan", "", vec![f32::NAN, 0.0]),
                ],
            )
            .await;

        assert!(matches!(result, Err(TenantStoreError::NonFiniteEmbedding { index: 0 })));
    }

    #[tokio::test]
    async fn test_query_rejects_infinite_embedding() {
        let mut backend = backend_creating_collections();
        backend.expect_query().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store.query("acme", "docs", &[1.0, f32::INFINITY], 1).await;

        assert!(matches!(result, Err(TenantStoreError::NonFiniteEmbedding { index: 1 })));
    }

    #[tokio::test]
    async fn test_query_text_rejects_zero_k_before_encoding() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_encode().times(0);

        let mut backend = MockVectorBackend::new();
        backend.expect_get_or_create_collection().times(0);

        let store = TenantStore::new(backend, CollectionConfig::new(2))
            .with_embedding_provider(Arc::new(provider));
        let result = store.query_text("acme", "docs", "confidential", 0).await;

        assert!(matches!(result, Err(TenantStoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let mut backend = MockVectorBackend::new();
        backend
            .expect_get_or_create_collection()
            .returning(|_, _| Err(TenantStoreError::BackendUnavailable("connection refused".to_string())));

        let store = TenantStore::new(backend, CollectionConfig::new(2));
        let result = store.get_or_create("acme", "docs").await;

        assert!(matches!(result, Err(TenantStoreError::BackendUnavailable(_))));
    }

    #[tokio::test]
    async fn test_add_texts_requires_provider() {
        let store = TenantStore::new(MockVectorBackend::new(), CollectionConfig::new(2));
        let result = store
            .add_texts("acme", "docs", vec![TextInput::new("a", "hello")])
            .await;

        assert!(matches!(result, Err(TenantStoreError::Config(_))));
    }

    #[tokio::test]
    async fn test_add_texts_detects_short_provider_output() {
        let mut provider = MockEmbeddingProvider::new();
        provider.expect_encode().returning(|_| Ok(vec![vec![1.0, 0.0]]));

        let store = TenantStore::new(MockVectorBackend::new(), CollectionConfig::new(2))
            .with_embedding_provider(Arc::new(provider));

        let result = store
            .add_texts(
                "acme",
                "docs",
                vec![TextInput::new("a", "one"), TextInput::new("b", "two")],
            )
            .await;

        assert!(matches!(result, Err(TenantStoreError::Embedding(_))));
    }

    #[tokio::test]
    async fn test_add_texts_stores_encoded_documents() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_encode()
            .returning(|texts| Ok(texts.iter().map(|_| vec![0.0, 1.0]).collect()));

        let mut backend = backend_creating_collections();
        backend
            .expect_add()
            .withf(|_, docs| docs.len() == 1 && docs[0].id == "a" && docs[0].embedding == vec![0.0, 1.0])
            .times(1)
            .returning(|_, _| Ok(()));

        let store = TenantStore::new(backend, CollectionConfig::new(2))
            .with_embedding_provider(Arc::new(provider))
            .with_telemetry(true);

        store
            .add_texts("acme", "docs", vec![TextInput::new("a", "hello")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_text_encodes_query() {
        let mut provider = MockEmbeddingProvider::new();
        provider
            .expect_encode()
            .withf(|texts| texts.to_vec() == vec!["confidential".to_string()])
            .returning(|_| Ok(vec![vec![1.0, 0.0]]));

        let mut backend = backend_creating_collections();
        backend
            .expect_query()
            .withf(|_, embedding, k| embedding.to_vec() == vec![1.0, 0.0] && *k == 1)
            .returning(|_, _, _| Ok(vec![]));

        let store = TenantStore::new(backend, CollectionConfig::new(2))
            .with_embedding_provider(Arc::new(provider));

        assert!(store.query_text("acme", "docs", "confidential", 1).await.unwrap().is_empty());
    }
}
