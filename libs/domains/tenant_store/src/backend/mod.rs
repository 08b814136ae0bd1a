mod memory;
pub mod qdrant;

use async_trait::async_trait;

use crate::error::TenantStoreResult;
use crate::models::{CollectionConfig, CollectionHandle, Document, ScoredDocument};
use crate::naming::CollectionKey;

pub use memory::InMemoryBackend;
pub use qdrant::{QdrantBackend, QdrantConfig};

/// Storage and similarity search over keyed collections.
///
/// Backends know nothing about tenants; isolation comes from the keys the
/// store hands them. Callers validate ids and dimensions before `add` and
/// `query`; backends own duplicate handling per the collection's
/// [`DuplicatePolicy`](crate::models::DuplicatePolicy).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Return the collection stored under `key`, creating it with `config` if absent.
    ///
    /// An existing collection keeps the config it was created with.
    async fn get_or_create_collection(
        &self,
        key: &CollectionKey,
        config: CollectionConfig,
    ) -> TenantStoreResult<CollectionHandle>;

    /// Store documents in the collection.
    async fn add(
        &self,
        collection: &CollectionHandle,
        documents: Vec<Document>,
    ) -> TenantStoreResult<()>;

    /// Up to `k` documents by decreasing score, ties in insertion order.
    ///
    /// Backends that delegate the top-`k` cut to a remote engine only order
    /// ties among the hits it returns; which tied documents fall inside the
    /// cut is up to that engine.
    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>>;

    /// Cheap reachability probe for readiness checks.
    async fn health_check(&self) -> TenantStoreResult<()>;
}

/// Lets a store be built over a backend chosen at runtime.
#[async_trait]
impl VectorBackend for std::sync::Arc<dyn VectorBackend> {
    async fn get_or_create_collection(
        &self,
        key: &CollectionKey,
        config: CollectionConfig,
    ) -> TenantStoreResult<CollectionHandle> {
        (**self).get_or_create_collection(key, config).await
    }

    async fn add(
        &self,
        collection: &CollectionHandle,
        documents: Vec<Document>,
    ) -> TenantStoreResult<()> {
        (**self).add(collection, documents).await
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>> {
        (**self).query(collection, embedding, k).await
    }

    async fn health_check(&self) -> TenantStoreResult<()> {
        (**self).health_check().await
    }
}
