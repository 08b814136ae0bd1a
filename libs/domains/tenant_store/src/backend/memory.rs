use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::VectorBackend;
use crate::error::{TenantStoreError, TenantStoreResult};
use crate::models::{
    CollectionConfig, CollectionHandle, Document, DuplicatePolicy, ScoredDocument,
};
use crate::naming::CollectionKey;
use crate::similarity;

#[derive(Debug)]
struct StoredCollection {
    config: CollectionConfig,
    /// Insertion order; overwrites keep their slot
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
}

impl StoredCollection {
    fn new(config: CollectionConfig) -> Self {
        Self {
            config,
            documents: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn find_duplicate<'a>(&self, documents: &'a [Document]) -> Option<&'a str> {
        let mut seen = HashSet::new();
        documents
            .iter()
            .find(|d| self.positions.contains_key(&d.id) || !seen.insert(d.id.as_str()))
            .map(|d| d.id.as_str())
    }

    fn upsert(&mut self, document: Document) {
        match self.positions.get(&document.id) {
            Some(&pos) => self.documents[pos] = document,
            None => {
                self.positions
                    .insert(document.id.clone(), self.documents.len());
                self.documents.push(document);
            }
        }
    }
}

/// Process-local backend. Collections live as long as the backend value.
///
/// Each `add` runs under one write lock, so a batch is either fully applied
/// or (on a duplicate under `Reject`) not applied at all.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<CollectionKey, StoredCollection>>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents stored under `key` (0 if the collection does not exist).
    pub async fn document_count(&self, key: &CollectionKey) -> usize {
        let collections = self.collections.read().await;
        collections.get(key).map_or(0, |c| c.documents.len())
    }

    /// Keys of every collection created so far, sorted.
    pub async fn collection_keys(&self) -> Vec<CollectionKey> {
        let collections = self.collections.read().await;
        let mut keys: Vec<_> = collections.keys().cloned().collect();
        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        keys
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn get_or_create_collection(
        &self,
        key: &CollectionKey,
        config: CollectionConfig,
    ) -> TenantStoreResult<CollectionHandle> {
        let mut collections = self.collections.write().await;

        let stored = collections.entry(key.clone()).or_insert_with(|| {
            tracing::info!(collection = %key, dimension = config.dimension, "Created collection");
            StoredCollection::new(config)
        });

        Ok(CollectionHandle::new(key.clone(), stored.config))
    }

    async fn add(
        &self,
        collection: &CollectionHandle,
        documents: Vec<Document>,
    ) -> TenantStoreResult<()> {
        let mut collections = self.collections.write().await;
        let stored = collections
            .entry(collection.key.clone())
            .or_insert_with(|| StoredCollection::new(collection.config));

        if stored.config.duplicate_policy == DuplicatePolicy::Reject {
            if let Some(id) = stored.find_duplicate(&documents) {
                return Err(TenantStoreError::DuplicateId {
                    collection: collection.key.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let count = documents.len();
        documents.into_iter().for_each(|d| stored.upsert(d));

        tracing::debug!(collection = %collection.key, count, total = stored.documents.len(), "Stored documents");
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>> {
        let collections = self.collections.read().await;
        let Some(stored) = collections.get(&collection.key) else {
            return Ok(Vec::new());
        };

        let metric = stored.config.distance;
        let mut scored: Vec<ScoredDocument> = stored
            .documents
            .iter()
            .map(|d| ScoredDocument {
                score: similarity::score(metric, embedding, &d.embedding),
                document: d.clone(),
            })
            .collect();

        // Stable sort: equal scores stay in insertion order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);

        Ok(scored)
    }

    async fn health_check(&self) -> TenantStoreResult<()> {
        Ok(())
    }
}
