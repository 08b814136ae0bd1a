use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, CreateCollectionBuilder, Distance, GetPointsBuilder, PointId, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use uuid::Uuid;

use super::QdrantConfig;
use crate::backend::VectorBackend;
use crate::error::{TenantStoreError, TenantStoreResult};
use crate::models::{
    CollectionConfig, CollectionHandle, DistanceMetric, Document, DuplicatePolicy, ScoredDocument,
};
use crate::naming::CollectionKey;

const DOC_ID_FIELD: &str = "doc_id";
const TEXT_FIELD: &str = "text";
const SEQ_FIELD: &str = "seq";

/// Hands out insertion sequence numbers for tie-breaking.
///
/// Values never go backwards within a process and track wall-clock
/// microseconds, so batches from separate processes interleave by time.
#[derive(Debug, Default)]
struct SequenceAllocator {
    next: AtomicI64,
}

impl SequenceAllocator {
    /// Reserve `count` consecutive numbers and return the first.
    fn reserve(&self, count: usize) -> i64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);

        let mut current = self.next.load(Ordering::Relaxed);
        loop {
            let base = current.max(now);
            match self.next.compare_exchange_weak(
                current,
                base + count as i64,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return base,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Qdrant-backed implementation of VectorBackend.
///
/// Each collection key maps to one Qdrant collection. Point ids are UUIDv5
/// digests of document ids; the original id, text and insertion sequence
/// travel in the payload.
pub struct QdrantBackend {
    client: Qdrant,
    sequence: SequenceAllocator,
}

impl QdrantBackend {
    pub fn new(config: QdrantConfig) -> TenantStoreResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder.build().map_err(|e| {
            TenantStoreError::BackendUnavailable(format!("Failed to build client: {}", e))
        })?;

        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Qdrant) -> Self {
        Self {
            client,
            sequence: SequenceAllocator::default(),
        }
    }

    async fn describe_collection(&self, key: &CollectionKey) -> TenantStoreResult<(usize, DistanceMetric)> {
        let info = self.client.collection_info(key.as_str()).await?;

        let result = info
            .result
            .ok_or_else(|| TenantStoreError::Internal("Collection info missing result".to_string()))?;

        extract_vector_params(&result.config).ok_or_else(|| {
            TenantStoreError::Internal(format!("Collection '{}' has no vector params", key))
        })
    }

    /// Existing points for `ids`, keyed by document id, with their sequence numbers.
    async fn existing_sequences(
        &self,
        key: &CollectionKey,
        ids: &[&str],
    ) -> TenantStoreResult<HashMap<String, i64>> {
        let point_ids: Vec<PointId> = ids.iter().map(|id| point_id_for(id)).collect();
        let builder = GetPointsBuilder::new(key.as_str(), point_ids)
            .with_payload(true)
            .with_vectors(false);

        let response = self.client.get_points(builder).await?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let doc_id = payload_string(&point.payload, DOC_ID_FIELD)?;
                let seq = payload_integer(&point.payload, SEQ_FIELD).unwrap_or(0);
                Some((doc_id, seq))
            })
            .collect())
    }
}

/// Deterministic point id for a document id.
fn point_id_for(doc_id: &str) -> PointId {
    PointId::from(Uuid::new_v5(&Uuid::NAMESPACE_OID, doc_id.as_bytes()).to_string())
}

fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclidean => Distance::Euclid,
        DistanceMetric::DotProduct => Distance::Dot,
    }
}

fn from_qdrant_distance(distance: Distance) -> DistanceMetric {
    match distance {
        Distance::Euclid => DistanceMetric::Euclidean,
        Distance::Dot => DistanceMetric::DotProduct,
        _ => DistanceMetric::Cosine,
    }
}

/// Qdrant reports euclidean results as distances; flip them so higher is closer.
fn orient_score(metric: DistanceMetric, raw: f32) -> f32 {
    match metric {
        DistanceMetric::Euclidean => -raw,
        _ => raw,
    }
}

fn extract_vector_params(config: &Option<qdrant::CollectionConfig>) -> Option<(usize, DistanceMetric)> {
    let vectors_config = config.as_ref()?.params.as_ref()?.vectors_config.as_ref()?;

    let params = match vectors_config.config.as_ref()? {
        qdrant::vectors_config::Config::Params(p) => p,
        qdrant::vectors_config::Config::ParamsMap(map) => map.map.values().next()?,
    };

    Some((params.size as usize, from_qdrant_distance(params.distance())))
}

/// Extract vector values from VectorsOutput
/// Note: Uses deprecated data field until migration to 1.18+
#[allow(deprecated)]
fn extract_vector(vectors: &Option<qdrant::VectorsOutput>) -> Vec<f32> {
    match vectors {
        Some(qdrant::VectorsOutput {
            vectors_options: Some(opts),
        }) => match opts {
            qdrant::vectors_output::VectorsOptions::Vector(v) => v.data.clone(),
            qdrant::vectors_output::VectorsOptions::Vectors(map) => map
                .vectors
                .values()
                .next()
                .map(|v| v.data.clone())
                .unwrap_or_default(),
        },
        _ => Vec::new(),
    }
}

fn payload_string(payload: &HashMap<String, QdrantValue>, field: &str) -> Option<String> {
    match payload.get(field)?.kind.as_ref()? {
        qdrant::value::Kind::StringValue(s) => Some(s.clone()),
        _ => None,
    }
}

fn payload_integer(payload: &HashMap<String, QdrantValue>, field: &str) -> Option<i64> {
    match payload.get(field)?.kind.as_ref()? {
        qdrant::value::Kind::IntegerValue(i) => Some(*i),
        _ => None,
    }
}

/// Orders hits by score, then by insertion sequence.
///
/// Only the hits Qdrant returned are reordered. When tied scores straddle the
/// `k` boundary, Qdrant picks which of them make the cut.
fn rank_hits(mut hits: Vec<(i64, ScoredDocument)>) -> Vec<ScoredDocument> {
    hits.sort_by(|(seq_a, a), (seq_b, b)| b.score.total_cmp(&a.score).then(seq_a.cmp(seq_b)));
    hits.into_iter().map(|(_, hit)| hit).collect()
}

fn document_payload(document: &Document, seq: i64) -> HashMap<String, QdrantValue> {
    HashMap::from([
        (DOC_ID_FIELD.to_string(), QdrantValue::from(document.id.clone())),
        (TEXT_FIELD.to_string(), QdrantValue::from(document.text.clone())),
        (SEQ_FIELD.to_string(), QdrantValue::from(seq)),
    ])
}

/// Collapse repeated ids: the last occurrence wins but keeps the first one's position.
fn dedupe_last_wins(documents: Vec<Document>) -> Vec<Document> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Document> = Vec::with_capacity(documents.len());

    for document in documents {
        match positions.get(&document.id) {
            Some(&pos) => unique[pos] = document,
            None => {
                positions.insert(document.id.clone(), unique.len());
                unique.push(document);
            }
        }
    }

    unique
}

fn first_repeated_id(documents: &[Document]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    documents
        .iter()
        .find(|d| !seen.insert(d.id.as_str()))
        .map(|d| d.id.as_str())
}

#[async_trait]
impl VectorBackend for QdrantBackend {
    async fn get_or_create_collection(
        &self,
        key: &CollectionKey,
        config: CollectionConfig,
    ) -> TenantStoreResult<CollectionHandle> {
        if !self.client.collection_exists(key.as_str()).await? {
            let builder = CreateCollectionBuilder::new(key.as_str()).vectors_config(
                VectorParamsBuilder::new(config.dimension as u64, to_qdrant_distance(config.distance)),
            );

            match self.client.create_collection(builder).await {
                Ok(_) => {
                    tracing::info!(collection = %key, dimension = config.dimension, "Created Qdrant collection");
                    return Ok(CollectionHandle::new(key.clone(), config));
                }
                Err(e) => {
                    // Lost a creation race; read what the winner made
                    if !self.client.collection_exists(key.as_str()).await? {
                        return Err(e.into());
                    }
                    tracing::debug!(collection = %key, error = %e, "Collection created concurrently");
                }
            }
        }

        let (dimension, distance) = self.describe_collection(key).await?;
        let stored = CollectionConfig {
            dimension,
            distance,
            duplicate_policy: config.duplicate_policy,
        };

        Ok(CollectionHandle::new(key.clone(), stored))
    }

    async fn add(
        &self,
        collection: &CollectionHandle,
        documents: Vec<Document>,
    ) -> TenantStoreResult<()> {
        if documents.is_empty() {
            return Ok(());
        }

        let key = &collection.key;
        let policy = collection.config.duplicate_policy;

        if policy == DuplicatePolicy::Reject {
            if let Some(id) = first_repeated_id(&documents) {
                return Err(TenantStoreError::DuplicateId {
                    collection: key.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let documents = dedupe_last_wins(documents);
        let ids: Vec<&str> = documents.iter().map(|d| d.id.as_str()).collect();
        let existing = self.existing_sequences(key, &ids).await?;

        if policy == DuplicatePolicy::Reject {
            if let Some(id) = ids.iter().find(|id| existing.contains_key(**id)) {
                return Err(TenantStoreError::DuplicateId {
                    collection: key.to_string(),
                    id: id.to_string(),
                });
            }
        }

        let base = self.sequence.reserve(documents.len());
        let count = documents.len();

        let points: Vec<PointStruct> = documents
            .into_iter()
            .enumerate()
            .map(|(i, document)| {
                // Overwrites keep the slot they were first inserted in
                let seq = existing
                    .get(&document.id)
                    .copied()
                    .unwrap_or(base + i as i64);
                let payload = document_payload(&document, seq);
                PointStruct::new(point_id_for(&document.id), document.embedding, payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(key.as_str(), points).wait(true))
            .await?;

        tracing::debug!(collection = %key, count, overwritten = existing.len(), "Upserted points");
        Ok(())
    }

    async fn query(
        &self,
        collection: &CollectionHandle,
        embedding: &[f32],
        k: usize,
    ) -> TenantStoreResult<Vec<ScoredDocument>> {
        let metric = collection.config.distance;
        let builder = SearchPointsBuilder::new(collection.key.as_str(), embedding.to_vec(), k as u64)
            .with_payload(true)
            .with_vectors(true);

        let response = self.client.search_points(builder).await?;

        let hits: Vec<(i64, ScoredDocument)> = response
            .result
            .into_iter()
            .map(|point| {
                let id = payload_string(&point.payload, DOC_ID_FIELD).ok_or_else(|| {
                    TenantStoreError::Internal(format!(
                        "Point in '{}' is missing '{}'",
                        collection.key, DOC_ID_FIELD
                    ))
                })?;
                let text = payload_string(&point.payload, TEXT_FIELD).unwrap_or_default();
                let seq = payload_integer(&point.payload, SEQ_FIELD).unwrap_or(i64::MAX);

                Ok((
                    seq,
                    ScoredDocument {
                        document: Document::new(id, text, extract_vector(&point.vectors)),
                        score: orient_score(metric, point.score),
                    },
                ))
            })
            .collect::<TenantStoreResult<_>>()?;

        Ok(rank_hits(hits))
    }

    async fn health_check(&self) -> TenantStoreResult<()> {
        self.client.health_check().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_id_is_deterministic_per_document() {
        assert_eq!(point_id_for("doc-1"), point_id_for("doc-1"));
        assert_ne!(point_id_for("doc-1"), point_id_for("doc-2"));
    }

    #[test]
    fn test_distance_mapping() {
        for metric in [
            DistanceMetric::Cosine,
            DistanceMetric::DotProduct,
            DistanceMetric::Euclidean,
        ] {
            assert_eq!(from_qdrant_distance(to_qdrant_distance(metric)), metric);
        }
    }

    #[test]
    fn test_euclidean_scores_are_negated() {
        assert_eq!(orient_score(DistanceMetric::Euclidean, 2.5), -2.5);
        assert_eq!(orient_score(DistanceMetric::Cosine, 0.9), 0.9);
    }

    #[test]
    fn test_document_payload_fields() {
        let doc = Document::new("a", "alpha", vec![1.0]);
        let payload = document_payload(&doc, 42);

        assert_eq!(payload_string(&payload, DOC_ID_FIELD).as_deref(), Some("a"));
        assert_eq!(payload_string(&payload, TEXT_FIELD).as_deref(), Some("alpha"));
        assert_eq!(payload_integer(&payload, SEQ_FIELD), Some(42));
        assert_eq!(payload_integer(&payload, TEXT_FIELD), None);
    }

    #[test]
    fn test_dedupe_keeps_first_position_and_last_value() {
        let docs = vec![
            Document::new("a", "one", vec![1.0]),
            Document::new("b", "two", vec![2.0]),
            Document::new("a", "three", vec![3.0]),
        ];

        let unique = dedupe_last_wins(docs);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, "a");
        assert_eq!(unique[0].text, "three");
        assert_eq!(unique[1].id, "b");
    }

    #[test]
    fn test_first_repeated_id() {
        let docs = vec![
            Document::new("a", "", vec![]),
            Document::new("b", "", vec![]),
            Document::new("b", "", vec![]),
        ];
        assert_eq!(first_repeated_id(&docs), Some("b"));
        assert_eq!(first_repeated_id(&docs[..2]), None);
    }

    #[test]
    fn test_rank_hits_breaks_ties_by_sequence() {
        let hit = |id: &str, score: f32| ScoredDocument {
            document: Document::new(id, "", vec![]),
            score,
        };
        let ranked = rank_hits(vec![
            (7, hit("late", 0.5)),
            (9, hit("best", 0.9)),
            (3, hit("early", 0.5)),
        ]);

        let ids: Vec<_> = ranked.iter().map(|h| h.document.id.as_str()).collect();
        assert_eq!(ids, vec!["best", "early", "late"]);
    }

    #[test]
    fn test_sequence_allocator_is_monotonic() {
        let allocator = SequenceAllocator::default();
        let first = allocator.reserve(10);
        let second = allocator.reserve(1);
        assert!(second >= first + 10);
    }

    #[test]
    fn test_extract_vector_params_missing_config() {
        assert!(extract_vector_params(&None).is_none());
    }
}
