use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

use crate::naming::CollectionKey;

/// A stored document with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Document {
    /// Unique within a collection
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }
}

/// Text awaiting embedding before it becomes a [`Document`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TextInput {
    pub id: String,
    pub text: String,
}

impl TextInput {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Query hit. Higher scores are more similar regardless of metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Similarity metric used to rank query results
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    DotProduct,
    /// Scored as the negated euclidean distance
    Euclidean,
}

/// What `add` does when a document id is already present
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DuplicatePolicy {
    /// Fail the whole batch with `DuplicateId`
    #[default]
    Reject,
    /// Replace text and embedding; the document keeps its original position
    Overwrite,
}

/// Settings a collection is created with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CollectionConfig {
    pub dimension: usize,
    pub distance: DistanceMetric,
    pub duplicate_policy: DuplicatePolicy,
}

impl CollectionConfig {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            distance: DistanceMetric::default(),
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

/// A resolved collection: its key and the config it was created with
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CollectionHandle {
    pub key: CollectionKey,
    pub config: CollectionConfig,
}

impl CollectionHandle {
    pub fn new(key: CollectionKey, config: CollectionConfig) -> Self {
        Self { key, config }
    }
}
