//! Tenant Store Domain
//!
//! Per-tenant namespaced document collections over a vector database. Every
//! collection lives under a key derived from its tenant, so one tenant can
//! never read or write another tenant's documents.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Handlers     │  ← HTTP endpoints
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐     ┌──────────────────┐
//! │   TenantStore   │────▶│ EmbeddingProvider│
//! │ (naming, checks)│     │     (trait)      │
//! └────────┬────────┘     └────────┬─────────┘
//!          │                       │
//! ┌────────▼────────┐     ┌────────▼─────────┐
//! │  VectorBackend  │     │ HashingProvider  │
//! │     (trait)     │     │ OpenAIProvider   │
//! └────────┬────────┘     └──────────────────┘
//!          │
//! ┌────────▼────────┐
//! │ InMemoryBackend │
//! │  QdrantBackend  │
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_tenant_store::{CollectionConfig, Document, InMemoryBackend, TenantStore};
//!
//! # async fn example() -> Result<(), domain_tenant_store::TenantStoreError> {
//! let store = TenantStore::new(InMemoryBackend::new(), CollectionConfig::new(2));
//!
//! store
//!     .add("tenant_a", "docs", vec![Document::new("a1", "Tenant A data", vec![1.0, 0.0])])
//!     .await?;
//!
//! let hits = store.query("tenant_a", "docs", &[1.0, 0.0], 1).await?;
//! assert_eq!(hits[0].document.id, "a1");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod models;
pub mod naming;
pub mod service;
pub mod similarity;

// Re-export commonly used types
pub use backend::{InMemoryBackend, QdrantBackend, QdrantConfig, VectorBackend};
pub use config::{BackendKind, EmbeddingProviderKind, EmbeddingSettings, TenantStoreConfig};
pub use embedding::{EmbeddingProvider, HashingProvider, OpenAIConfig, OpenAIProvider};
pub use error::{TenantStoreError, TenantStoreResult};
pub use handlers::ApiDoc;
pub use models::{
    CollectionConfig, CollectionHandle, DistanceMetric, Document, DuplicatePolicy, ScoredDocument,
    TextInput,
};
pub use naming::{CollectionKey, CollectionName, TenantId, compose};
pub use service::TenantStore;
