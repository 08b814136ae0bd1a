//! Tenant API Service
//!
//! HTTP front end for tenant-isolated document collections.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   ↓ (JSON over HTTP)
//! handlers (domain_tenant_store)
//!   ↓
//! TenantStore ──→ EmbeddingProvider (hashing | OpenAI)
//!   ↓
//! VectorBackend (in-memory | Qdrant)
//! ```
//!
//! ## Modules
//!
//! - `config`: Application configuration from the environment
//! - `server`: Server initialization and lifecycle
//! - `health`: Readiness endpoint backed by the vector backend
//! - `demo`: Two-tenant isolation walkthrough

pub mod config;
pub mod demo;
pub mod health;
pub mod server;

use std::sync::Arc;

use domain_tenant_store::{TenantStore, VectorBackend};

/// Store over whichever backend the configuration selected
pub type SharedStore = Arc<TenantStore<Arc<dyn VectorBackend>>>;

pub use demo::run_demo;
pub use server::{build_router, run};
