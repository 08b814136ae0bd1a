//! Two-tenant isolation walkthrough.
//!
//! Stores one document for `tenant_a` and one for `tenant_b` under the same
//! collection name, then queries each tenant with the same text.

use core_config::tracing::init_tracing;
use domain_tenant_store::{DuplicatePolicy, ScoredDocument, TenantStore, TextInput};
use eyre::{Result, WrapErr};
use tracing::info;

use crate::config::Config;

const COLLECTION: &str = "docs";

/// Demo documents: `(tenant, id, text)`
const DOCUMENTS: [(&str, &str, &str); 2] = [
    ("tenant_a", "a1", "Tenant A confidential document."),
    ("tenant_b", "b1", "Tenant B internal memo."),
];

/// Seed both tenants and return what each one sees for `query`.
pub async fn seed_and_query<B>(
    store: &TenantStore<B>,
    query: &str,
    k: usize,
) -> Result<Vec<(&'static str, Vec<ScoredDocument>)>>
where
    B: domain_tenant_store::VectorBackend,
{
    for (tenant, id, text) in DOCUMENTS {
        store
            .add_texts(tenant, COLLECTION, vec![TextInput::new(id, text)])
            .await
            .wrap_err_with(|| format!("Failed to add {} for {}", id, tenant))?;
    }

    let mut seen = Vec::with_capacity(DOCUMENTS.len());
    for (tenant, _, _) in DOCUMENTS {
        let hits = store
            .query_text(tenant, COLLECTION, query, k)
            .await
            .wrap_err_with(|| format!("Query failed for {}", tenant))?;
        seen.push((tenant, hits));
    }

    Ok(seen)
}

/// Run the demo against the configured backend and print the results.
pub async fn run_demo(query: &str, k: usize) -> Result<()> {
    let mut config = Config::from_env().wrap_err("Failed to load configuration")?;
    init_tracing(&config.environment);

    // Re-runs against a persistent backend replace the demo documents
    config.store.duplicate_policy = DuplicatePolicy::Overwrite;

    let store = crate::server::build_store(&config.store)?;
    info!(backend = %config.store.backend, query, k, "Running isolation demo");

    for (tenant, hits) in seed_and_query(store.as_ref(), query, k).await? {
        println!("{} / {} -> query {:?}", tenant, COLLECTION, query);
        if hits.is_empty() {
            println!("  (no results)");
        }
        for hit in hits {
            println!(
                "  {:<4} {:>8.4}  {}",
                hit.document.id, hit.score, hit.document.text
            );
        }
    }

    Ok(())
}
