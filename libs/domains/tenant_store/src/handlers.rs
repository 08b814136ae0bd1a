use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use axum_helpers::{
    ValidatedJson,
    errors::responses::{
        BadRequestValidationResponse, ConflictResponse, InternalServerErrorResponse,
        ServiceUnavailableResponse, UnprocessableEntityResponse,
    },
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use validator::{Validate, ValidationError};

use crate::backend::VectorBackend;
use crate::error::TenantStoreResult;
use crate::models::{Document, ScoredDocument};
use crate::naming::compose;
use crate::service::TenantStore;

const TAG: &str = "tenant-collections";

/// OpenAPI documentation for the tenant collections API
#[derive(OpenApi)]
#[openapi(
    paths(add_documents, query_collection),
    components(
        schemas(
            DocumentInput, AddDocumentsRequest, AddDocumentsResponse,
            QueryRequest, QueryHit, QueryResponse
        ),
        responses(
            BadRequestValidationResponse,
            ConflictResponse,
            UnprocessableEntityResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Tenant-isolated document collections")
    )
)]
pub struct ApiDoc;

/// Document to add; without an embedding its text is encoded by the server
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DocumentInput {
    #[validate(length(min = 1))]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddDocumentsRequest {
    #[validate(nested)]
    pub documents: Vec<DocumentInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddDocumentsResponse {
    pub collection: String,
    pub added: usize,
}

/// Similarity query; exactly one of `embedding` or `text`
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_query_input"))]
pub struct QueryRequest {
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub text: Option<String>,
    #[validate(range(min = 1))]
    pub k: usize,
}

fn validate_query_input(request: &QueryRequest) -> Result<(), ValidationError> {
    match (&request.embedding, &request.text) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(ValidationError::new("embedding_xor_text")
            .with_message("Provide exactly one of 'embedding' or 'text'".into())),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryHit {
    pub id: String,
    pub text: String,
    pub score: f32,
}

impl From<ScoredDocument> for QueryHit {
    fn from(hit: ScoredDocument) -> Self {
        Self {
            id: hit.document.id,
            text: hit.document.text,
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub collection: String,
    pub results: Vec<QueryHit>,
}

/// Create the tenant collections router
pub fn router<B: VectorBackend + 'static>(store: Arc<TenantStore<B>>) -> Router {
    Router::new()
        .route(
            "/tenants/{tenant}/collections/{name}/documents",
            post(add_documents::<B>),
        )
        .route(
            "/tenants/{tenant}/collections/{name}/query",
            post(query_collection::<B>),
        )
        .with_state(store)
}

/// Add documents to a tenant's collection, creating it on first use
#[utoipa::path(
    post,
    path = "/tenants/{tenant}/collections/{name}/documents",
    tag = TAG,
    params(
        ("tenant" = String, Path, description = "Tenant id"),
        ("name" = String, Path, description = "Collection name (no '_')")
    ),
    request_body = AddDocumentsRequest,
    responses(
        (status = 201, description = "Documents stored", body = AddDocumentsResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_documents<B: VectorBackend>(
    State(store): State<Arc<TenantStore<B>>>,
    Path((tenant, name)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<AddDocumentsRequest>,
) -> TenantStoreResult<impl IntoResponse> {
    let key = compose(&tenant, &name)?;

    let missing: Vec<String> = input
        .documents
        .iter()
        .filter(|d| d.embedding.is_none())
        .map(|d| d.text.clone())
        .collect();
    let mut encoded = store.encode(&missing).await?.into_iter();

    let documents: Vec<Document> = input
        .documents
        .into_iter()
        .map(|d| {
            let embedding = d
                .embedding
                .or_else(|| encoded.next())
                .unwrap_or_default();
            Document::new(d.id, d.text, embedding)
        })
        .collect();

    let added = documents.len();
    store.add(&tenant, &name, documents).await?;

    Ok((
        StatusCode::CREATED,
        Json(AddDocumentsResponse {
            collection: key.to_string(),
            added,
        }),
    ))
}

/// Query a tenant's collection by embedding or text
#[utoipa::path(
    post,
    path = "/tenants/{tenant}/collections/{name}/query",
    tag = TAG,
    params(
        ("tenant" = String, Path, description = "Tenant id"),
        ("name" = String, Path, description = "Collection name (no '_')")
    ),
    request_body = QueryRequest,
    responses(
        (status = 200, description = "Most similar documents", body = QueryResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 422, response = UnprocessableEntityResponse),
        (status = 503, response = ServiceUnavailableResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn query_collection<B: VectorBackend>(
    State(store): State<Arc<TenantStore<B>>>,
    Path((tenant, name)): Path<(String, String)>,
    ValidatedJson(input): ValidatedJson<QueryRequest>,
) -> TenantStoreResult<Json<QueryResponse>> {
    let key = compose(&tenant, &name)?;

    let hits = match (input.embedding, input.text) {
        (Some(embedding), _) => store.query(&tenant, &name, &embedding, input.k).await?,
        (None, Some(text)) => store.query_text(&tenant, &name, &text, input.k).await?,
        // Ruled out by validation
        (None, None) => Vec::new(),
    };

    Ok(Json(QueryResponse {
        collection: key.to_string(),
        results: hits.into_iter().map(QueryHit::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_request_requires_exactly_one_input() {
        let both = QueryRequest {
            embedding: Some(vec![1.0]),
            text: Some("hi".to_string()),
            k: 1,
        };
        assert!(both.validate().is_err());

        let neither = QueryRequest {
            embedding: None,
            text: None,
            k: 1,
        };
        assert!(neither.validate().is_err());

        let text_only = QueryRequest {
            embedding: None,
            text: Some("hi".to_string()),
            k: 3,
        };
        assert!(text_only.validate().is_ok());
    }

    #[test]
    fn test_query_request_rejects_zero_k() {
        let request = QueryRequest {
            embedding: Some(vec![1.0]),
            text: None,
            k: 0,
        };
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("k"));
    }

    #[test]
    fn test_add_request_validates_nested_ids() {
        let request = AddDocumentsRequest {
            documents: vec![DocumentInput {
                id: String::new(),
                text: "x".to_string(),
                embedding: None,
            }],
        };
        assert!(request.validate().is_err());
    }
}
