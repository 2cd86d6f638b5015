//! Collection list API routes.
//!
//! REST endpoints serving paginated collections from the resource catalog.

use std::collections::HashMap;

use axum::{
    Router,
    extract::{Path, Query, State},
    response::Json,
    routing::get,
};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use crate::error::{AppError, AppResult};
use crate::listing::{ListParams, Pagination, Resource};
use crate::state::AppState;

/// Create the list router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/collections", get(list_collections))
        .route("/api/{collection}", get(list_collection))
}

// -------------------------------------------------------------------------
// Response types
// -------------------------------------------------------------------------

/// Pagination block of the HTTP envelope.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaginationResponse {
    total: u64,
    page: u32,
    limit: u32,
    total_pages: u32,
}

impl From<Pagination> for PaginationResponse {
    fn from(p: Pagination) -> Self {
        Self {
            total: p.total,
            page: p.page,
            limit: p.page_size,
            total_pages: p.total_pages,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CollectionSummary {
    name: String,
    envelope: String,
    filters: Vec<String>,
    sorts: Vec<String>,
    default_sort: String,
    default_order: &'static str,
    searchable: bool,
    relations: Vec<String>,
}

impl From<&Resource> for CollectionSummary {
    fn from(resource: &Resource) -> Self {
        Self {
            name: resource.name.clone(),
            envelope: resource.envelope.clone(),
            filters: resource.filters.iter().map(|f| f.param.clone()).collect(),
            sorts: resource.sortable.iter().map(|s| s.key.clone()).collect(),
            default_sort: resource.default_sort.clone(),
            default_order: resource.default_direction.as_str(),
            searchable: !resource.searchable.is_empty(),
            relations: resource.relations.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

// -------------------------------------------------------------------------
// Handlers
// -------------------------------------------------------------------------

/// List registered collections.
async fn list_collections(State(state): State<AppState>) -> Json<Vec<CollectionSummary>> {
    Json(state.catalog().iter().map(CollectionSummary::from).collect())
}

/// List one page of a collection.
async fn list_collection(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> AppResult<Json<JsonValue>> {
    let resource = state.catalog().get(&collection).ok_or(AppError::NotFound)?;
    let params = ListParams::from_query(query);

    let result = state.lists().list(resource, &params).await?;

    let pagination = serde_json::to_value(PaginationResponse::from(result.pagination))
        .map_err(anyhow::Error::from)?;

    let mut body = Map::new();
    body.insert(resource.envelope.clone(), JsonValue::Array(result.items));
    body.insert("pagination".to_string(), pagination);

    Ok(Json(JsonValue::Object(body)))
}
