#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! Every test gets its own in-memory SQLite database with the content
//! schema applied, wired into the REAL kernel state and routes.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use warta_kernel::config::Config;
use warta_kernel::listing::{ListCache, ListService};
use warta_kernel::resources::ResourceCatalog;
use warta_kernel::routes;
use warta_kernel::state::AppState;
use warta_kernel::store::{RowStore, SqliteStore};

/// Storage call limit used by tests.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Fresh database with the content schema.
pub async fn pool() -> SqlitePool {
    warta_test_utils::memory_pool()
        .await
        .expect("failed to open in-memory database")
}

/// Row store over `pool`.
pub fn store(pool: &SqlitePool) -> Arc<dyn RowStore> {
    Arc::new(SqliteStore::new(pool.clone(), QUERY_TIMEOUT))
}

/// Uncached list service over `pool`.
pub fn service(pool: &SqlitePool) -> ListService {
    ListService::new(store(pool))
}

/// List service over `pool` with a result cache.
pub fn cached_service(pool: &SqlitePool) -> ListService {
    service(pool).with_cache(ListCache::new(Duration::from_secs(60), 100))
}

/// Built-in resource catalog.
pub fn catalog() -> ResourceCatalog {
    ResourceCatalog::builtin().expect("built-in resources must be valid")
}

/// Configuration for a test app; the database URL is not used.
pub fn config() -> Config {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("sqlite::memory:".to_string()),
        _ => None,
    })
    .expect("test config must load")
}

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub db: SqlitePool,
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with an empty database.
    pub async fn new() -> Self {
        let db = pool().await;
        let state = AppState::from_parts(&config(), store(&db), catalog());
        let router = routes::router().with_state(state.clone());
        Self { router, db, state }
    }

    /// Send a GET request.
    pub async fn get(&self, uri: &str) -> Response {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Send a GET request and decode the JSON body.
    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let response = self.get(uri).await;
        let status = response.status();
        (status, response_json(response).await)
    }
}

/// Extract JSON from a response body.
pub async fn response_json(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
