#![allow(clippy::unwrap_used, clippy::expect_used)]
//! PostgreSQL store tests.
//!
//! These need a live server: set `TEST_POSTGRES_URL` to run them. Without it
//! every test returns early.

use std::sync::Arc;
use std::time::Duration;

use sea_query::Values;
use serde_json::json;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use warta_kernel::listing::{FilterField, ListParams, ListService, Resource, SortDirection};
use warta_kernel::store::{BuiltQuery, PgStore, RowStore};

/// Single-connection pool with a temporary `sessions` table, or `None`
/// when no server is configured.
async fn pool() -> Option<PgPool> {
    let Ok(url) = std::env::var("TEST_POSTGRES_URL") else {
        eprintln!("TEST_POSTGRES_URL not set, skipping");
        return None;
    };

    // Temporary tables live on one connection.
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("failed to connect to PostgreSQL");

    sqlx::raw_sql(
        r#"
        CREATE TEMP TABLE sessions (
            id INT8 PRIMARY KEY,
            title TEXT NOT NULL,
            published BOOL NOT NULL,
            seats INT4,
            score FLOAT8,
            starts_at TIMESTAMP NOT NULL,
            day DATE,
            meta JSONB,
            note TEXT
        );
        INSERT INTO sessions VALUES
            (1, 'ÉTÉ Festival', true, 40, 1.5, '2024-05-05 18:00:00', '2024-05-05', '{"room": "A"}', NULL),
            (2, 'Winter Gala', false, NULL, NULL, '2024-05-06 00:00:00', NULL, NULL, NULL),
            (3, 'Late Night', true, 10, 0.25, '2024-05-04 23:59:59', NULL, NULL, 'n/a');
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    Some(pool)
}

fn sessions() -> Resource {
    Resource::builder("sessions", "sessions")
        .searchable(&["title", "note"])
        .filter(FilterField::on_or_after("from", "starts_at"))
        .filter(FilterField::on_or_before("to", "starts_at"))
        .sort("startsAt", "starts_at")
        .default_sort("startsAt", SortDirection::Asc)
        .tie_breaker("id")
        .build()
        .unwrap()
}

#[tokio::test]
async fn rows_decode_by_column_type() {
    let Some(pool) = pool().await else {
        return;
    };
    let store = PgStore::new(pool, Duration::from_secs(5));

    let query = BuiltQuery {
        sql: "SELECT * FROM sessions WHERE id = 1".to_string(),
        values: Values(Vec::new()),
    };
    let rows = store.fetch_all(&query).await.unwrap();

    assert_eq!(
        rows,
        vec![json!({
            "id": 1,
            "title": "ÉTÉ Festival",
            "published": true,
            "seats": 40,
            "score": 1.5,
            "starts_at": "2024-05-05T18:00:00",
            "day": "2024-05-05",
            "meta": {"room": "A"},
            "note": null
        })]
    );
}

#[tokio::test]
async fn search_and_dates_run_on_postgres() {
    let Some(pool) = pool().await else {
        return;
    };
    let service = ListService::new(Arc::new(PgStore::new(pool, Duration::from_secs(5))));
    let resource = sessions();

    let search = service
        .list(&resource, &ListParams::default().search("été"))
        .await
        .unwrap();
    assert_eq!(search.pagination.total, 1);
    assert_eq!(search.items[0]["id"], json!(1));

    let same_day = service
        .list(
            &resource,
            &ListParams::default()
                .filter("from", "2024-05-05")
                .filter("to", "2024-05-05"),
        )
        .await
        .unwrap();
    assert_eq!(same_day.pagination.total, 1);
    assert_eq!(same_day.items[0]["title"], json!("ÉTÉ Festival"));

    let literal = service
        .list(&resource, &ListParams::default().search("n/a%"))
        .await
        .unwrap();
    assert_eq!(literal.pagination.total, 0);
}
