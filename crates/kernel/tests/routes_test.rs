#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP tests for the list and health routes.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use warta_test_utils::{assert, test_event, test_mail, test_publication, timestamp};

#[tokio::test]
async fn health_reports_database() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "healthy", "database": true}));
}

#[tokio::test]
async fn list_wraps_items_in_resource_envelope() {
    let app = TestApp::new().await;
    for i in 0..12 {
        test_publication(&format!("Paper {i:02}"))
            .created(timestamp(i))
            .insert(&app.db)
            .await
            .unwrap();
    }

    let (status, body) = app.get_json("/api/publications?page=2&limit=5").await;
    assert_eq!(status, StatusCode::OK);
    assert::has_key(&body, "publications");
    assert_eq!(
        body["pagination"],
        json!({"total": 12, "page": 2, "limit": 5, "totalPages": 3})
    );

    let items = body["publications"].as_array().unwrap();
    assert_eq!(
        assert::field_values(items, "title"),
        vec!["Paper 06", "Paper 05", "Paper 04", "Paper 03", "Paper 02"]
    );
}

#[tokio::test]
async fn mails_use_items_envelope() {
    let app = TestApp::new().await;
    test_mail("M-100", "Invoice").insert(&app.db).await.unwrap();
    test_mail("M-101", "Receipt").outgoing().insert(&app.db).await.unwrap();

    let (status, body) = app.get_json("/api/mails?type=OUTGOING").await;
    assert_eq!(status, StatusCode::OK);
    assert::has_key(&body, "items");
    assert_eq!(body["pagination"]["total"], json!(1));
    assert_eq!(body["items"][0]["mail_number"], json!("M-101"));
}

#[tokio::test]
async fn query_string_drives_search_sort_and_filters() {
    let app = TestApp::new().await;
    test_event("Youth Forum").starting("2024-04-01").insert(&app.db).await.unwrap();
    test_event("youth camp").starting("2024-04-02").insert(&app.db).await.unwrap();
    test_event("Youth Gala")
        .starting("2024-04-03")
        .with_status("CANCELLED")
        .insert(&app.db)
        .await
        .unwrap();
    test_event("Elders Meeting").insert(&app.db).await.unwrap();

    let (status, body) = app
        .get_json("/api/events?search=YOUTH&status=PUBLISHED&sort=startDate&order=asc")
        .await;
    assert_eq!(status, StatusCode::OK);
    let items = body["events"].as_array().unwrap();
    assert_eq!(assert::field_values(items, "title"), vec!["Youth Forum", "youth camp"]);
    assert_eq!(body["pagination"]["totalPages"], json!(1));
}

#[tokio::test]
async fn empty_collection_has_zero_pages() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/api/careers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["careers"], json!([]));
    assert_eq!(
        body["pagination"],
        json!({"total": 0, "page": 1, "limit": 10, "totalPages": 0})
    );
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let app = TestApp::new().await;

    let response = app.get("/api/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_filter_is_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/api/events?category=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("category"), "{message}");
}

#[tokio::test]
async fn malformed_date_is_bad_request() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/api/events?from=yesterday").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("from"), "{message}");
    assert!(message.contains("date"), "{message}");
}

#[tokio::test]
async fn storage_failure_hides_details() {
    let app = TestApp::new().await;
    sqlx::query("DROP TABLE careers").execute(&app.db).await.unwrap();

    let response = app.get("/api/careers").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = common::response_json(response).await;
    assert_eq!(body, json!({"error": "failed to load data"}));
    let text = body.to_string();
    assert!(!text.contains("careers"), "{text}");
    assert!(!text.contains("no such table"), "{text}");
}

#[tokio::test]
async fn bad_paging_and_sort_never_fail() {
    let app = TestApp::new().await;
    test_event("Only").insert(&app.db).await.unwrap();

    let (status, body) = app
        .get_json("/api/events?page=-1&limit=0&sort=drop%20table&order=up")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], json!(1));
    assert_eq!(body["pagination"]["limit"], json!(1));
    assert_eq!(body["pagination"]["total"], json!(1));
}

#[tokio::test]
async fn collections_are_described() {
    let app = TestApp::new().await;

    let (status, body) = app.get_json("/api/collections").await;
    assert_eq!(status, StatusCode::OK);

    let collections = body.as_array().unwrap();
    let names = assert::field_values(collections, "name");
    assert_eq!(
        names,
        vec!["careers", "events", "mails", "partners", "projects", "publications", "tasks"]
    );

    let events = collections.iter().find(|c| c["name"] == json!("events")).unwrap();
    assert_eq!(events["envelope"], json!("events"));
    assert_eq!(events["defaultSort"], json!("startDate"));
    assert_eq!(events["defaultOrder"], json!("desc"));
    assert_eq!(events["searchable"], json!(true));
    assert_eq!(events["relations"], json!(["speakers", "tags"]));
}
