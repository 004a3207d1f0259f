//! Drives the router end to end against an in-memory database.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use mockbq_api::{router, AppState};

async fn test_app() -> Router {
    let pool = mockbq_core::storage::connect_in_memory().await.unwrap();
    mockbq_core::storage::migrate(&pool).await.unwrap();
    router(AppState::new(Some(pool)))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(request).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, json)
}

async fn create_extraction(app: &Router, title: &str, date: &str, tags: &[&str]) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/data-extractions",
        Some(json!({
            "title": title,
            "summary": format!("{title} summary"),
            "date": date,
            "tags": tags,
            "pros": ["cheap"],
            "cons": ["crowded"],
            "authors": ["Macro Desk"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

async fn create_trade_idea(app: &Router, parent: &str, conviction: i64) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/api/trade-ideas",
        Some(json!({
            "data_extraction_id": parent,
            "recommendation": format!("Idea {conviction}"),
            "summary": "Positioning is light",
            "conviction": conviction,
            "pros": ["carry"],
        })),
    )
    .await
}

// ---------------------------------------------------------------
// Health
// ---------------------------------------------------------------

#[tokio::test]
async fn health_reports_connected_database() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    let (status, body) = send(&app, Method::GET, "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn degraded_mode_returns_service_unavailable() {
    let app = router(AppState::new(None));

    let (status, body) = send(&app, Method::GET, "/api/data-extractions", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "database_unavailable");

    let (status, _) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

// ---------------------------------------------------------------
// Data extractions
// ---------------------------------------------------------------

#[tokio::test]
async fn create_then_get_extraction() {
    let app = test_app().await;
    let id = create_extraction(&app, "EM rates", "2025-03-14", &["rates", "brazil"]).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/data-extractions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["date"], "2025-03-14");
    assert_eq!(body["tags"], json!(["rates", "brazil"]));
    assert_eq!(body["authors"], json!(["Macro Desk"]));
}

#[tokio::test]
async fn client_supplied_id_is_ignored() {
    let app = test_app().await;
    let client_id = "00000000-0000-0000-0000-000000000001";

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/data-extractions",
        Some(json!({ "id": client_id, "title": "t", "summary": "s", "date": "2025-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_ne!(body["id"], client_id);
}

#[tokio::test]
async fn get_unknown_extraction_is_not_found() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/data-extractions/6f1c1f0e-5d7a-4b9a-9a59-0d0d3c2b1a00",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn malformed_id_is_a_validation_error() {
    let app = test_app().await;
    let (status, body) = send(&app, Method::GET, "/api/data-extractions/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "path");
}

#[tokio::test]
async fn blank_fields_are_rejected_with_field_errors() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/data-extractions",
        Some(json!({ "title": " ", "summary": "", "date": "2025-01-01", "tags": ["ok", ""] })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    let fields: Vec<&str> = body["detail"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "summary", "tags[1]"]);
}

#[tokio::test]
async fn wrong_types_are_rejected_before_storage() {
    let app = test_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/data-extractions",
        Some(json!({ "title": "t", "summary": "s", "date": "14/03/2025" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "body");

    let (_, list) = send(&app, Method::GET, "/api/data-extractions", None).await;
    assert_eq!(list["total"], 0);
}

#[tokio::test]
async fn list_paginates_and_filters() {
    let app = test_app().await;
    create_extraction(&app, "A", "2025-01-01", &["rates"]).await;
    create_extraction(&app, "B", "2025-01-02", &["fx"]).await;
    create_extraction(&app, "C", "2025-01-03", &["credit"]).await;
    create_extraction(&app, "D", "2025-01-04", &["rates", "fx"]).await;

    let (status, page) = send(&app, Method::GET, "/api/data-extractions?limit=2&offset=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 4);
    assert_eq!(page["limit"], 2);
    assert_eq!(page["offset"], 1);
    let titles: Vec<&str> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["C", "B"]);

    let (_, page) = send(&app, Method::GET, "/api/data-extractions?tags=rates,fx", None).await;
    assert_eq!(page["total"], 3);

    let (_, page) = send(
        &app,
        Method::GET,
        "/api/data-extractions?start_date=2025-01-02&end_date=2025-01-03",
        None,
    )
    .await;
    assert_eq!(page["total"], 2);
}

#[tokio::test]
async fn invalid_pagination_is_rejected() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/data-extractions?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "limit");

    let (status, _) = send(&app, Method::GET, "/api/data-extractions?offset=-1", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, Method::GET, "/api/data-extractions?limit=many", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["field"], "query");
}

// ---------------------------------------------------------------
// Trade ideas
// ---------------------------------------------------------------

#[tokio::test]
async fn conviction_outside_range_is_rejected() {
    let app = test_app().await;
    let parent = create_extraction(&app, "A", "2025-02-01", &[]).await;

    for conviction in [0, 11] {
        let (status, body) = create_trade_idea(&app, &parent, conviction).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "conviction {conviction}");
        assert_eq!(body["detail"][0]["field"], "conviction");
    }

    let (status, _) = create_trade_idea(&app, &parent, 10).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn unknown_parent_is_a_foreign_key_violation() {
    let app = test_app().await;
    let missing = "9b2e4c1a-3f5d-4e6b-8a7c-1d2e3f4a5b6c";

    let (status, body) = create_trade_idea(&app, missing, 5).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "foreign_key_violation");

    let (_, page) = send(&app, Method::GET, "/api/trade-ideas", None).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn trade_ideas_filter_by_threshold() {
    let app = test_app().await;
    let parent = create_extraction(&app, "A", "2025-02-01", &[]).await;
    for c in [3, 6, 9] {
        create_trade_idea(&app, &parent, c).await;
    }

    let (status, page) = send(&app, Method::GET, "/api/trade-ideas?min_conviction=6", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["items"][0]["conviction"], 9);

    let (status, _) = send(&app, Method::GET, "/api/trade-ideas?min_conviction=12", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deleting_extraction_cascades_to_trade_ideas() {
    let app = test_app().await;
    let parent = create_extraction(&app, "Parent", "2025-02-01", &[]).await;
    let keep = create_extraction(&app, "Keep", "2025-02-02", &[]).await;
    let (_, doomed) = create_trade_idea(&app, &parent, 4).await;
    create_trade_idea(&app, &parent, 8).await;
    create_trade_idea(&app, &keep, 7).await;

    let (_, ideas) = send(&app, Method::GET, &format!("/api/data-extractions/{parent}/trade-ideas"), None).await;
    assert_eq!(ideas.as_array().unwrap().len(), 2);
    assert_eq!(ideas[0]["conviction"], 8);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/data-extractions/{parent}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let doomed_id = doomed["id"].as_str().unwrap();
    let (status, _) = send(&app, Method::GET, &format!("/api/trade-ideas/{doomed_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, &format!("/api/data-extractions/{parent}/trade-ideas"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, page) = send(&app, Method::GET, "/api/trade-ideas", None).await;
    assert_eq!(page["total"], 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/data-extractions/{parent}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------
// Analytics
// ---------------------------------------------------------------

#[tokio::test]
async fn top_tags_and_conviction_distribution() {
    let app = test_app().await;
    let a = create_extraction(&app, "A", "2025-05-01", &["rates", "usa"]).await;
    create_extraction(&app, "B", "2025-05-02", &["rates"]).await;
    create_trade_idea(&app, &a, 7).await;
    create_trade_idea(&app, &a, 7).await;

    let (status, top) = send(&app, Method::GET, "/api/analytics/top-tags?limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top, json!([{ "tag": "rates", "count": 2 }]));

    let (status, buckets) = send(&app, Method::GET, "/api/analytics/conviction-distribution", None).await;
    assert_eq!(status, StatusCode::OK);
    let buckets = buckets.as_array().unwrap();
    assert_eq!(buckets.len(), 10);
    assert_eq!(buckets[6], json!({ "conviction": 7, "count": 2 }));

    let (status, _) = send(&app, Method::GET, "/api/analytics/top-tags?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn dashboard_summarizes_filtered_extractions() {
    let app = test_app().await;
    let a = create_extraction(&app, "A", "2025-06-01", &["rates"]).await;
    create_extraction(&app, "B", "2025-06-02", &["fx"]).await;
    create_trade_idea(&app, &a, 5).await;

    let (status, board) = send(
        &app,
        Method::POST,
        "/api/dashboard",
        Some(json!({ "tags": ["rates"], "start_date": "2025-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["total_extractions"], 1);
    assert_eq!(board["total_trade_ideas"], 1);
    assert_eq!(board["tags_filter"], json!(["rates"]));
    assert_eq!(board["date_range"]["start"], "2025-01-01");
    assert_eq!(board["date_range"]["end"], Value::Null);
    assert_eq!(board["results"][0]["title"], "A");
}

#[tokio::test]
async fn tag_endpoints_start_empty() {
    let app = test_app().await;

    let (status, tags) = send(&app, Method::GET, "/api/tags", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags, json!({ "total": 0, "items": [] }));

    let (status, cats) = send(&app, Method::GET, "/api/tags/categories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cats, json!([]));

    let (status, _) = send(&app, Method::GET, "/api/tags/by-category/country", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn warehouse_listing_is_empty_until_rebuilt() {
    let app = test_app().await;
    create_extraction(&app, "A", "2025-06-01", &[]).await;

    let (status, page) = send(&app, Method::GET, "/api/warehouse/research-extractions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn undecodable_tag_category_is_a_validation_error() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::GET, "/api/tags/by-category/%FF", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
    assert_eq!(body["detail"][0]["field"], "path");
}

// ---------------------------------------------------------------
// Generic tables
// ---------------------------------------------------------------

async fn create_table(app: &Router, name: &str, schema: &str) {
    let (status, body) = send(
        app,
        Method::POST,
        "/create_table",
        Some(json!({ "name": name, "table_schema": schema, "primary_key": "id" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
}

async fn query_rows(app: &Router, sql: &str) -> Vec<Value> {
    let (status, body) = send(app, Method::POST, "/query", Some(json!({ "sql": sql }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    body["rows"].as_array().unwrap().clone()
}

#[tokio::test]
async fn create_table_reports_columns_and_rejects_existing() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/create_table",
        Some(json!({ "name": "users", "table_schema": "id INTEGER, name VARCHAR, age INTEGER", "primary_key": "id" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "created");
    assert_eq!(body["name"], "users");
    assert_eq!(body["primary_key"], "id");
    assert_eq!(body["columns"].as_array().unwrap().len(), 3);

    let (status, body) = send(
        &app,
        Method::POST,
        "/create_table",
        Some(json!({ "name": "users", "table_schema": "id INTEGER" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "table_exists");

    let (status, body) = send(
        &app,
        Method::POST,
        "/create_table",
        Some(json!({ "name": "bad name", "table_schema": "id INTEGER; DROP TABLE tags" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_failed");
}

#[tokio::test]
async fn insert_assigns_ids_after_the_highest_key() {
    let app = test_app().await;
    create_table(&app, "test_ids", "id INTEGER, product VARCHAR, price DECIMAL").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_ids", "data": [
            { "product": "A", "price": 10.50 },
            { "product": "B", "price": 20.99 },
            { "product": "C", "price": 30.00 }
        ] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"], 3);
    assert_eq!(body["assigned_ids"], json!([1, 2, 3]));

    send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_ids", "data": [{ "id": 10, "product": "D" }, { "product": "E" }] })),
    )
    .await;
    send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_ids", "data": [{ "product": "F" }] })),
    )
    .await;

    let ids: Vec<Value> = query_rows(&app, "SELECT id FROM test_ids ORDER BY id")
        .await
        .into_iter()
        .map(|row| row["id"].clone())
        .collect();
    assert_eq!(ids, vec![json!(1), json!(2), json!(3), json!(10), json!(11), json!(12)]);
}

#[tokio::test]
async fn duplicate_keys_conflict_and_leave_table_unchanged() {
    let app = test_app().await;
    create_table(&app, "test_dup", "id INTEGER, item VARCHAR").await;
    send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_dup", "data": [
            { "id": 1, "item": "one" }, { "id": 2, "item": "two" }, { "id": 3, "item": "three" }
        ] })),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_dup", "data": [{ "id": 1, "item": "dup" }, { "id": 4, "item": "new" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "unique_violation");

    let (status, _) = send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "test_dup", "data": [{ "id": 10, "item": "x" }, { "id": 10, "item": "y" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let rows = query_rows(&app, "SELECT COUNT(*) AS total FROM test_dup").await;
    assert_eq!(rows[0]["total"], 3);
}

#[tokio::test]
async fn insert_into_unknown_table_is_not_found() {
    let app = test_app().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "nowhere", "data": [{ "id": 1 }] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn query_supports_filters_and_aggregates() {
    let app = test_app().await;
    create_table(&app, "staff", "id INTEGER, name VARCHAR, dept VARCHAR, salary DECIMAL").await;
    send(
        &app,
        Method::POST,
        "/insert",
        Some(json!({ "table": "staff", "data": [
            { "name": "Juan", "dept": "IT", "salary": 50000 },
            { "name": "Maria", "dept": "IT", "salary": 60000 },
            { "name": "Pedro", "dept": "Sales", "salary": 45000 },
            { "name": "Ana", "dept": "Sales", "salary": 48000 },
            { "name": "Luis", "dept": "IT", "salary": 55000 }
        ] })),
    )
    .await;

    let it = query_rows(&app, "SELECT name FROM staff WHERE dept = 'IT' ORDER BY salary").await;
    assert_eq!(it, vec![json!({ "name": "Juan" }), json!({ "name": "Luis" }), json!({ "name": "Maria" })]);

    let by_dept = query_rows(
        &app,
        "SELECT dept, COUNT(*) AS total, AVG(salary) AS avg_salary FROM staff GROUP BY dept ORDER BY dept",
    )
    .await;
    assert_eq!(
        by_dept,
        vec![
            json!({ "dept": "IT", "total": 3, "avg_salary": 55000.0 }),
            json!({ "dept": "Sales", "total": 2, "avg_salary": 46500.0 }),
        ]
    );

    let top = query_rows(&app, "SELECT name FROM staff ORDER BY salary DESC LIMIT 3").await;
    assert_eq!(top.len(), 3);
    assert_eq!(top[0]["name"], "Maria");
}

#[tokio::test]
async fn bad_sql_is_a_bad_request() {
    let app = test_app().await;

    let (status, body) = send(&app, Method::POST, "/query", Some(json!({ "sql": "SELEC 1" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_query");

    let (status, _) = send(&app, Method::POST, "/query", Some(json!({ "sql": "  " }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
