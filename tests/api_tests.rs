mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use finance_backend::api::middleware::PROCESS_TIME_HEADER;
use finance_backend::api::{create_router, AppState};
use finance_backend::repositories::UserRepository;
use finance_backend::services::UserService;
use serde_json::{json, Value};
use sqlx::PgPool;

fn test_server(pool: PgPool, files: Arc<common::MemoryFiles>) -> TestServer {
    let tokens = common::issuer();
    let users = UserService::with_hash_cost(
        Arc::new(UserRepository::new(pool.clone())),
        tokens.clone(),
        4,
    );
    let state = AppState::new(pool, files, tokens, "images").with_user_service(users);

    TestServer::new(create_router(state)).expect("Could not create test server.")
}

fn offline_server() -> TestServer {
    test_server(common::lazy_pool(), common::memory_files())
}

fn user_token() -> String {
    common::issuer().issue("alice", false).expect("token").0
}

fn admin_token() -> String {
    common::issuer().issue("root", true).expect("token").0
}

fn registration_body(login: &str) -> Value {
    json!({
        "userType": "ФЛ",
        "loginName": login,
        "partName": "Ivan Petrov",
        "password": "s3cret-pass",
        "bank": "Test Bank",
        "account": "40817810099910004312",
        "inn": "77070838931",
        "phone": "+79161234567",
    })
}

#[tokio::test]
async fn test_subject_types_are_public() {
    let server = offline_server();

    let response = server.get("/api/v1/subject_types").await;
    response.assert_status_ok();

    let body = response.json::<Value>();
    assert_eq!(body["success"], true);
    assert_eq!(
        body["data"],
        json!([
            {"subjectType": "INDIVIDUAL", "subjectName": "Физическое лицо"},
            {"subjectType": "LEGAL", "subjectName": "Юридическое лицо"},
        ])
    );
}

#[tokio::test]
async fn test_liveness_and_tracing_headers() {
    let server = offline_server();

    let response = server
        .get("/live")
        .add_header(
            "x-request-id".parse::<axum::http::HeaderName>().expect("header name"),
            "req-123".parse::<axum::http::HeaderValue>().expect("header value"),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.header("x-request-id"), "req-123");

    let elapsed: f64 = response
        .header(PROCESS_TIME_HEADER)
        .to_str()
        .expect("ascii header")
        .parse()
        .expect("seconds");
    assert!(elapsed >= 0.0);
}

#[tokio::test]
async fn test_request_id_is_generated_when_missing() {
    let server = offline_server();

    let response = server.get("/live").await;
    let id = response.header("x-request-id");
    assert!(uuid::Uuid::parse_str(id.to_str().expect("ascii header")).is_ok());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let server = offline_server();

    let response = server.get("/api/v1/transactions").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body = response.json::<Value>();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    server
        .post("/api/v1/analytics/dynamics/by-period")
        .json(&json!({"date": {"from": "2024-01-01", "to": "2024-01-31"}}))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_key_is_rejected() {
    let server = offline_server();
    let other = finance_backend::services::TokenIssuer::from_pem(
        include_str!("fixtures/other_private.pem"),
        common::PUBLIC_KEY,
        chrono::Duration::hours(1),
    )
    .expect("issuer");
    let forged = other.issue("mallory", true).expect("token");

    server
        .get("/api/v1/articles")
        .authorization_bearer(forged.0)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let server = offline_server();

    let response = server
        .post("/api/v1/categories")
        .authorization_bearer(user_token())
        .json(&json!({"name": "Groceries"}))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["error"]["code"], "FORBIDDEN");

    server
        .get("/api/v1/admin/categories")
        .authorization_bearer(user_token())
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_registration_validation_errors() {
    let server = offline_server();

    let mut body = registration_body("bob");
    body["inn"] = json!("12ab");
    body["phone"] = json!("89161234567");

    let response = server.post("/api/v1/registration").json(&body).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body = response.json::<Value>();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .expect("details")
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"inn"));
    assert!(fields.contains(&"phone"));
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let server = offline_server();

    let response = server
        .post("/api/v1/login")
        .content_type("application/json")
        .bytes("{\"loginName\": ".into())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "INVALID_JSON");
}

#[tokio::test]
async fn test_malformed_path_and_query_use_error_envelope() {
    let server = offline_server();

    let response = server
        .delete("/api/v1/transactions/abc")
        .authorization_bearer(user_token())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    let response = server
        .get("/api/v1/admin/categories")
        .add_query_param("limit", "many")
        .authorization_bearer(admin_token())
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_categories_summary_requires_trans_type() {
    let server = offline_server();

    let response = server
        .post("/api/v1/analytics/categories-summary")
        .authorization_bearer(user_token())
        .json(&json!({"date": {"from": "2024-01-01", "to": "2024-01-31"}}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_inverted_analytics_range_is_rejected() {
    let server = offline_server();

    server
        .post("/api/v1/analytics/dynamics/by-period")
        .add_query_param("period", "week")
        .authorization_bearer(user_token())
        .json(&json!({"date": {"from": "2024-02-01", "to": "2024-01-01"}}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_then_login() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let server = test_server(pool, common::memory_files());
    let login = common::unique("api-user");

    let response = server
        .post("/api/v1/registration")
        .json(&registration_body(&login))
        .await;
    response.assert_status(StatusCode::CREATED);
    let token = response.json::<Value>()["data"]["token"]
        .as_str()
        .expect("token")
        .to_string();

    server
        .get("/api/v1/trans_statuses")
        .authorization_bearer(token)
        .await
        .assert_status_ok();

    server
        .post("/api/v1/registration")
        .json(&registration_body(&login))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/login")
        .json(&json!({"loginName": login, "password": "s3cret-pass"}))
        .await;
    response.assert_status_ok();

    let response = server
        .post("/api/v1/login")
        .json(&json!({"loginName": login, "password": "wrong-pass"}))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "CREDS_INVALID_ERROR"
    );
}

#[tokio::test]
async fn test_transaction_endpoints() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let server = test_server(pool, common::memory_files());
    let bank = common::unique("bank");

    let response = server
        .post("/api/v1/transactions")
        .authorization_bearer(user_token())
        .json(&json!({
            "user_type": "ЮЛ",
            "trans_type": "debit",
            "amount": "250.50",
            "sender_bank": bank,
            "receiver_inn": "7707083893",
            "receiver_phone": "+79990000000",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("transaction id");

    let response = server
        .post("/api/v1/transactions/filter")
        .authorization_bearer(user_token())
        .json(&json!({
            "user_type": "",
            "trans_type": "",
            "sender_bank": bank,
            "category_id": 0,
            "date_from": "2000-01-01T00:00:00Z",
            "date_to": "0001-01-01T00:00:00Z",
        }))
        .await;
    response.assert_status_ok();
    let rows = response.json::<Value>()["data"].as_array().expect("rows").clone();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], id);

    let response = server
        .post("/api/v1/transactions")
        .authorization_bearer(user_token())
        .json(&json!({
            "user_type": "ЮЛ",
            "trans_type": "debit",
            "amount": "1",
            "status_id": 99,
            "sender_bank": bank,
            "receiver_inn": "7707083893",
            "receiver_phone": "+79990000000",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["error"]["code"], "VALIDATION_ERROR");

    server
        .delete(&format!("/api/v1/transactions/{}", id))
        .authorization_bearer(user_token())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = server
        .delete(&format!("/api/v1/transactions/{}", id))
        .authorization_bearer(user_token())
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<Value>()["error"]["code"],
        "TRANSACTION_NOT_FOUND"
    );
}

#[tokio::test]
async fn test_category_admin_flow() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let server = test_server(pool, common::memory_files());
    let name = common::unique("Transport");

    let response = server
        .post("/api/v1/categories")
        .authorization_bearer(admin_token())
        .json(&json!({"name": name, "type": "debit"}))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("category id");

    let response = server
        .get(&format!("/api/v1/admin/categories/{}", id))
        .authorization_bearer(admin_token())
        .await;
    response.assert_status_ok();
    let data = response.json::<Value>()["data"].clone();
    assert_eq!(data["name"], name);
    assert!(data["createdAt"].is_string());

    let response = server
        .get("/api/v1/admin/categories")
        .add_query_param("search", &name)
        .authorization_bearer(admin_token())
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["total"], 1);

    server
        .post("/api/v1/categories")
        .authorization_bearer(admin_token())
        .json(&json!({"name": name}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .delete(&format!("/api/v1/categories/{}", id))
        .authorization_bearer(admin_token())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/v1/categories/{}", id))
        .authorization_bearer(user_token())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_article_image_upload() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let files = common::memory_files();
    let server = test_server(pool, files.clone());

    let response = server
        .post("/api/v1/articles")
        .authorization_bearer(admin_token())
        .json(&json!({
            "header": common::unique("Budget"),
            "sub_header": "Monthly plan",
            "description": "Track every expense",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["data"]["id"]
        .as_i64()
        .expect("article id");

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\x89PNG fake".to_vec())
            .file_name("cover.png")
            .mime_type("image/png"),
    );
    let response = server
        .put(&format!("/api/v1/articles/{}/image", id))
        .authorization_bearer(admin_token())
        .multipart(form)
        .await;
    response.assert_status_ok();
    let key = response.json::<Value>()["data"]["image"]
        .as_str()
        .expect("image key")
        .to_string();
    assert_eq!(files.keys().await, vec![key]);

    let response = server
        .get(&format!("/api/v1/articles/{}/image", id))
        .authorization_bearer(user_token())
        .await;
    response.assert_status_ok();
    assert_eq!(response.as_bytes().as_ref(), b"\x89PNG fake");

    let missing_field = MultipartForm::new().add_text("title", "no file here");
    server
        .put(&format!("/api/v1/articles/{}/image", id))
        .authorization_bearer(admin_token())
        .multipart(missing_field)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    server
        .delete(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(admin_token())
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(files.keys().await.is_empty());

    server
        .get(&format!("/api/v1/articles/{}", id))
        .authorization_bearer(user_token())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_reports_dependencies() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let server = test_server(pool, common::memory_files());

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body = response.json::<Value>();
    let names: Vec<&str> = body["data"]["dependencies"]
        .as_array()
        .expect("dependencies")
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    assert_eq!(names, vec!["database", "storage"]);

    server.get("/ready").await.assert_status_ok();
}

#[tokio::test]
async fn test_health_degrades_without_storage() {
    let Some(pool) = common::setup_test_db().await else {
        return;
    };
    let server = test_server(pool, Arc::new(common::MemoryFiles::failing()));

    server
        .get("/health")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    // Storage does not gate readiness
    server.get("/ready").await.assert_status_ok();
}
