// End-to-end tests for the CRM API router
// Runs against the in-memory backend with cheap hashing parameters, so no database is needed

use super::*;
use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::token::Claims;

const TEST_SECRET: &str = "integration-test-secret-with-32-plus-chars";

// ============================================================================
// Test Helpers
// ============================================================================

fn test_config() -> AppConfig {
    let vars: HashMap<&str, &str> = HashMap::from([
        ("STORAGE_BACKEND", "memory"),
        ("JWT_SECRET", TEST_SECRET),
        ("PASSWORD_HASH_MEMORY_KIB", "1024"),
        ("PASSWORD_HASH_ITERATIONS", "1"),
    ]);
    AppConfig::from_lookup(move |key: &str| vars.get(key).map(|v| v.to_string())).unwrap()
}

/// Fresh server with empty stores
fn create_test_app() -> TestServer {
    let config = test_config();
    let state = build_state(&config, None).unwrap();
    TestServer::new(create_router(state, &config)).unwrap()
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

/// Register a user and return the response body
async fn register(server: &TestServer, name: &str, email: &str, password: &str) -> Value {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": name, "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json()
}

/// Register a throwaway user and return its token
async fn token_for_new_user(server: &TestServer) -> String {
    let email = format!("{}@example.com", Uuid::new_v4());
    let body = register(server, "Tester", &email, "secret1").await;
    body["token"].as_str().unwrap().to_string()
}

async fn create_customer(server: &TestServer, token: &str, payload: Value) -> Value {
    let response = server
        .post("/api/customers")
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&payload)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    response.json::<Value>()["customer"].clone()
}

async fn list_customers(server: &TestServer, token: &str) -> Vec<Value> {
    let response = server
        .get("/api/customers")
        .add_header(header::AUTHORIZATION, bearer(token))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    body["customers"].as_array().unwrap().clone()
}

fn expired_token() -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: Uuid::new_v4().to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now - 120,
        exp: now - 60,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap()
}

fn assert_error(body: &Value, message: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], message);
}

// ============================================================================
// Public Endpoints
// ============================================================================

#[tokio::test]
async fn test_root_banner() {
    let server = create_test_app();

    let response = server.get("/").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_health_reports_storage_backend() {
    let server = create_test_app();

    let response = server.get("/api/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_openapi_document_declares_bearer_scheme() {
    let server = create_test_app();

    let response = server.get("/api-docs/openapi.json").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let doc: Value = response.json();
    assert_eq!(doc["components"]["securitySchemes"]["bearer_auth"]["scheme"], "bearer");
    assert!(doc["paths"]["/api/customers/{id}"].is_object());
}

// ============================================================================
// Registration (POST /api/auth/register)
// ============================================================================

#[tokio::test]
async fn test_register_success() {
    let server = create_test_app();

    let body = register(&server, "Alice", "alice@example.com", "secret1").await;

    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert!(Uuid::parse_str(body["user"]["id"].as_str().unwrap()).is_ok());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["user"].get("password").is_none());
    assert!(!body["token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let server = create_test_app();
    register(&server, "Alice", "alice@example.com", "secret1").await;

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": "Alice 2", "email": "ALICE@example.com", "password": "other12" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "User already exists");

    // the original credentials still work
    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    assert_eq!(login.json::<Value>()["user"]["name"], "Alice");
}

#[tokio::test]
async fn test_register_missing_fields() {
    let server = create_test_app();

    for payload in [
        json!({ "email": "a@example.com", "password": "secret1" }),
        json!({ "name": "A", "password": "secret1" }),
        json!({ "name": "A", "email": "a@example.com" }),
        json!({ "name": "   ", "email": "a@example.com", "password": "secret1" }),
    ] {
        let response = server.post("/api/auth/register").json(&payload).await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST, "payload: {}", payload);
        assert_eq!(response.json::<Value>()["success"], false);
    }
}

#[tokio::test]
async fn test_register_invalid_email() {
    let server = create_test_app();

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": "A", "email": "not-an-email", "password": "secret1" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "Please provide a valid email address");
}

#[tokio::test]
async fn test_register_accepts_padded_email() {
    let server = create_test_app();

    let body = register(&server, "Alice", "  Alice@Example.com ", "secret1").await;
    assert_eq!(body["user"]["email"], "alice@example.com");

    // login normalizes the same way
    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "  Alice@Example.com ", "password": "secret1" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    assert_eq!(login.json::<Value>()["user"], body["user"]);
}

#[tokio::test]
async fn test_register_short_password() {
    let server = create_test_app();

    let response = server
        .post("/api/auth/register")
        .json(&json!({ "name": "A", "email": "a@example.com", "password": "12345" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "Password must be at least 6 characters");
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let server = create_test_app();

    let response = server.post("/api/auth/register").text("{not json").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

// ============================================================================
// Login (POST /api/auth/login)
// ============================================================================

#[tokio::test]
async fn test_login_success_issues_fresh_token() {
    let server = create_test_app();
    let registered = register(&server, "Alice", "alice@example.com", "secret1").await;

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "secret1" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["user"], registered["user"]);
    assert_ne!(body["token"], registered["token"]);
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let server = create_test_app();
    register(&server, "Alice", "alice@example.com", "secret1").await;

    let wrong_password = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com", "password": "wrong-pass" }))
        .await;
    let unknown_email = server
        .post("/api/auth/login")
        .json(&json!({ "email": "nobody@example.com", "password": "secret1" }))
        .await;

    assert_eq!(wrong_password.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json::<Value>(), unknown_email.json::<Value>());
    assert_error(&wrong_password.json(), "Invalid credentials");
}

#[tokio::test]
async fn test_login_missing_fields() {
    let server = create_test_app();

    let response = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@example.com" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_error(&response.json(), "Password is required");
}

// ============================================================================
// Token Verification
// ============================================================================

#[tokio::test]
async fn test_me_returns_token_subject() {
    let server = create_test_app();
    let registered = register(&server, "Alice", "alice@example.com", "secret1").await;
    let token = registered["token"].as_str().unwrap();

    let response = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(token))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.json::<Value>()["user"], registered["user"]);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let server = create_test_app();

    let list = server.get("/api/customers").await;
    assert_eq!(list.status_code(), StatusCode::UNAUTHORIZED);
    assert_error(&list.json(), "No token provided");

    let create = server.post("/api/customers").json(&json!({ "name": "Acme" })).await;
    assert_eq!(create.status_code(), StatusCode::UNAUTHORIZED);

    let me = server.get("/api/auth/me").await;
    assert_eq!(me.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_rejected_tokens_share_one_response() {
    let server = create_test_app();
    let valid = token_for_new_user(&server).await;

    let (unsigned, signature) = valid.rsplit_once('.').unwrap();
    let flipped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{}.{}{}", unsigned, flipped, &signature[1..]);

    let foreign = TokenService::new(
        &secrecy::SecretString::from("some-other-secret".to_string()),
        3600,
    )
    .generate_token(Uuid::new_v4())
    .unwrap();

    for auth_value in [
        format!("Bearer {}", tampered),
        format!("Bearer {}", foreign),
        format!("Bearer {}", expired_token()),
        "Bearer not.a.jwt".to_string(),
        format!("Token {}", valid),
    ] {
        let response = server
            .get("/api/customers")
            .add_header(header::AUTHORIZATION, HeaderValue::from_str(&auth_value).unwrap())
            .await;
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED, "header: {}", auth_value);
        assert_error(&response.json(), "Invalid token");
    }
}

// ============================================================================
// Customer CRUD (/api/customers)
// ============================================================================

#[tokio::test]
async fn test_create_customer_returns_record() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;

    let customer = create_customer(
        &server,
        &token,
        json!({
            "name": "Acme",
            "email": "sales@acme.test",
            "phone": "+1 555 0100",
            "company": "Acme Corp",
            "address": "1 Main St"
        }),
    )
    .await;

    assert!(Uuid::parse_str(customer["id"].as_str().unwrap()).is_ok());
    assert_eq!(customer["name"], "Acme");
    assert_eq!(customer["email"], "sales@acme.test");
    assert_eq!(customer["phone"], "+1 555 0100");
    assert_eq!(customer["company"], "Acme Corp");
    assert_eq!(customer["address"], "1 Main St");
    assert!(customer["created_at"].is_string());

    let listed = list_customers(&server, &token).await;
    assert_eq!(listed, vec![customer]);
}

#[tokio::test]
async fn test_create_customer_requires_name() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;

    for payload in [json!({ "email": "x@y.z" }), json!({ "name": "" }), json!({ "name": "  " })] {
        let response = server
            .post("/api/customers")
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&payload)
            .await;
        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        assert_error(&response.json(), "Field 'name' is required");
    }

    assert!(list_customers(&server, &token).await.is_empty());
}

#[tokio::test]
async fn test_list_customers_newest_first() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;

    for name in ["First", "Second", "Third"] {
        create_customer(&server, &token, json!({ "name": name })).await;
    }

    let names: Vec<_> = list_customers(&server, &token)
        .await
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["Third", "Second", "First"]);
}

#[tokio::test]
async fn test_update_customer_partial_fields() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;
    let created = create_customer(
        &server,
        &token,
        json!({ "name": "Acme", "email": "sales@acme.test", "phone": "111" }),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let response = server
        .put(&format!("/api/customers/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "phone": "222", "company": "Acme Corp" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>()["customer"].clone();
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["name"], "Acme");
    assert_eq!(updated["email"], "sales@acme.test");
    assert_eq!(updated["phone"], "222");
    assert_eq!(updated["company"], "Acme Corp");
    assert!(updated["address"].is_null());

    assert_eq!(list_customers(&server, &token).await, vec![updated]);
}

#[tokio::test]
async fn test_update_customer_null_clears_field() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;
    let created = create_customer(
        &server,
        &token,
        json!({ "name": "Acme", "email": "sales@acme.test", "phone": "111" }),
    )
    .await;

    let response = server
        .put(&format!("/api/customers/{}", created["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "email": null }))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let updated = response.json::<Value>()["customer"].clone();
    assert!(updated["email"].is_null());
    assert_eq!(updated["phone"], "111");
    assert_eq!(updated["name"], "Acme");

    assert_eq!(list_customers(&server, &token).await, vec![updated]);
}

#[tokio::test]
async fn test_update_customer_null_name_rejected() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;
    let created = create_customer(&server, &token, json!({ "name": "Acme" })).await;

    let response = server
        .put(&format!("/api/customers/{}", created["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": null }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["success"], false);
    assert_eq!(list_customers(&server, &token).await, vec![created]);
}

#[tokio::test]
async fn test_update_customer_blank_name() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;
    let created = create_customer(&server, &token, json!({ "name": "Acme" })).await;

    let response = server
        .put(&format!("/api/customers/{}", created["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "name": "" }))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(list_customers(&server, &token).await, vec![created]);
}

#[tokio::test]
async fn test_update_customer_not_found() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;

    for id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        let response = server
            .put(&format!("/api/customers/{}", id))
            .add_header(header::AUTHORIZATION, bearer(&token))
            .json(&json!({ "name": "Acme" }))
            .await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
        assert_error(&response.json(), "Customer not found");
    }
}

#[tokio::test]
async fn test_delete_customer() {
    let server = create_test_app();
    let token = token_for_new_user(&server).await;
    let keep = create_customer(&server, &token, json!({ "name": "Keep" })).await;
    let gone = create_customer(&server, &token, json!({ "name": "Gone" })).await;

    let response = server
        .delete(&format!("/api/customers/{}", gone["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Customer deleted successfully!");

    assert_eq!(list_customers(&server, &token).await, vec![keep]);
}

#[tokio::test]
async fn test_customers_are_shared_between_users() {
    let server = create_test_app();
    let alice = token_for_new_user(&server).await;
    let bob = token_for_new_user(&server).await;

    let created = create_customer(&server, &alice, json!({ "name": "Acme" })).await;

    assert_eq!(list_customers(&server, &bob).await, vec![created.clone()]);

    let response = server
        .delete(&format!("/api/customers/{}", created["id"].as_str().unwrap()))
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(list_customers(&server, &alice).await.is_empty());
}

// ============================================================================
// Full Session
// ============================================================================

#[tokio::test]
async fn test_register_login_and_manage_customers() {
    let server = create_test_app();

    // register -> T1
    let registered = register(&server, "Alice", "alice@x.com", "secret1").await;
    let t1 = registered["token"].as_str().unwrap().to_string();

    // login -> T2
    let login = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@x.com", "password": "secret1" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let t2 = login.json::<Value>()["token"].as_str().unwrap().to_string();
    assert_ne!(t1, t2);

    for token in [&t1, &t2] {
        let me = server
            .get("/api/auth/me")
            .add_header(header::AUTHORIZATION, bearer(token))
            .await;
        assert_eq!(me.status_code(), StatusCode::OK);
    }

    // wrong password
    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "email": "alice@x.com", "password": "wrong1" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    assert_error(&wrong.json(), "Invalid credentials");

    // no header
    let anonymous = server.get("/api/customers").await;
    assert_eq!(anonymous.status_code(), StatusCode::UNAUTHORIZED);

    // create with T2
    let customer = create_customer(&server, &t2, json!({ "name": "Acme" })).await;
    let id = customer["id"].as_str().unwrap().to_string();

    // delete
    let deleted = server
        .delete(&format!("/api/customers/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&t2))
        .await;
    assert_eq!(deleted.status_code(), StatusCode::OK);

    // list excludes it
    assert!(list_customers(&server, &t2)
        .await
        .iter()
        .all(|c| c["id"] != id.as_str()));

    // delete again
    let again = server
        .delete(&format!("/api/customers/{}", id))
        .add_header(header::AUTHORIZATION, bearer(&t2))
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
    assert_error(&again.json(), "Customer not found");
}
