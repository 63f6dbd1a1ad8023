//! User record routes

mod helpers;

use axum::http::StatusCode;
use serde_json::json;

use helpers::setup_test_app;

#[tokio::test]
async fn test_health_and_ready() {
    let app = setup_test_app().await;

    let health = app.request("GET", "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["status"], "ok");

    let ready = app.request("GET", "/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
    assert_eq!(ready.body["status"], "ready");
}

#[tokio::test]
async fn test_create_user_returns_public_fields_only() {
    let app = setup_test_app().await;

    let response = app
        .request(
            "POST",
            "/v1/auth/createUser",
            None,
            Some(json!({"email": "ada@example.com", "fullName": "Ada Lovelace", "password": "Password123"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["email"], "ada@example.com");
    assert_eq!(response.body["user"]["fullName"], "Ada Lovelace");
    assert!(response.body["user"]["id"].is_string());
    assert!(response.body["user"].get("password").is_none());
}

#[tokio::test]
async fn test_create_user_with_duplicate_email_conflicts() {
    let app = setup_test_app().await;
    let body = json!({"email": "ada@example.com", "fullName": "Ada Lovelace", "password": "Password123"});

    app.request("POST", "/v1/auth/createUser", None, Some(body.clone()))
        .await;
    let response = app
        .request("POST", "/v1/auth/createUser", None, Some(body))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["message"], "Email already registered");
}

#[tokio::test]
async fn test_malformed_body_is_a_validation_error() {
    let app = setup_test_app().await;

    let response = app
        .request(
            "POST",
            "/v1/auth/createUser",
            None,
            Some(json!({"email": "ada@example.com"})),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body["message"].is_string());
}

#[tokio::test]
async fn test_list_users_requires_session() {
    let app = setup_test_app().await;
    let (user_id, session_id) = app.register_and_login("ada@example.com").await;

    let denied = app.request("GET", "/v1/users", None, None).await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let allowed = app.request("GET", "/v1/users", Some(&session_id), None).await;
    assert_eq!(allowed.status, StatusCode::OK);
    let users = allowed.body["data"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], user_id.as_str());
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = setup_test_app().await;
    let (user_id, _) = app.register_and_login("ada@example.com").await;

    let found = app
        .request("GET", &format!("/v1/users/{user_id}"), None, None)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["data"]["email"], "ada@example.com");

    let missing = app.request("GET", "/v1/users/missing", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_and_delete_user_behind_gate() {
    let app = setup_test_app().await;
    let (_, session_id) = app.register_and_login("ada@example.com").await;

    let denied = app
        .request(
            "POST",
            "/v1/users",
            None,
            Some(json!({"email": "bob@example.com", "fullName": "Bob", "password": "Password123"})),
        )
        .await;
    assert_eq!(denied.status, StatusCode::UNAUTHORIZED);

    let created = app
        .request(
            "POST",
            "/v1/users",
            Some(&session_id),
            Some(json!({"email": "bob@example.com", "fullName": "Bob", "password": "Password123"})),
        )
        .await;
    assert_eq!(created.status, StatusCode::OK);
    let bob_id = created.body["data"]["id"].as_str().unwrap().to_owned();

    let deleted = app
        .request(
            "DELETE",
            "/v1/users",
            Some(&session_id),
            Some(json!({"id": bob_id})),
        )
        .await;
    assert_eq!(deleted.status, StatusCode::OK);

    let again = app
        .request(
            "DELETE",
            "/v1/auth/delete",
            Some(&session_id),
            Some(json!({"id": bob_id})),
        )
        .await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}
