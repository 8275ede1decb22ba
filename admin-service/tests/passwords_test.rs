//! Password integration tests for admin-service.

mod common;

use admin_service::services::passwords::password_cache_key;
use common::TestApp;
use serde_json::json;
use service_core::axum::http::StatusCode;
use uuid::Uuid;

async fn user_without_password(app: &TestApp) -> Uuid {
    let user_id = Uuid::new_v4();
    let response = app
        .put(
            &format!("/users/{}", user_id),
            json!({ "id": user_id, "nickname": "dave", "email": "dave@example.com" }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    user_id
}

#[tokio::test]
async fn created_password_is_served_from_cache_on_second_read() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = user_without_password(&app).await;
    let created = app
        .post(
            "/passwords",
            json!({ "encrypted_value": "ZGF2ZQ", "user_id": user_id }),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED, "{}", created.body);
    let password_id = created.body["password_id"].as_str().unwrap().to_string();

    // Act
    let first = app.get(&format!("/passwords/{}", password_id)).await;
    let second = app.get(&format!("/passwords/{}", password_id)).await;

    // Assert
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
    assert_eq!(first.body["user_id"], user_id.to_string());
    assert_eq!(app.cache.set_calls(), 1);
    let key = password_cache_key(password_id.parse().unwrap());
    assert!(app.cache.cache.lock().unwrap().contains_key(&key));
}

#[tokio::test]
async fn unknown_password_is_not_found_and_not_cached() {
    let app = TestApp::spawn();

    let response = app.get(&format!("/passwords/{}", Uuid::new_v4())).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.cache.set_calls(), 0);
}

#[tokio::test]
async fn password_for_unknown_user_fails() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/passwords",
            json!({ "encrypted_value": "ZGF2ZQ", "user_id": Uuid::new_v4() }),
        )
        .await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn unreachable_cache_is_an_error_not_a_miss() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = user_without_password(&app).await;
    let created = app
        .post(
            "/passwords",
            json!({ "encrypted_value": "ZGF2ZQ", "user_id": user_id }),
        )
        .await;
    let password_id = created.body["password_id"].as_str().unwrap().to_string();
    app.cache.set_unavailable(true);

    // Act
    let response = app.get(&format!("/passwords/{}", password_id)).await;

    // Assert
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn deleting_the_user_evicts_its_cached_password() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = user_without_password(&app).await;
    let created = app
        .post(
            "/passwords",
            json!({ "encrypted_value": "ZGF2ZQ", "user_id": user_id }),
        )
        .await;
    let password_id = created.body["password_id"].as_str().unwrap().to_string();
    assert_eq!(
        app.get(&format!("/passwords/{}", password_id)).await.status,
        StatusCode::OK
    );

    // Act
    let deleted = app.delete(&format!("/users/{}", user_id)).await;

    // Assert
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get(&format!("/passwords/{}", password_id)).await.status,
        StatusCode::NOT_FOUND
    );
}
