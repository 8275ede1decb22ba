//! User management integration tests for admin-service.

mod common;

use admin_service::services::users::user_cache_key;
use common::TestApp;
use serde_json::json;
use service_core::axum::http::StatusCode;
use uuid::Uuid;

#[tokio::test]
async fn created_user_can_be_read_back() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;

    // Act
    let response = app.get(&format!("/users/{}", user_id)).await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["nickname"], "alice");
    assert_eq!(response.body["email"], "alice@example.com");

    let listed = app.get("/users").await;
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reading_a_user_twice_populates_the_cache_once() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;

    // Act
    app.get(&format!("/users/{}", user_id)).await;
    app.get(&format!("/users/{}", user_id)).await;

    // Assert
    assert_eq!(app.cache.set_calls(), 1);
    let key = user_cache_key(user_id.parse().unwrap());
    assert!(app.cache.cache.lock().unwrap().contains_key(&key));
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let app = TestApp::spawn();

    let response = app.get(&format!("/users/{}", Uuid::new_v4())).await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.cache.set_calls(), 0);
}

#[tokio::test]
async fn update_with_mismatched_ids_is_rejected() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;

    // Act
    let response = app
        .put(
            &format!("/users/{}", user_id),
            json!({ "id": Uuid::new_v4(), "nickname": "mallory" }),
        )
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let stored = app.get(&format!("/users/{}", user_id)).await;
    assert_eq!(stored.body["nickname"], "alice");
}

#[tokio::test]
async fn update_changes_fields_and_invalidates_cache() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;
    app.get(&format!("/users/{}", user_id)).await;

    // Act
    let response = app
        .put(
            &format!("/users/{}", user_id),
            json!({ "id": user_id, "nickname": "alicia" }),
        )
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["nickname"], "alicia");
    assert_eq!(response.body["email"], "alice@example.com");

    let reread = app.get(&format!("/users/{}", user_id)).await;
    assert_eq!(reread.body["nickname"], "alicia");
}

#[tokio::test]
async fn update_of_unknown_user_creates_it() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = Uuid::new_v4();

    // Act
    let response = app
        .put(
            &format!("/users/{}", user_id),
            json!({ "id": user_id, "nickname": "carol", "email": "carol@example.com" }),
        )
        .await;

    // Assert
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
    assert_eq!(response.body["user_id"], user_id.to_string());
    assert_eq!(
        app.get(&format!("/users/{}", user_id)).await.status,
        StatusCode::OK
    );
}

#[tokio::test]
async fn delete_reports_each_outcome() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;
    app.get(&format!("/users/{}", user_id)).await;

    // Act
    let nil = app.delete(&format!("/users/{}", Uuid::nil())).await;
    let unknown = app.delete(&format!("/users/{}", Uuid::new_v4())).await;
    let deleted = app.delete(&format!("/users/{}", user_id)).await;

    // Assert
    assert_eq!(nil.status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.get(&format!("/users/{}", user_id)).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn grant_and_revoke_right() {
    // Arrange
    let app = TestApp::spawn();
    app.register("Chess", &[("move", "Move pieces")]).await;
    let user_id = app.create_user("alice", "c2VjcmV0").await;

    // Act
    app.grant(&user_id, "MOVE").await;
    let revoked = app.delete(&format!("/users/{}/rights/move", user_id)).await;
    let revoked_again = app.delete(&format!("/users/{}/rights/move", user_id)).await;

    // Assert
    assert_eq!(revoked.status, StatusCode::NO_CONTENT);
    assert_eq!(revoked_again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn granting_unknown_right_is_not_found() {
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;

    let response = app
        .post(
            &format!("/users/{}/rights", user_id),
            json!({ "right_name": "fly" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_user_body_fails_validation() {
    let app = TestApp::spawn();

    let response = app
        .post(
            "/users",
            json!({
                "nickname": "a-nickname-that-is-far-too-long",
                "email": "alice@example.com",
                "encrypted_password_value": "c2VjcmV0",
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_with_unreachable_cache_keeps_the_user() {
    // Arrange
    let app = TestApp::spawn();
    let user_id = app.create_user("alice", "c2VjcmV0").await;
    app.get(&format!("/users/{}", user_id)).await;
    app.cache.set_unavailable(true);

    // Act
    let response = app.delete(&format!("/users/{}", user_id)).await;
    app.cache.set_unavailable(false);

    // Assert
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.get("/users").await.body.as_array().unwrap().len(), 1);
}
