//! HTTP-level tests for signature CRUD.
//!
//! Uses Axum's tower::ServiceExt to send requests directly to the router
//! without an actual TCP listener.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_signature, delete, get, post_json, put_json, signature_payload};

#[tokio::test]
async fn test_create_signature_returns_201() {
    let app = common::build_test_app();
    let response = post_json(&app.router, "/api/v1/signatures", signature_payload("modern")).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert!(json["id"].is_string());
    assert_eq!(json["templateId"], "modern");
    assert_eq!(json["tag"], "static");
    assert_eq!(json["images"]["logo"], common::LOGO_URL);
    assert_eq!(json["images"]["backgroundOpacity"], 20);
    assert_eq!(json["elementPositions"]["logo"]["scale"], 1.0);
}

#[tokio::test]
async fn test_create_with_defaults_only() {
    let app = common::build_test_app();
    let response = post_json(&app.router, "/api/v1/signatures", serde_json::json!({})).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["templateId"], "professional");
    assert_eq!(json["images"]["headshotSize"], 100);
}

#[tokio::test]
async fn test_create_rejects_out_of_range_sizes() {
    let app = common::build_test_app();
    let mut payload = signature_payload("minimal");
    payload["images"]["headshotSize"] = serde_json::json!(300);

    let response = post_json(&app.router, "/api/v1/signatures", payload).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_rejects_unknown_template() {
    let app = common::build_test_app();
    let response = post_json(&app.router, "/api/v1/signatures", signature_payload("retro")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_round_trips_created_record() {
    let app = common::build_test_app();
    let id = create_signature(&app.router, signature_payload("sales-professional")).await;

    let response = get(&app.router, &format!("/api/v1/signatures/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["personalInfo"]["name"], "Jordan Smith");
    assert_eq!(json["socialMedia"]["linkedin"], "https://linkedin.com/in/jordan");
}

#[tokio::test]
async fn test_get_nonexistent_signature_returns_404() {
    let app = common::build_test_app();
    let id = uuid::Uuid::now_v7();
    let response = get(&app.router, &format!("/api/v1/signatures/{id}")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_update_recomputes_tag() {
    let app = common::build_test_app();
    let id = create_signature(&app.router, signature_payload("professional")).await;

    let response = put_json(
        &app.router,
        &format!("/api/v1/signatures/{id}"),
        serde_json::json!({
            "elementAnimations": { "headshot": "pulse" },
            "templateId": "creative"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["tag"], "dynamic");
    assert_eq!(json["templateId"], "creative");
    assert_eq!(json["elementAnimations"]["headshot"], "pulse");
    assert_eq!(json["elementAnimations"]["logo"], "none");
    // Sections absent from the patch are untouched.
    assert_eq!(json["personalInfo"]["company"], "Apex Solutions");

    let response = put_json(
        &app.router,
        &format!("/api/v1/signatures/{id}"),
        serde_json::json!({ "elementAnimations": {} }),
    )
    .await;
    assert_eq!(body_json(response).await["tag"], "static");
}

#[tokio::test]
async fn test_update_validates_patch() {
    let app = common::build_test_app();
    let id = create_signature(&app.router, signature_payload("professional")).await;

    let response = put_json(
        &app.router,
        &format!("/api/v1/signatures/{id}"),
        serde_json::json!({ "templateId": "unknown" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_filters_by_owner() {
    let app = common::build_test_app();
    for owner in [1, 1, 2] {
        let mut payload = signature_payload("minimal");
        payload["ownerId"] = serde_json::json!(owner);
        create_signature(&app.router, payload).await;
    }

    let response = get(&app.router, "/api/v1/signatures?owner_id=1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);

    let json = body_json(get(&app.router, "/api/v1/signatures").await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_signature() {
    let app = common::build_test_app();
    let id = create_signature(&app.router, signature_payload("modern")).await;
    let uri = format!("/api/v1/signatures/{id}");

    assert_eq!(delete(&app.router, &uri).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(get(&app.router, &uri).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(delete(&app.router, &uri).await.status(), StatusCode::NOT_FOUND);
}
