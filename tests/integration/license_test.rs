//! License lifecycle tests over the HTTP surface.

use http::StatusCode;
use warden_auth::OperatorRole;

use crate::helpers::{TestApp, create_license_body};

#[tokio::test]
async fn test_requires_bearer_token() {
    let app = TestApp::new().await;

    let response = app.request("GET", "/api/licenses", None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app
        .request("GET", "/api/licenses", None, Some("not-a-jwt"))
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_and_fetch_license() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let response = app
        .request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);

    let license = &response.body["data"];
    assert_eq!(license["state"], "active");
    assert_eq!(license["executions_used"], 0);
    assert_eq!(license["revoked"], false);

    let id = license["id"].as_str().unwrap();
    let response = app
        .request("GET", &format!("/api/license/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], license["id"]);
}

#[tokio::test]
async fn test_create_rejects_invalid_fields() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let mut body = create_license_body(binary_id);
    body["network_failure_kill_count"] = serde_json::json!(0);

    let response = app
        .request("POST", "/api/license/create", Some(body), Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_readonly_patch_rejected_and_row_unchanged() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let mut body = create_license_body(binary_id);
    body["license_type"] = serde_json::json!("readonly");
    body["max_executions"] = serde_json::json!(3);

    let response = app
        .request("POST", "/api/license/create", Some(body), Some(&token))
        .await;
    let id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PATCH",
            &format!("/api/license/{id}"),
            Some(serde_json::json!({"max_executions": 10})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["error"], "IMMUTABLE_LICENSE");

    let response = app
        .request("GET", &format!("/api/license/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.body["data"]["max_executions"], 3);
}

#[tokio::test]
async fn test_patch_changes_only_submitted_fields() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let response = app
        .request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&token),
        )
        .await;
    let id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "PATCH",
            &format!("/api/license/{id}"),
            Some(serde_json::json!({"kill_method": "shred"})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["kill_method"], "shred");
    assert_eq!(response.body["data"]["check_interval_ms"], 60000);
    assert_eq!(response.body["data"]["max_executions"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_revoke_is_idempotent() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let response = app
        .request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&token),
        )
        .await;
    let id = response.body["data"]["id"].as_str().unwrap().to_string();

    let first = app
        .request(
            "POST",
            &format!("/api/license/{id}/revoke"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.body["data"]["state"], "revoked");

    let second = app
        .request(
            "POST",
            &format!("/api/license/{id}/revoke"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(
        first.body["data"]["revoked_at"],
        second.body["data"]["revoked_at"]
    );
}

#[tokio::test]
async fn test_delete_requires_admin() {
    let app = TestApp::new().await;
    let operator = app.token(OperatorRole::Operator);
    let admin = app.token(OperatorRole::Admin);
    let binary_id = app.seed_binary().await;

    let response = app
        .request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&operator),
        )
        .await;
    let id = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "DELETE",
            &format!("/api/license/{id}"),
            None,
            Some(&operator),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("DELETE", &format!("/api/license/{id}"), None, Some(&admin))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let response = app
        .request("GET", &format!("/api/license/{id}"), None, Some(&operator))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_pagination_and_sort_whitelist() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    for _ in 0..3 {
        app.request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&token),
        )
        .await;
    }

    let response = app
        .request("GET", "/api/licenses?page=1&per_page=2", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(response.body["data"]["total_items"], 3);
    assert_eq!(response.body["data"]["has_next"], true);

    let response = app
        .request(
            "GET",
            "/api/licenses?sort_by=definitely_not_a_column",
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .request(
            "GET",
            &format!("/api/binary/{binary_id}/licenses"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 3);
}
