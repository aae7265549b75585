//! Machine-facing verification endpoint tests.

use http::StatusCode;
use serde_json::json;
use warden_auth::OperatorRole;

use crate::helpers::{TestApp, create_license_body};

const FINGERPRINT: &str = "machine-fingerprint-0001";

fn verify_body(license_id: &str, kind: &str) -> serde_json::Value {
    json!({
        "license_id": license_id,
        "machine_fingerprint": FINGERPRINT,
        "kind": kind,
    })
}

#[tokio::test]
async fn test_full_lifecycle_scenario() {
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

    // First verification: ALLOW, executions_used = 1, machine created.
    let response = app
        .request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
        .await;
    assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
    assert_eq!(response.body["verdict"], "allow");
    assert_eq!(response.body["settings"]["executions_used"], 1);
    assert_eq!(response.body["settings"]["check_interval_ms"], 60000);

    // Revoke, then the next verification KILLs.
    app.request(
        "POST",
        &format!("/api/license/{id}/revoke"),
        None,
        Some(&token),
    )
    .await;

    let response = app
        .request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
        .await;
    assert_eq!(response.body["verdict"], "kill");
    assert_eq!(response.body["reason"], "revoked");
    assert_eq!(response.body["method"], "stop");

    // Re-enable, verification works again and counters kept advancing.
    app.request(
        "POST",
        &format!("/api/license/{id}/re-enable"),
        None,
        Some(&token),
    )
    .await;

    let response = app
        .request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
        .await;
    assert_eq!(response.body["verdict"], "allow");
    assert_eq!(response.body["settings"]["executions_used"], 2);

    // Stats reflect the two allowed contacts and the one rejection.
    let response = app
        .request(
            "GET",
            &format!("/api/license/{id}/stats"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let stats = &response.body["data"];
    assert_eq!(stats["machines"].as_array().unwrap().len(), 1);
    assert_eq!(stats["machines"][0]["total_checks"], 2);
    assert_eq!(stats["recent_attempts"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_readonly_exhaustion_scenario() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let mut body = create_license_body(binary_id);
    body["license_type"] = json!("readonly");
    body["max_executions"] = json!(3);
    body["kill_method"] = json!("shred");

    let response = app
        .request("POST", "/api/license/create", Some(body), Some(&token))
        .await;
    let id = response.body["data"]["id"].as_str().unwrap().to_string();

    // Raising the cap is rejected on the readonly license.
    let response = app
        .request(
            "PATCH",
            &format!("/api/license/{id}"),
            Some(json!({"max_executions": 10})),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    // Three executions pass; the fourth KILLs with the configured method.
    for expected in 1..=3 {
        let response = app
            .request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
            .await;
        assert_eq!(response.body["verdict"], "allow");
        assert_eq!(response.body["settings"]["executions_used"], expected);
    }

    let response = app
        .request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
        .await;
    assert_eq!(response.body["verdict"], "kill");
    assert_eq!(response.body["reason"], "execution_limit");
    assert_eq!(response.body["method"], "shred");

    let response = app
        .request("GET", &format!("/api/license/{id}"), None, Some(&token))
        .await;
    assert_eq!(response.body["data"]["executions_used"], 3);
}

#[tokio::test]
async fn test_heartbeats_do_not_consume_budget() {
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

    app.request("POST", "/api/verify", Some(verify_body(&id, "start")), None)
        .await;
    let response = app
        .request(
            "POST",
            "/api/verify",
            Some(verify_body(&id, "heartbeat")),
            None,
        )
        .await;
    assert_eq!(response.body["verdict"], "allow");
    assert_eq!(response.body["settings"]["executions_used"], 1);
}

#[tokio::test]
async fn test_verify_rejects_operator_credentials() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Admin);
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

    // Even a valid admin token must not pass on the machine endpoint.
    let response = app
        .request(
            "POST",
            "/api/verify",
            Some(verify_body(&id, "start")),
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_unknown_license_denies() {
    let app = TestApp::new().await;

    let response = app
        .request(
            "POST",
            "/api/verify",
            Some(verify_body("550e8400-e29b-41d4-a716-446655440000", "start")),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["verdict"], "deny");
    assert_eq!(response.body["reason"], "unknown_license");
}

#[tokio::test]
async fn test_verify_rejects_malformed_fingerprint() {
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
            "POST",
            "/api/verify",
            Some(json!({
                "license_id": id,
                "machine_fingerprint": "short",
                "kind": "start",
            })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    // A rejected input is not logged as an attempt against the license.
    let response = app
        .request(
            "GET",
            &format!("/api/license/{id}/stats"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(
        response.body["data"]["recent_attempts"].as_array().unwrap().len(),
        0
    );
}
