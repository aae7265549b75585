//! Analytics, dashboard, and download-token tests.

use http::StatusCode;
use serde_json::json;
use warden_auth::OperatorRole;

use crate::helpers::{TestApp, create_license_body};

fn verify_body(license_id: &str) -> serde_json::Value {
    json!({
        "license_id": license_id,
        "machine_fingerprint": "machine-fingerprint-0001",
        "kind": "start",
    })
}

#[tokio::test]
async fn test_analytics_over_mixed_attempts() {
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
    let healthy = response.body["data"]["id"].as_str().unwrap().to_string();

    let response = app
        .request(
            "POST",
            "/api/license/create",
            Some(create_license_body(binary_id)),
            Some(&token),
        )
        .await;
    let doomed = response.body["data"]["id"].as_str().unwrap().to_string();
    app.request(
        "POST",
        &format!("/api/license/{doomed}/revoke"),
        None,
        Some(&token),
    )
    .await;

    // 4 allowed checks and 1 rejected check = 80% success.
    for _ in 0..4 {
        app.request("POST", "/api/verify", Some(verify_body(&healthy)), None)
            .await;
    }
    app.request("POST", "/api/verify", Some(verify_body(&doomed)), None)
        .await;

    let response = app
        .request("GET", "/api/analytics", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["total_attempts"], 5);
    assert_eq!(data["success_rate"], 80.0);

    let buckets = data["hourly_activity"].as_array().unwrap();
    assert_eq!(buckets.len(), 24);
    let total: u64 = buckets.iter().map(|b| b["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 5);

    assert_eq!(data["license_status"]["active"], 1);
    assert_eq!(data["license_status"]["revoked"], 1);
    assert_eq!(data["license_status"]["expired"], 0);

    let top = data["top_binaries"].as_array().unwrap();
    assert_eq!(top[0]["total_executions"], 4);

    // All attempts came without a resolvable IP.
    assert_eq!(data["geographic_distribution"][0]["country"], "unknown");
    assert_eq!(data["geographic_distribution"][0]["percent"], 100.0);
}

#[tokio::test]
async fn test_dashboard_counts() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Viewer);
    let operator = app.token(OperatorRole::Operator);
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

    app.request("POST", "/api/verify", Some(verify_body(&id)), None)
        .await;
    app.request("POST", "/api/verify", Some(verify_body(&id)), None)
        .await;

    let response = app
        .request("GET", "/api/telemetry/dashboard", None, Some(&token))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["total_binaries"], 1);
    assert_eq!(data["total_licenses"], 1);
    assert_eq!(data["total_machines"], 1);
    assert_eq!(data["attempts_24h"], 2);
    assert_eq!(data["most_active_licenses"][0]["attempts"], 2);
}

#[tokio::test]
async fn test_binary_attempt_log_pagination() {
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

    for _ in 0..5 {
        app.request("POST", "/api/verify", Some(verify_body(&id)), None)
            .await;
    }

    let response = app
        .request(
            "GET",
            &format!("/api/binary/{binary_id}/verification-attempts?limit=2&skip=1"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let data = &response.body["data"];
    assert_eq!(data["items"].as_array().unwrap().len(), 2);
    assert_eq!(data["total"], 5);
    assert_eq!(data["limit"], 2);
    assert_eq!(data["skip"], 1);
}

#[tokio::test]
async fn test_download_token_single_use() {
    let app = TestApp::new().await;
    let token = app.token(OperatorRole::Operator);
    let binary_id = app.seed_binary().await;

    let response = app
        .request(
            "POST",
            &format!("/api/binary/{binary_id}/download-token"),
            None,
            Some(&token),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    let url = response.body["data"]["download_url"].as_str().unwrap().to_string();

    // The download URL itself is the credential: no bearer token.
    let (status, bytes) = app.request_raw("GET", &url, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bytes, b"wrapped-binary-bytes");

    // One-time: redeeming the same token again fails.
    let (status, _) = app.request_raw("GET", &url, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
