// ==========================================
// 云端同步集成测试
// ==========================================
// 覆盖: HTTP 推送/拉取、失败不改状态、空库拒绝推送、整体超时、单任务互斥
// ==========================================

mod test_helpers;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use mushroom_ops::api::ApiError;
use mushroom_ops::app::AppState;
use mushroom_ops::config::config_keys;
use mushroom_ops::sync::SyncError;
use serde_json::json;
use test_helpers::{
    candidate, create_app, create_test_db, new_batch, seed_users, set_config, ScriptedTransport,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app_for_endpoint(db_path: &str, endpoint: &str) -> AppState {
    set_config(db_path, config_keys::SYNC_ENDPOINT, endpoint);
    let app = AppState::new(db_path.to_string()).expect("Failed to create AppState");
    seed_users(&app);
    app
}

#[tokio::test]
async fn test_push_sends_batches_and_inventory() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(body_partial_json(json!({ "action": "push" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "1 batch saved" })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, db_path) = create_test_db();
    let app = app_for_endpoint(&db_path, &format!("{}/exec", server.uri()));
    assert!(app.sync_api.is_configured());
    assert!(app.sync_api.last_push_at().is_none());

    app.receiving_api
        .create_batch(new_batch("Village A", "Oyster Mushrooms", 50.0, 2.0), "operator")
        .expect("Failed to create batch");

    let report = app.sync_api.push("operator").await.expect("Failed to push");
    assert_eq!(report.message, "1 batch saved");
    assert_eq!(report.batch_count, 1);
    assert_eq!(report.inventory_count, 4);
    assert_eq!(app.sync_api.last_push_at(), Some(report.pushed_at));

    let requests = server.received_requests().await.expect("Request recording disabled");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).expect("Invalid body");
    assert_eq!(body["batches"][0]["goodWeight"], 48.0);
    assert_eq!(body["batches"][0]["status"], "Received");
    assert_eq!(body["inventory"].as_array().map(Vec::len), Some(4));
}

#[tokio::test]
async fn test_pull_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "batches": [
                { "id": "EXT-1", "farmerName": "Village B", "mushroomType": "Shiitake", "totalWeight": 20 }
            ],
            "newHarvest": { "farmerName": "Village C", "mushroomType": "Enoki", "totalWeight": "12.5" }
        })))
        .mount(&server)
        .await;

    let (_dir, db_path) = create_test_db();
    let app = app_for_endpoint(&db_path, &format!("{}/exec", server.uri()));

    let report = app.sync_api.pull("operator").await.expect("Failed to pull");
    assert_eq!(report.received, 2);
    assert_eq!(report.admitted, 2);

    let pending = app.receiving_api.list_pending().expect("pending");
    assert_eq!(pending[1].total_weight, Some(12.5));
}

#[tokio::test]
async fn test_server_error_leaves_state_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let (_dir, db_path) = create_test_db();
    let app = app_for_endpoint(&db_path, &server.uri());
    app.receiving_api
        .create_batch(new_batch("Village A", "Oyster Mushrooms", 50.0, 2.0), "operator")
        .expect("Failed to create batch");
    let actions_before = app.dashboard_api.recent_actions(10).expect("actions").len();

    let err = app.sync_api.pull("operator").await.expect_err("Pull must fail");
    assert!(matches!(err, ApiError::SyncFailed(_)));
    assert!(err.is_retryable());
    assert!(app.receiving_api.list_pending().expect("pending").is_empty());
    assert!(app.alert_api.list().expect("alerts").is_empty());

    let err = app.sync_api.push("operator").await.expect_err("Push must fail");
    assert!(matches!(err, ApiError::SyncFailed(_)));
    assert!(app.sync_api.last_push_at().is_none());

    // 失败的同步不写审计
    assert_eq!(
        app.dashboard_api
            .recent_actions(10)
            .expect("Failed to list actions")
            .len(),
        actions_before
    );
}

#[tokio::test]
async fn test_push_refuses_empty_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "0 batches saved" })))
        .expect(0)
        .mount(&server)
        .await;

    let (_dir, db_path) = create_test_db();
    let app = app_for_endpoint(&db_path, &server.uri());

    let err = app.sync_api.push("operator").await.expect_err("Empty push must be refused");
    assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    assert!(!err.is_retryable());
    assert!(app.sync_api.last_push_at().is_none());
    assert!(!app.sync_api.is_busy());
}

#[tokio::test]
async fn test_sync_without_endpoint() {
    let (_dir, app) = create_app();
    assert!(!app.sync_api.is_configured());

    let err = app.sync_api.push("operator").await.expect_err("Push must fail");
    assert!(matches!(err, ApiError::SyncNotConfigured));
    assert!(!err.is_retryable());

    let err = app.sync_api.pull("operator").await.expect_err("Pull must fail");
    assert!(matches!(err, ApiError::SyncNotConfigured));
}

#[tokio::test]
async fn test_transport_failure_then_retry() {
    let transport = ScriptedTransport::new()
        .fail_with(SyncError::Network("connection refused".to_string()))
        .respond_with(vec![candidate(Some("EXT-2"), "Village D", "Oyster Mushrooms", 9.0)], None);
    let (_dir, app) = test_helpers::create_app_with_transport(Arc::new(transport));

    let err = app.sync_api.pull("operator").await.expect_err("First pull must fail");
    assert!(matches!(err, ApiError::SyncFailed(_)));
    assert!(app.receiving_api.list_pending().expect("pending").is_empty());

    let report = app.sync_api.pull("operator").await.expect("Retry failed");
    assert_eq!(report.admitted, 1);
}

#[tokio::test]
async fn test_sync_times_out() {
    let (_dir, db_path) = create_test_db();
    set_config(&db_path, config_keys::SYNC_TIMEOUT_SECS, "1");

    let transport = ScriptedTransport::with_delay(Duration::from_secs(3))
        .respond_with(vec![candidate(None, "Village E", "Enoki", 4.0)], None);
    let app = AppState::with_transport(db_path, Arc::new(transport))
        .expect("Failed to create AppState");
    seed_users(&app);
    app.receiving_api
        .create_batch(new_batch("Village E", "Enoki", 4.0, 0.0), "operator")
        .expect("Failed to create batch");

    let err = app.sync_api.pull("operator").await.expect_err("Pull must time out");
    assert!(matches!(err, ApiError::SyncFailed(_)));
    assert!(app.receiving_api.list_pending().expect("pending").is_empty());
    assert!(!app.sync_api.is_busy());

    let err = app.sync_api.push("operator").await.expect_err("Push must time out");
    assert!(matches!(err, ApiError::SyncFailed(_)));
    assert!(app.sync_api.last_push_at().is_none());
}

#[tokio::test]
async fn test_only_one_sync_in_flight() {
    let transport = Arc::new(ScriptedTransport::with_delay(Duration::from_millis(300)));
    let (_dir, app) = test_helpers::create_app_with_transport(transport.clone());
    app.receiving_api
        .create_batch(new_batch("Village F", "Shiitake", 20.0, 1.0), "operator")
        .expect("Failed to create batch");

    let (first, second) = tokio::join!(app.sync_api.push("operator"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        app.sync_api.pull("operator").await
    });

    assert!(first.is_ok());
    assert!(matches!(second, Err(ApiError::SyncBusy)));
    assert_eq!(transport.push_calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.pull_calls.load(Ordering::SeqCst), 0);

    let pushed = transport.last_push().expect("Push request not recorded");
    assert_eq!(pushed.action, "push");
    assert_eq!(pushed.batches.len(), 1);
}
