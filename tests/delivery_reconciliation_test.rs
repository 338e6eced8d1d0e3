// ==========================================
// 到货对账集成测试
// ==========================================
// 覆盖: 云端拉取去重（批次号/队列号/内容）、重复拉取幂等、验收后再拉取
// ==========================================

mod test_helpers;

use std::sync::Arc;

use mushroom_ops::domain::{AlertSource, BatchStatus, DeliveryRef};
use test_helpers::{candidate, create_app_with_transport, new_batch, ScriptedTransport};

#[tokio::test]
async fn test_pull_admits_new_deliveries_with_alerts() {
    let transport = ScriptedTransport::new().respond_with(
        vec![
            candidate(Some("EXT-1"), "Village A", "Oyster Mushrooms", 20.0),
            candidate(None, "Village B", "Shiitake", 8.0),
        ],
        Some(candidate(None, "Village C", "Enoki", 12.5)),
    );
    let (_dir, app) = create_app_with_transport(Arc::new(transport));

    let report = app.sync_api.pull("operator").await.expect("Failed to pull");
    assert_eq!(report.received, 3);
    assert_eq!(report.admitted, 3);
    assert_eq!(report.duplicates, 0);
    assert_eq!(report.queue_len, 3);

    // newHarvest 排在 batches 之后
    let pending = app.receiving_api.list_pending().expect("Failed to list pending");
    assert_eq!(pending[0].id.as_deref(), Some("EXT-1"));
    assert_eq!(pending[2].farmer_name.as_deref(), Some("Village C"));

    let alerts = app.alert_api.list().expect("Failed to list alerts");
    let delivery_alerts = alerts
        .iter()
        .filter(|a| a.source == AlertSource::Delivery)
        .count();
    assert_eq!(delivery_alerts, 3);
}

#[tokio::test]
async fn test_repeated_pull_is_idempotent() {
    let payload = vec![
        candidate(Some("EXT-1"), "Village A", "Oyster Mushrooms", 20.0),
        candidate(None, "Village B", "Shiitake", 8.0),
    ];
    let transport = ScriptedTransport::new()
        .respond_with(payload.clone(), None)
        .respond_with(payload, None);
    let (_dir, app) = create_app_with_transport(Arc::new(transport));

    app.sync_api.pull("operator").await.expect("First pull failed");
    let alerts_after_first = app.alert_api.list().expect("alerts").len();

    let second = app.sync_api.pull("operator").await.expect("Second pull failed");
    assert_eq!(second.admitted, 0);
    assert_eq!(second.duplicates, 2);
    assert_eq!(second.queue_len, 2);

    // 被丢弃的候选不产生预警
    assert_eq!(app.alert_api.list().expect("alerts").len(), alerts_after_first);
}

#[tokio::test]
async fn test_pull_skips_known_batches() {
    let transport = ScriptedTransport::new().respond_with(
        vec![
            candidate(Some("B-2026-0001"), "Village A", "Oyster Mushrooms", 50.0),
            candidate(Some("EXT-7"), "Village D", "Oyster Mushrooms", 9.0),
        ],
        None,
    );
    let (_dir, app) = create_app_with_transport(Arc::new(transport));

    let mut existing = new_batch("Village A", "Oyster Mushrooms", 50.0, 2.0);
    existing.id = Some("B-2026-0001".to_string());
    app.receiving_api
        .create_batch(existing, "operator")
        .expect("Failed to create batch");

    let report = app.sync_api.pull("operator").await.expect("Failed to pull");
    assert_eq!(report.admitted, 1);
    assert_eq!(report.duplicates, 1);

    let pending = app.receiving_api.list_pending().expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id.as_deref(), Some("EXT-7"));
}

#[tokio::test]
async fn test_accepted_delivery_not_requeued() {
    let harvest = candidate(Some("EXT-9"), "Village E", "Shiitake", 15.0);
    let transport = ScriptedTransport::new()
        .respond_with(vec![harvest.clone()], None)
        .respond_with(vec![harvest], None);
    let (_dir, app) = create_app_with_transport(Arc::new(transport));

    app.sync_api.pull("operator").await.expect("First pull failed");
    let batch = app
        .receiving_api
        .accept_delivery(&DeliveryRef::Id("EXT-9".to_string()), "operator")
        .expect("Failed to accept delivery");
    assert_eq!(batch.id, "EXT-9");
    assert_eq!(batch.status, BatchStatus::Received);
    assert_eq!(batch.good_weight, 14.5);
    assert!(app.receiving_api.list_pending().expect("pending").is_empty());

    // 已验收的到货按批次号去重
    let report = app.sync_api.pull("operator").await.expect("Second pull failed");
    assert_eq!(report.admitted, 0);
    assert_eq!(report.duplicates, 1);
    assert!(app.receiving_api.list_pending().expect("pending").is_empty());
}

#[tokio::test]
async fn test_content_duplicate_without_id() {
    let transport = ScriptedTransport::new()
        .respond_with(vec![candidate(None, "Village F", "Enoki", 6.0)], None)
        .respond_with(
            vec![
                candidate(None, "Village F", "Enoki", 6.0),
                candidate(None, "Village F", "Enoki", 7.0),
            ],
            None,
        );
    let (_dir, app) = create_app_with_transport(Arc::new(transport));

    app.sync_api.pull("operator").await.expect("First pull failed");
    let report = app.sync_api.pull("operator").await.expect("Second pull failed");

    // 同农户同品种但重量不同视为新到货
    assert_eq!(report.admitted, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(report.queue_len, 2);
}

#[tokio::test]
async fn test_discard_by_position() {
    let transport = ScriptedTransport::new().respond_with(
        vec![
            candidate(None, "Village G", "Oyster Mushrooms", 3.0),
            candidate(None, "Village H", "Oyster Mushrooms", 4.0),
        ],
        None,
    );
    let (_dir, app) = create_app_with_transport(Arc::new(transport));
    app.sync_api.pull("operator").await.expect("Failed to pull");

    let discarded = app
        .receiving_api
        .discard_delivery(&DeliveryRef::Position(0), "operator")
        .expect("Failed to discard");
    assert_eq!(discarded.farmer_name.as_deref(), Some("Village G"));

    let pending = app.receiving_api.list_pending().expect("pending");
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].farmer_name.as_deref(), Some("Village H"));
    assert!(app.receiving_api.list_batches().expect("batches").is_empty());
}
