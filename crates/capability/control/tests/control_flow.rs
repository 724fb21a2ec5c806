use domain::{
    AckOutcome, AuditResultStatus, CommandStatus, GrantSet, Identity, PermissionMatrix, Role,
};
use homelink_auth::{DeviceSignatureVerifier, sign_payload};
use homelink_control::{
    AuditQuery, AuditRecorder, ControlConfig, ControlError, ControlService, DeviceGateway,
    DeviceRegistration, RequestMeta, SelfLogEntry, purge_expired_audit_logs,
};
use homelink_storage::{
    AuditLogFilter, AuditLogPage, AuditLogRecord, AuditResolution, AuditLogStore, CommandStore,
    DeviceRecord, DeviceStore, InMemoryAuditLogStore, InMemoryCommandStore, InMemoryDeviceStore,
    StorageError,
};
use homelink_telemetry::metrics;
use serde_json::json;
use std::sync::Arc;

const SECRET: &str = "hub-secret";

struct Harness {
    devices: Arc<InMemoryDeviceStore>,
    commands: Arc<InMemoryCommandStore>,
    audits: Arc<InMemoryAuditLogStore>,
    recorder: Arc<AuditRecorder>,
    service: ControlService,
    gateway: DeviceGateway,
}

fn harness(config: ControlConfig) -> Harness {
    let devices = Arc::new(InMemoryDeviceStore::with_devices(vec![DeviceRecord {
        device_id: "hub-1".to_string(),
        name: "Front door".to_string(),
        secret_key: SECRET.to_string(),
        is_active: true,
        muted_sensors: Vec::new(),
        mute_ends_at_ms: None,
        created_at_ms: 0,
    }]));
    let commands = Arc::new(InMemoryCommandStore::new());
    let audits = Arc::new(InMemoryAuditLogStore::new());
    let recorder = Arc::new(AuditRecorder::new(audits.clone()));
    let service = ControlService::new(
        devices.clone(),
        commands.clone(),
        recorder.clone(),
        config.clone(),
    );
    let gateway = DeviceGateway::new(
        Arc::new(DeviceSignatureVerifier::new(devices.clone())),
        commands.clone(),
        recorder.clone(),
        config,
    );
    Harness {
        devices,
        commands,
        audits,
        recorder,
        service,
        gateway,
    }
}

fn operator(matrix: PermissionMatrix) -> Identity {
    Identity::new("user-1", "alice", Role::User, GrantSet::Matrix(matrix))
}

async fn all_audits(store: &InMemoryAuditLogStore) -> Vec<AuditLogRecord> {
    store
        .list_audit_logs(&AuditLogFilter {
            limit: 100,
            ..AuditLogFilter::default()
        })
        .await
        .expect("list")
        .items
}

#[tokio::test]
async fn open_door_end_to_end() {
    let h = harness(ControlConfig::default());
    let identity = operator(PermissionMatrix::new().grant("door", "open"));
    let meta = RequestMeta {
        ip_address: Some("10.0.0.5".to_string()),
        user_agent: Some("homelink-app/1.0".to_string()),
    };

    let command = h
        .service
        .submit(&identity, "hub-1", &json!({"action": "open_door"}), &meta)
        .await
        .expect("submit");
    assert_eq!(command.status, CommandStatus::Pending);

    let device = h
        .gateway
        .authenticate("hub-1", Some(&sign_payload(SECRET, b"{}")), b"")
        .await
        .expect("auth");
    let polled = h.gateway.poll(&device).await.expect("poll");
    assert_eq!(polled.len(), 1);
    assert_eq!(polled[0].command_id, command.command_id);
    assert_eq!(polled[0].requested_by_username.as_deref(), Some("alice"));
    let stored = h
        .commands
        .find_command(&command.command_id)
        .await
        .expect("find")
        .expect("command");
    assert_eq!(stored.status, CommandStatus::Sent);

    let acked = h
        .gateway
        .ack(&device, &command.command_id, AckOutcome::Done, None)
        .await
        .expect("ack");
    assert_eq!(acked.status, CommandStatus::Done);

    let audits = all_audits(&h.audits).await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].result_status, AuditResultStatus::Success);
    assert_eq!(
        audits[0].result_message.as_deref(),
        Some("Command executed successfully")
    );
    assert_eq!(audits[0].command_id(), Some(command.command_id.as_str()));
    assert!(audits[0].metadata.get("acknowledgedAt").is_some());
    assert_eq!(audits[0].ip_address.as_deref(), Some("10.0.0.5"));
}

#[tokio::test]
async fn unknown_action_creates_nothing() {
    let h = harness(ControlConfig::default());
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    let err = h
        .service
        .submit(
            &admin,
            "hub-1",
            &json!({"action": "launch_missiles"}),
            &RequestMeta::default(),
        )
        .await
        .expect_err("denied");
    assert!(matches!(err, ControlError::Forbidden(_)));

    let claimed = h.commands.claim_pending("hub-1", 1, None).await.expect("claim");
    assert!(claimed.is_empty());
    assert!(all_audits(&h.audits).await.is_empty());
}

#[tokio::test]
async fn snooze_all_requires_dedicated_grant() {
    let h = harness(ControlConfig::default());
    let mut matrix = PermissionMatrix::new().grant("alarm", "snoozeFire");
    matrix.set("alarm", "snoozeAll", false);
    let identity = operator(matrix);

    let err = h
        .service
        .submit(
            &identity,
            "hub-1",
            &json!({"action": "set_snooze", "sensor": "all"}),
            &RequestMeta::default(),
        )
        .await
        .expect_err("denied");
    assert_eq!(err.to_string(), "permission denied: requires alarm.snoozeAll");

    h.service
        .submit(
            &identity,
            "hub-1",
            &json!({"action": "set_snooze", "sensor": "fire"}),
            &RequestMeta::default(),
        )
        .await
        .expect("allowed");
    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    assert_eq!(device.muted_sensors, vec!["fire".to_string()]);
    assert!(device.mute_ends_at_ms.is_some());
}

#[tokio::test]
async fn mute_side_effects_and_status() {
    let h = harness(ControlConfig::default());
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    for body in [
        json!({"action": "set_snooze", "sensor": "fire"}),
        json!({"action": "set_snooze", "sensor": "gas", "seconds": 120}),
    ] {
        h.service
            .submit(&admin, "hub-1", &body, &RequestMeta::default())
            .await
            .expect("submit");
    }
    let (_, mute) = h.service.device_status("hub-1").await.expect("status");
    assert_eq!(mute.sensors, vec!["fire".to_string(), "gas".to_string()]);

    h.service
        .submit(
            &admin,
            "hub-1",
            &json!({"action": "cancel_snooze", "sensor": "all"}),
            &RequestMeta::default(),
        )
        .await
        .expect("cancel");
    let (_, mute) = h.service.device_status("hub-1").await.expect("status");
    assert!(mute.sensors.is_empty());
    assert_eq!(mute.ends_at_ms, None);

    let claimed = h.commands.claim_pending("hub-1", i64::MAX, None).await.expect("claim");
    let names: Vec<&str> = claimed
        .iter()
        .filter_map(|command| command.action["name"].as_str())
        .collect();
    assert_eq!(names, vec!["set_snooze", "set_snooze", "cancel_snooze"]);
    assert_eq!(claimed[0].action["seconds"], json!(300));
}

#[tokio::test]
async fn submit_rejects_missing_action_and_unknown_device() {
    let h = harness(ControlConfig::default());
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    let err = h
        .service
        .submit(&admin, "hub-1", &json!({}), &RequestMeta::default())
        .await
        .expect_err("missing");
    assert!(matches!(err, ControlError::Validation(_)));

    let err = h
        .service
        .submit(&admin, "hub-9", &json!({"action": "open_door"}), &RequestMeta::default())
        .await
        .expect_err("missing device");
    assert!(matches!(err, ControlError::NotFound(_)));
}

#[tokio::test]
async fn ack_for_other_device_is_not_found_and_conflict_detected() {
    let h = harness(ControlConfig::default());
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    h.service
        .register_device(DeviceRegistration {
            device_id: "hub-2".to_string(),
            name: None,
            secret_key: Some("other".to_string()),
        })
        .await
        .expect("register");
    let command = h
        .service
        .submit(&admin, "hub-1", &json!({"action": "close_door"}), &RequestMeta::default())
        .await
        .expect("submit");

    let other = h.devices.find_device("hub-2").await.expect("find").expect("device");
    let err = h
        .gateway
        .ack(&other, &command.command_id, AckOutcome::Done, None)
        .await
        .expect_err("wrong device");
    assert!(matches!(err, ControlError::NotFound(_)));

    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    h.gateway
        .ack(
            &device,
            &command.command_id,
            AckOutcome::Failed,
            Some(json!({"message": "jammed"})),
        )
        .await
        .expect("ack");
    let err = h
        .gateway
        .ack(&device, &command.command_id, AckOutcome::Done, None)
        .await
        .expect_err("conflict");
    assert!(matches!(err, ControlError::Conflict(_)));

    let audits = all_audits(&h.audits).await;
    assert_eq!(audits[0].result_status, AuditResultStatus::Failed);
    assert_eq!(audits[0].result_message.as_deref(), Some("jammed"));
}

#[tokio::test]
async fn bad_signature_is_authentication_error() {
    let h = harness(ControlConfig::default());
    let err = h
        .gateway
        .authenticate("hub-1", Some(&sign_payload("wrong", b"{}")), b"{}")
        .await
        .expect_err("rejected");
    assert!(matches!(err, ControlError::Authentication(_)));
    let err = h
        .gateway
        .authenticate("hub-1", None, b"{}")
        .await
        .expect_err("rejected");
    assert!(matches!(err, ControlError::Authentication(_)));
}

#[tokio::test]
async fn redelivery_reoffers_stale_sent_commands() {
    let h = harness(ControlConfig {
        redelivery_after_ms: 1,
        ..ControlConfig::default()
    });
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    h.service
        .submit(&admin, "hub-1", &json!({"action": "open_awning"}), &RequestMeta::default())
        .await
        .expect("submit");
    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    assert_eq!(h.gateway.poll(&device).await.expect("poll").len(), 1);
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert_eq!(h.gateway.poll(&device).await.expect("poll").len(), 1);
}

#[tokio::test]
async fn self_log_validation_and_defaults() {
    let h = harness(ControlConfig::default());
    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");

    let err = h
        .gateway
        .self_log(&device, SelfLogEntry::default(), &RequestMeta::default())
        .await
        .expect_err("missing");
    assert!(matches!(err, ControlError::Validation(_)));

    let record = h
        .gateway
        .self_log(
            &device,
            SelfLogEntry {
                action_type: Some("door_open".to_string()),
                source: Some("keypad".to_string()),
                details: Some(json!({"method": "pin"})),
                ..SelfLogEntry::default()
            },
            &RequestMeta::default(),
        )
        .await
        .expect("log");
    assert_eq!(record.result_status, AuditResultStatus::Success);
    assert!(record.command_id().is_none());
}

#[tokio::test]
async fn audit_listing_scopes_non_admin_and_purges() {
    let h = harness(ControlConfig::default());
    let user = operator(PermissionMatrix::new().grant("door", "open"));
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    for identity in [&user, &admin] {
        h.service
            .submit(identity, "hub-1", &json!({"action": "open_door"}), &RequestMeta::default())
            .await
            .expect("submit");
    }

    let own = h
        .recorder
        .list(&user, AuditQuery::default())
        .await
        .expect("list");
    assert_eq!(own.total, 1);
    let everything = h
        .recorder
        .list(&admin, AuditQuery::default())
        .await
        .expect("list");
    assert_eq!(everything.total, 2);
    assert_eq!(everything.total_pages(), 1);

    let admin_log = everything
        .items
        .iter()
        .find(|record| record.performed_by_user_id.as_deref() == Some("admin-1"))
        .expect("admin log");
    assert!(matches!(
        h.recorder.find(&user, &admin_log.audit_id).await,
        Err(ControlError::NotFound(_))
    ));

    let far_future = i64::MAX / 2;
    let deleted = purge_expired_audit_logs(&h.recorder, 180, far_future)
        .await
        .expect("purge");
    assert_eq!(deleted, 2);
}

struct FailingAuditStore;

#[async_trait::async_trait]
impl AuditLogStore for FailingAuditStore {
    async fn create_audit_log(
        &self,
        _record: AuditLogRecord,
    ) -> Result<AuditLogRecord, StorageError> {
        Err(StorageError::new("audit table unavailable"))
    }

    async fn resolve_by_command(
        &self,
        _command_id: &str,
        _resolution: AuditResolution,
    ) -> Result<Option<AuditLogRecord>, StorageError> {
        Err(StorageError::new("audit table unavailable"))
    }

    async fn find_audit_log(&self, _audit_id: &str) -> Result<Option<AuditLogRecord>, StorageError> {
        Ok(None)
    }

    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> Result<AuditLogPage, StorageError> {
        Err(StorageError::new(format!(
            "audit table unavailable (limit {})",
            filter.limit
        )))
    }

    async fn purge_before(&self, _cutoff_ms: i64) -> Result<u64, StorageError> {
        Ok(0)
    }
}

#[tokio::test]
async fn audit_failures_never_roll_back_commands() {
    let h = harness(ControlConfig::default());
    let recorder = Arc::new(AuditRecorder::new(Arc::new(FailingAuditStore)));
    let service = ControlService::new(
        h.devices.clone(),
        h.commands.clone(),
        recorder.clone(),
        ControlConfig::default(),
    );
    let gateway = DeviceGateway::new(
        Arc::new(DeviceSignatureVerifier::new(h.devices.clone())),
        h.commands.clone(),
        recorder,
        ControlConfig::default(),
    );
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    let failures_before = metrics().snapshot().audit_write_failures;

    let command = service
        .submit(&admin, "hub-1", &json!({"action": "open_door"}), &RequestMeta::default())
        .await
        .expect("submit survives audit failure");
    let after_submit = metrics().snapshot().audit_write_failures;
    assert!(after_submit > failures_before);

    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    let polled = gateway.poll(&device).await.expect("poll");
    assert_eq!(polled.len(), 1);
    assert_eq!(polled[0].command_id, command.command_id);

    let acked = gateway
        .ack(&device, &command.command_id, AckOutcome::Done, None)
        .await
        .expect("ack survives audit failure");
    assert_eq!(acked.status, CommandStatus::Done);
    assert!(metrics().snapshot().audit_write_failures > after_submit);
}

#[tokio::test]
async fn oversized_redelivery_window_never_reoffers() {
    let h = harness(ControlConfig {
        redelivery_after_ms: u64::MAX,
        ..ControlConfig::default()
    });
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    h.service
        .submit(&admin, "hub-1", &json!({"action": "open_awning"}), &RequestMeta::default())
        .await
        .expect("submit");
    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    assert_eq!(h.gateway.poll(&device).await.expect("poll").len(), 1);
    assert!(h.gateway.poll(&device).await.expect("poll").is_empty());
}

#[tokio::test]
async fn oversized_snooze_is_rejected_before_enqueue() {
    let h = harness(ControlConfig::default());
    let admin = Identity::new("admin-1", "root", Role::Admin, GrantSet::default());
    let err = h
        .service
        .submit(
            &admin,
            "hub-1",
            &json!({"action": "set_snooze", "sensor": "fire", "seconds": 9_223_372_036_000_000u64}),
            &RequestMeta::default(),
        )
        .await
        .expect_err("too long");
    assert!(matches!(err, ControlError::Validation(_)));
    let device = h.devices.find_device("hub-1").await.expect("find").expect("device");
    assert!(h.gateway.poll(&device).await.expect("poll").is_empty());
    assert!(all_audits(&h.audits).await.is_empty());
}
