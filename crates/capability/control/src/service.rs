//! 操作员下发：解析 → 授权 → 静音状态 → 入队 → 审计。

use crate::audit::AuditRecorder;
use crate::mute::MuteState;
use crate::{ControlConfig, ControlError, RequestMeta, now_epoch_ms};
use domain::{CommandStatus, Identity};
use homelink_auth::{authorize, generate_device_secret, resolve_action};
use homelink_storage::{CommandRecord, CommandStore, DeviceRecord, DeviceStore};
use homelink_telemetry::{
    record_audit_write_failure, record_authorization_denial, record_command_enqueued,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

/// 设备注册请求。
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistration {
    pub device_id: String,
    pub name: Option<String>,
    pub secret_key: Option<String>,
}

/// 控制服务。
#[derive(Clone)]
pub struct ControlService {
    device_store: Arc<dyn DeviceStore>,
    command_store: Arc<dyn CommandStore>,
    audit: Arc<AuditRecorder>,
    config: ControlConfig,
}

impl ControlService {
    pub fn new(
        device_store: Arc<dyn DeviceStore>,
        command_store: Arc<dyn CommandStore>,
        audit: Arc<AuditRecorder>,
        config: ControlConfig,
    ) -> Self {
        Self {
            device_store,
            command_store,
            audit,
            config,
        }
    }

    /// 受理一次控制请求，返回已入队的命令。
    ///
    /// 拒绝时不写队列也不写审计。
    pub async fn submit(
        &self,
        identity: &Identity,
        device_id: &str,
        body: &Value,
        meta: &RequestMeta,
    ) -> Result<CommandRecord, ControlError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(ControlError::Validation("deviceId is required".to_string()));
        }
        let resolved = resolve_action(body).map_err(ControlError::from)?;
        let action = resolved
            .and_then(|action| authorize(identity, device_id, &action).map(|_| action))
            .map_err(|denial| {
                record_authorization_denial();
                warn!(
                    target: "homelink.control",
                    device_id = %device_id,
                    actor = %identity.user_id,
                    reason = %denial,
                    "control_denied"
                );
                ControlError::Forbidden(denial)
            })?
            .with_default_snooze(self.config.snooze_default_seconds);

        let device = self
            .device_store
            .find_device(device_id)
            .await?
            .ok_or_else(|| ControlError::NotFound("device not found".to_string()))?;

        let now_ms = now_epoch_ms();
        let current = MuteState::new(device.muted_sensors.clone(), device.mute_ends_at_ms);
        if let Some(next) = current.apply(&action, now_ms, self.config.snooze_default_seconds) {
            self.device_store
                .update_mute_state(device_id, &next.sensors, next.ends_at_ms)
                .await?;
            info!(
                target: "homelink.control",
                device_id = %device_id,
                muted_sensors = ?next.sensors,
                mute_ends_at_ms = ?next.ends_at_ms,
                "mute_state_updated"
            );
        }

        let record = CommandRecord {
            command_id: uuid::Uuid::new_v4().to_string(),
            device_id: device_id.to_string(),
            action: action.to_payload(),
            requested_by: Some(identity.user_id.clone()),
            requested_by_username: Some(identity.username.clone()),
            status: CommandStatus::Pending,
            created_at_ms: now_ms,
            sent_at_ms: None,
            delivered_at_ms: None,
            result: None,
        };
        let record = self.command_store.create_command(record).await?;
        record_command_enqueued();
        info!(
            target: "homelink.control",
            device_id = %record.device_id,
            command_id = %record.command_id,
            actor = %identity.user_id,
            action = %action.name(),
            "command_enqueued"
        );

        if let Err(err) = self
            .audit
            .record_submission(identity, device_id, &action, &record.command_id, meta, now_ms)
            .await
        {
            record_audit_write_failure();
            warn!(
                target: "homelink.control",
                device_id = %record.device_id,
                command_id = %record.command_id,
                error = %err,
                "audit_write_failed"
            );
        }
        Ok(record)
    }

    /// 注册设备；未提供密钥时生成随机密钥。
    pub async fn register_device(
        &self,
        registration: DeviceRegistration,
    ) -> Result<DeviceRecord, ControlError> {
        let device_id = registration.device_id.trim().to_string();
        if device_id.is_empty() {
            return Err(ControlError::Validation("deviceId is required".to_string()));
        }
        let secret_key = registration
            .secret_key
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(generate_device_secret);
        let name = registration
            .name
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| device_id.clone());
        let record = DeviceRecord {
            device_id,
            name,
            secret_key,
            is_active: true,
            muted_sensors: Vec::new(),
            mute_ends_at_ms: None,
            created_at_ms: now_epoch_ms(),
        };
        let record = self.device_store.create_device(record).await?;
        info!(
            target: "homelink.control",
            device_id = %record.device_id,
            "device_registered"
        );
        Ok(record)
    }

    /// 读取设备及其当前生效的静音状态。
    pub async fn device_status(
        &self,
        device_id: &str,
    ) -> Result<(DeviceRecord, MuteState), ControlError> {
        let device = self
            .device_store
            .find_device(device_id)
            .await?
            .ok_or_else(|| ControlError::NotFound("device not found".to_string()))?;
        let mute = MuteState::new(device.muted_sensors.clone(), device.mute_ends_at_ms)
            .effective(now_epoch_ms());
        Ok((device, mute))
    }
}
