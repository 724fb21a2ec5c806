//! 设备侧入口：签名认证后轮询、回执、自报日志。
//!
//! 认证与业务操作分开调用，调用方先拿到已认证的设备，再解析请求体。

use crate::audit::{AuditRecorder, SelfLogEntry};
use crate::{ControlConfig, ControlError, RequestMeta, now_epoch_ms};
use domain::AckOutcome;
use homelink_auth::{DeviceAuthError, DeviceAuthenticator};
use homelink_storage::{AckWriteResult, AuditLogRecord, CommandRecord, CommandStore, DeviceRecord};
use homelink_telemetry::{
    record_audit_write_failure, record_command_acknowledged, record_commands_claimed,
    record_signature_rejection,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct DeviceGateway {
    authenticator: Arc<dyn DeviceAuthenticator>,
    command_store: Arc<dyn CommandStore>,
    audit: Arc<AuditRecorder>,
    config: ControlConfig,
}

impl DeviceGateway {
    pub fn new(
        authenticator: Arc<dyn DeviceAuthenticator>,
        command_store: Arc<dyn CommandStore>,
        audit: Arc<AuditRecorder>,
        config: ControlConfig,
    ) -> Self {
        Self {
            authenticator,
            command_store,
            audit,
            config,
        }
    }

    /// 校验设备签名，返回已认证的设备。
    pub async fn authenticate(
        &self,
        device_id: &str,
        signature: Option<&str>,
        raw_body: &[u8],
    ) -> Result<DeviceRecord, ControlError> {
        match self
            .authenticator
            .authenticate(device_id, signature, raw_body)
            .await
        {
            Ok(device) => Ok(device),
            Err(err) => {
                if matches!(
                    err,
                    DeviceAuthError::MissingSignature | DeviceAuthError::InvalidSignature
                ) {
                    record_signature_rejection();
                }
                warn!(
                    target: "homelink.control",
                    device_id = %device_id,
                    reason = %err,
                    "device_authentication_failed"
                );
                Err(err.into())
            }
        }
    }

    /// 认领该设备全部待下发命令（FIFO）。
    pub async fn poll(&self, device: &DeviceRecord) -> Result<Vec<CommandRecord>, ControlError> {
        let now_ms = now_epoch_ms();
        let redeliver_before_ms = (self.config.redelivery_after_ms > 0).then(|| {
            let window_ms = i64::try_from(self.config.redelivery_after_ms).unwrap_or(i64::MAX);
            now_ms.saturating_sub(window_ms)
        });
        let claimed = self
            .command_store
            .claim_pending(&device.device_id, now_ms, redeliver_before_ms)
            .await?;
        if !claimed.is_empty() {
            record_commands_claimed(claimed.len() as u64);
            info!(
                target: "homelink.control",
                device_id = %device.device_id,
                count = claimed.len(),
                "commands_claimed"
            );
        }
        Ok(claimed)
    }

    /// 写入回执并结算关联审计。
    pub async fn ack(
        &self,
        device: &DeviceRecord,
        command_id: &str,
        outcome: AckOutcome,
        result: Option<Value>,
    ) -> Result<CommandRecord, ControlError> {
        let now_ms = now_epoch_ms();
        let written = self
            .command_store
            .acknowledge(&device.device_id, command_id, outcome, result.clone(), now_ms)
            .await?;
        let record = match written {
            AckWriteResult::Updated(record) => record,
            AckWriteResult::Conflict(record) => {
                warn!(
                    target: "homelink.control",
                    device_id = %device.device_id,
                    command_id = %command_id,
                    status = %record.status.as_str(),
                    "command_ack_conflict"
                );
                return Err(ControlError::Conflict(format!(
                    "command already {}",
                    record.status.as_str()
                )));
            }
            AckWriteResult::Missing => {
                return Err(ControlError::NotFound("command not found".to_string()));
            }
        };
        record_command_acknowledged();
        info!(
            target: "homelink.control",
            device_id = %device.device_id,
            command_id = %record.command_id,
            status = %record.status.as_str(),
            "command_acknowledged"
        );

        match self
            .audit
            .resolve_command(&record.command_id, outcome, result.as_ref(), now_ms)
            .await
        {
            // `None`：重复回执，或下发时审计写入失败。
            Ok(_) => {}
            Err(err) => {
                record_audit_write_failure();
                warn!(
                    target: "homelink.control",
                    command_id = %record.command_id,
                    error = %err,
                    "audit_write_failed"
                );
            }
        }
        Ok(record)
    }

    /// 设备自报日志。
    pub async fn self_log(
        &self,
        device: &DeviceRecord,
        entry: SelfLogEntry,
        meta: &RequestMeta,
    ) -> Result<AuditLogRecord, ControlError> {
        let record = self
            .audit
            .record_self_log(&device.device_id, entry, meta, now_epoch_ms())
            .await?;
        info!(
            target: "homelink.control",
            device_id = %record.device_id,
            log_id = %record.audit_id,
            action_type = %record.action_type.as_str(),
            "device_log_recorded"
        );
        Ok(record)
    }
}
