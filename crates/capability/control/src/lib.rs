//! 控制链路：操作员下发、设备轮询/回执/自报日志、审计记录与保留清理。
//!
//! 命令先入队后写审计；审计写入失败只记日志，不回滚已入队的命令。

mod audit;
mod gateway;
mod mute;
mod retention;
mod service;

use domain::ActionError;
use homelink_auth::{DeviceAuthError, Denial};
use homelink_storage::StorageError;

pub use audit::{AuditListing, AuditQuery, AuditRecorder, SelfLogEntry};
pub use gateway::DeviceGateway;
pub use mute::MuteState;
pub use retention::{purge_expired_audit_logs, spawn_audit_retention_task};
pub use service::{ControlService, DeviceRegistration};

/// 控制链路错误。
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Authentication(String),
    #[error(transparent)]
    Forbidden(#[from] Denial),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StorageError> for ControlError {
    fn from(err: StorageError) -> Self {
        if err.is_conflict() {
            ControlError::Conflict(err.to_string())
        } else {
            ControlError::Storage(err.to_string())
        }
    }
}

impl From<ActionError> for ControlError {
    fn from(err: ActionError) -> Self {
        match err {
            ActionError::Unknown(name) => ControlError::Forbidden(Denial::UnknownAction(name)),
            other => ControlError::Validation(other.to_string()),
        }
    }
}

impl From<DeviceAuthError> for ControlError {
    fn from(err: DeviceAuthError) -> Self {
        match err {
            DeviceAuthError::DeviceNotFound => ControlError::NotFound(err.to_string()),
            DeviceAuthError::Storage(err) => ControlError::Storage(err.to_string()),
            other => ControlError::Authentication(other.to_string()),
        }
    }
}

/// 请求来源信息（写入审计）。
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// 控制链路配置。
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// `set_snooze` 未带时长时的默认秒数，也是取消单个传感器后剩余静音的续期时长
    pub snooze_default_seconds: u64,
    /// `sent` 超过该时长仍未回执则重新下发；0 关闭
    pub redelivery_after_ms: u64,
    pub audit_retention_days: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            snooze_default_seconds: domain::DEFAULT_SNOOZE_SECONDS,
            redelivery_after_ms: 0,
            audit_retention_days: domain::AUDIT_RETENTION_DAYS,
        }
    }
}

pub(crate) fn now_epoch_ms() -> i64 {
    let now = std::time::SystemTime::now();
    let duration = now
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    duration.as_millis() as i64
}
