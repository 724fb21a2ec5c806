//! 审计记录分类。

use serde::{Deserialize, Serialize};

/// 审计记录保留天数，超过即可被自动清理。
pub const AUDIT_RETENTION_DAYS: u64 = 180;

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// 审计详情中关联命令 ID 的键。
pub const CORRELATION_KEY: &str = "commandId";

/// 审计动作类型（封闭集合，`other` 兜底）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditActionType {
    ChangePassword,
    ControlDevice,
    SetSnooze,
    CancelSnooze,
    DoorOpen,
    DoorClose,
    AlarmTrigger,
    SystemModeChange,
    Other,
}

impl AuditActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditActionType::ChangePassword => "change_password",
            AuditActionType::ControlDevice => "control_device",
            AuditActionType::SetSnooze => "set_snooze",
            AuditActionType::CancelSnooze => "cancel_snooze",
            AuditActionType::DoorOpen => "door_open",
            AuditActionType::DoorClose => "door_close",
            AuditActionType::AlarmTrigger => "alarm_trigger",
            AuditActionType::SystemModeChange => "system_mode_change",
            AuditActionType::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "change_password" => Some(AuditActionType::ChangePassword),
            "control_device" => Some(AuditActionType::ControlDevice),
            "set_snooze" => Some(AuditActionType::SetSnooze),
            "cancel_snooze" => Some(AuditActionType::CancelSnooze),
            "door_open" => Some(AuditActionType::DoorOpen),
            "door_close" => Some(AuditActionType::DoorClose),
            "alarm_trigger" => Some(AuditActionType::AlarmTrigger),
            "system_mode_change" => Some(AuditActionType::SystemModeChange),
            "other" => Some(AuditActionType::Other),
            _ => None,
        }
    }
}

/// 动作来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionSource {
    App,
    Keypad,
    System,
    Remote,
    Schedule,
}

impl ActionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionSource::App => "app",
            ActionSource::Keypad => "keypad",
            ActionSource::System => "system",
            ActionSource::Remote => "remote",
            ActionSource::Schedule => "schedule",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "app" => Some(ActionSource::App),
            "keypad" => Some(ActionSource::Keypad),
            "system" => Some(ActionSource::System),
            "remote" => Some(ActionSource::Remote),
            "schedule" => Some(ActionSource::Schedule),
            _ => None,
        }
    }
}

/// 审计结果状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResultStatus {
    Success,
    Failed,
    Pending,
}

impl AuditResultStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResultStatus::Success => "success",
            AuditResultStatus::Failed => "failed",
            AuditResultStatus::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(AuditResultStatus::Success),
            "failed" => Some(AuditResultStatus::Failed),
            "pending" => Some(AuditResultStatus::Pending),
            _ => None,
        }
    }
}
