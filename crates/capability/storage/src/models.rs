//! 数据模型
//!
//! 定义所有存储相关的数据模型：
//! - 命令模型：CommandRecord、AckWriteResult
//! - 设备模型：DeviceRecord
//! - 审计模型：AuditLogRecord、AuditResolution、AuditLogFilter、AuditLogPage
//!
//! 时间统一使用毫秒级 epoch（`*_ms`）。

use domain::{
    ActionSource, AuditActionType, AuditResultStatus, CORRELATION_KEY, CommandStatus,
};

/// 控制命令记录。
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    pub command_id: String,
    pub device_id: String,
    /// 结构化动作 `{name, ...params}`
    pub action: serde_json::Value,
    pub requested_by: Option<String>,
    /// 创建时冗余保存的展示名，不随账号改名变化
    pub requested_by_username: Option<String>,
    pub status: CommandStatus,
    /// FIFO 排序键
    pub created_at_ms: i64,
    /// 最近一次被认领的时间
    pub sent_at_ms: Option<i64>,
    /// 首次回执时间，只写一次
    pub delivered_at_ms: Option<i64>,
    pub result: Option<serde_json::Value>,
}

/// 回执写入结果。
#[derive(Debug, Clone, PartialEq)]
pub enum AckWriteResult {
    /// 状态已推进（或幂等重放）。
    Updated(CommandRecord),
    /// 命令已处于不同的终态。
    Conflict(CommandRecord),
    /// 该设备下不存在此命令。
    Missing,
}

/// 设备记录。
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRecord {
    pub device_id: String,
    pub name: String,
    pub secret_key: String,
    pub is_active: bool,
    /// 传感器标签集合，或哨兵值 `all`
    pub muted_sensors: Vec<String>,
    pub mute_ends_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

/// 审计日志记录。
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogRecord {
    pub audit_id: String,
    pub action_type: AuditActionType,
    pub device_id: String,
    pub performed_by_user_id: Option<String>,
    pub performed_by_username: Option<String>,
    pub source: ActionSource,
    pub details: serde_json::Value,
    pub result_status: AuditResultStatus,
    pub result_message: Option<String>,
    pub result_error_code: Option<String>,
    pub ip_address: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at_ms: i64,
}

impl AuditLogRecord {
    /// `details` 中的关联命令 ID。
    pub fn command_id(&self) -> Option<&str> {
        self.details.get(CORRELATION_KEY).and_then(|value| value.as_str())
    }
}

/// 回执到达后对审计记录的一次性更新。
#[derive(Debug, Clone)]
pub struct AuditResolution {
    pub status: AuditResultStatus,
    pub message: Option<String>,
    pub acknowledged_at_ms: i64,
}

/// 审计日志查询条件。
#[derive(Debug, Clone, Default)]
pub struct AuditLogFilter {
    pub device_id: Option<String>,
    pub action_type: Option<AuditActionType>,
    pub user_id: Option<String>,
    pub source: Option<ActionSource>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub limit: i64,
    pub offset: i64,
}

impl AuditLogFilter {
    pub fn matches(&self, record: &AuditLogRecord) -> bool {
        if let Some(device_id) = self.device_id.as_deref() {
            if record.device_id != device_id {
                return false;
            }
        }
        if let Some(action_type) = self.action_type {
            if record.action_type != action_type {
                return false;
            }
        }
        if let Some(user_id) = self.user_id.as_deref() {
            if record.performed_by_user_id.as_deref() != Some(user_id) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if record.source != source {
                return false;
            }
        }
        if let Some(from) = self.from_ms {
            if record.created_at_ms < from {
                return false;
            }
        }
        if let Some(to) = self.to_ms {
            if record.created_at_ms > to {
                return false;
            }
        }
        true
    }
}

/// 审计日志分页结果。
#[derive(Debug, Clone)]
pub struct AuditLogPage {
    pub items: Vec<AuditLogRecord>,
    pub total: i64,
}
