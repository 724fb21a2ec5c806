//! 存储接口 Trait 定义
//!
//! 定义所有资源存储的异步接口：
//! - CommandStore：每设备 FIFO 命令队列
//! - DeviceStore：设备身份与静音状态
//! - AuditLogStore：操作审计日志
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 状态迁移（认领、回执、审计结算）在存储内部原子完成
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use crate::models::{
    AckWriteResult, AuditLogFilter, AuditLogPage, AuditLogRecord, AuditResolution, CommandRecord,
    DeviceRecord,
};
use async_trait::async_trait;
use domain::AckOutcome;

/// 命令队列接口
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// 入队一条 `pending` 命令
    async fn create_command(&self, record: CommandRecord) -> Result<CommandRecord, StorageError>;

    /// 原子认领设备的全部 `pending` 命令并标记为 `sent`
    ///
    /// 返回按创建时间升序排列的命令；并发调用不会认领到同一条命令。
    /// `redeliver_before_ms` 非空时，`sent_at` 早于该时刻且未回执的命令也会被重新认领。
    async fn claim_pending(
        &self,
        device_id: &str,
        now_ms: i64,
        redeliver_before_ms: Option<i64>,
    ) -> Result<Vec<CommandRecord>, StorageError>;

    /// 写入设备回执
    async fn acknowledge(
        &self,
        device_id: &str,
        command_id: &str,
        outcome: AckOutcome,
        result: Option<serde_json::Value>,
        now_ms: i64,
    ) -> Result<AckWriteResult, StorageError>;

    /// 按 ID 读取单条命令（仅测试与排障使用，业务链路不经过它）
    async fn find_command(&self, command_id: &str) -> Result<Option<CommandRecord>, StorageError>;
}

/// 设备存储接口
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceRecord>, StorageError>;

    /// 注册设备；设备 ID 已存在时返回冲突错误
    async fn create_device(&self, record: DeviceRecord) -> Result<DeviceRecord, StorageError>;

    /// 整体替换静音状态，设备不存在时返回 `None`
    async fn update_mute_state(
        &self,
        device_id: &str,
        muted_sensors: &[String],
        mute_ends_at_ms: Option<i64>,
    ) -> Result<Option<DeviceRecord>, StorageError>;
}

/// 审计日志存储接口
#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn create_audit_log(&self, record: AuditLogRecord)
    -> Result<AuditLogRecord, StorageError>;

    /// 按 `details.commandId` 结算一条仍为 `pending` 的审计记录
    ///
    /// 已结算或不存在时返回 `None`。
    async fn resolve_by_command(
        &self,
        command_id: &str,
        resolution: AuditResolution,
    ) -> Result<Option<AuditLogRecord>, StorageError>;

    async fn find_audit_log(&self, audit_id: &str) -> Result<Option<AuditLogRecord>, StorageError>;

    /// 按条件分页查询，按创建时间倒序
    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> Result<AuditLogPage, StorageError>;

    /// 删除创建时间早于 `cutoff_ms` 的记录，返回删除条数
    async fn purge_before(&self, cutoff_ms: i64) -> Result<u64, StorageError>;
}
