//! 审计日志内存实现
//!
//! 仅用于本地测试和占位。

use crate::error::StorageError;
use crate::models::{AuditLogFilter, AuditLogPage, AuditLogRecord, AuditResolution};
use crate::traits::AuditLogStore;
use domain::AuditResultStatus;
use std::sync::RwLock;

/// 审计日志内存存储
pub struct InMemoryAuditLogStore {
    logs: RwLock<Vec<AuditLogRecord>>,
}

impl InMemoryAuditLogStore {
    /// 创建新的审计日志存储
    pub fn new() -> Self {
        Self {
            logs: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryAuditLogStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 把回执时间合并进 metadata（非对象 metadata 会被替换）。
pub(crate) fn merge_acknowledged_at(metadata: &mut serde_json::Value, acknowledged_at_ms: i64) {
    if !metadata.is_object() {
        *metadata = serde_json::Value::Object(serde_json::Map::new());
    }
    if let Some(object) = metadata.as_object_mut() {
        object.insert(
            "acknowledgedAt".to_string(),
            serde_json::Value::from(acknowledged_at_ms),
        );
    }
}

#[async_trait::async_trait]
impl AuditLogStore for InMemoryAuditLogStore {
    async fn create_audit_log(
        &self,
        record: AuditLogRecord,
    ) -> Result<AuditLogRecord, StorageError> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        logs.push(record.clone());
        Ok(record)
    }

    async fn resolve_by_command(
        &self,
        command_id: &str,
        resolution: AuditResolution,
    ) -> Result<Option<AuditLogRecord>, StorageError> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = logs.iter_mut().find(|item| {
            item.result_status == AuditResultStatus::Pending
                && item.command_id() == Some(command_id)
        }) else {
            return Ok(None);
        };
        record.result_status = resolution.status;
        record.result_message = resolution.message;
        merge_acknowledged_at(&mut record.metadata, resolution.acknowledged_at_ms);
        Ok(Some(record.clone()))
    }

    async fn find_audit_log(&self, audit_id: &str) -> Result<Option<AuditLogRecord>, StorageError> {
        let logs = self
            .logs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(logs.iter().find(|item| item.audit_id == audit_id).cloned())
    }

    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> Result<AuditLogPage, StorageError> {
        let logs = self
            .logs
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut matched: Vec<AuditLogRecord> = logs
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        // 同一毫秒内后写入的排在前面。
        matched.reverse();
        matched.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        let total = matched.len() as i64;
        let items = matched
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect();
        Ok(AuditLogPage { items, total })
    }

    async fn purge_before(&self, cutoff_ms: i64) -> Result<u64, StorageError> {
        let mut logs = self
            .logs
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let before = logs.len();
        logs.retain(|record| record.created_at_ms >= cutoff_ms);
        Ok((before - logs.len()) as u64)
    }
}
