//! 命令队列内存实现
//!
//! 认领与回执都在同一把写锁内完成，保证同一命令不会被两次认领。

use crate::error::StorageError;
use crate::models::{AckWriteResult, CommandRecord};
use crate::traits::CommandStore;
use crate::validation::{ensure_command_id, ensure_device_id};
use domain::{AckOutcome, CommandStatus};
use std::sync::RwLock;

/// 命令内存存储
pub struct InMemoryCommandStore {
    commands: RwLock<Vec<CommandRecord>>,
}

impl InMemoryCommandStore {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryCommandStore {
    fn default() -> Self {
        Self::new()
    }
}

fn is_claimable(record: &CommandRecord, redeliver_before_ms: Option<i64>) -> bool {
    match record.status {
        CommandStatus::Pending => true,
        CommandStatus::Sent => match (redeliver_before_ms, record.sent_at_ms) {
            (Some(before), Some(sent_at)) => sent_at < before,
            _ => false,
        },
        _ => false,
    }
}

#[async_trait::async_trait]
impl CommandStore for InMemoryCommandStore {
    async fn create_command(&self, record: CommandRecord) -> Result<CommandRecord, StorageError> {
        ensure_device_id(&record.device_id)?;
        ensure_command_id(&record.command_id)?;
        let mut commands = self
            .commands
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        if commands
            .iter()
            .any(|item| item.command_id == record.command_id)
        {
            return Err(StorageError::conflict("command already exists"));
        }
        commands.push(record.clone());
        Ok(record)
    }

    async fn claim_pending(
        &self,
        device_id: &str,
        now_ms: i64,
        redeliver_before_ms: Option<i64>,
    ) -> Result<Vec<CommandRecord>, StorageError> {
        ensure_device_id(device_id)?;
        let mut commands = self
            .commands
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut claimed = Vec::new();
        for record in commands.iter_mut() {
            if record.device_id != device_id || !is_claimable(record, redeliver_before_ms) {
                continue;
            }
            record.status = CommandStatus::Sent;
            record.sent_at_ms = Some(now_ms);
            claimed.push(record.clone());
        }
        // 插入顺序即创建顺序，稳定排序保留同一毫秒内的先后。
        claimed.sort_by_key(|record| record.created_at_ms);
        Ok(claimed)
    }

    async fn acknowledge(
        &self,
        device_id: &str,
        command_id: &str,
        outcome: AckOutcome,
        result: Option<serde_json::Value>,
        now_ms: i64,
    ) -> Result<AckWriteResult, StorageError> {
        ensure_device_id(device_id)?;
        ensure_command_id(command_id)?;
        let mut commands = self
            .commands
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(record) = commands
            .iter_mut()
            .find(|item| item.command_id == command_id && item.device_id == device_id)
        else {
            return Ok(AckWriteResult::Missing);
        };
        if !record.status.accepts_ack(outcome) {
            return Ok(AckWriteResult::Conflict(record.clone()));
        }
        if record.status.is_terminal() {
            return Ok(AckWriteResult::Updated(record.clone()));
        }
        record.status = outcome.status();
        record.result = result;
        if record.delivered_at_ms.is_none() {
            record.delivered_at_ms = Some(now_ms);
        }
        Ok(AckWriteResult::Updated(record.clone()))
    }

    async fn find_command(&self, command_id: &str) -> Result<Option<CommandRecord>, StorageError> {
        let commands = self
            .commands
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(commands
            .iter()
            .find(|item| item.command_id == command_id)
            .cloned())
    }
}
