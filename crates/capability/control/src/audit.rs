//! 审计记录：下发时写 pending，回执时结算一次，设备自报独立成条。

use crate::{ControlError, RequestMeta};
use domain::{
    AckOutcome, ActionSource, AuditActionType, AuditResultStatus, CORRELATION_KEY, ControlAction,
    Identity,
};
use homelink_storage::{
    AuditLogFilter, AuditLogRecord, AuditLogStore, AuditResolution, StorageError,
};
use serde_json::{Map, Value, json};
use std::sync::Arc;

const DEFAULT_PAGE_LIMIT: i64 = 50;
const MAX_PAGE_LIMIT: i64 = 200;

/// 设备自报日志。
#[derive(Debug, Clone, Default)]
pub struct SelfLogEntry {
    pub action_type: Option<String>,
    pub details: Option<Value>,
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub source: Option<String>,
    pub result_status: Option<String>,
    pub result_message: Option<String>,
    pub result_error_code: Option<String>,
}

/// 审计查询条件（未解析的外部输入）。
#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub device_id: Option<String>,
    pub action_type: Option<String>,
    pub user_id: Option<String>,
    pub source: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// 分页查询结果。
#[derive(Debug, Clone)]
pub struct AuditListing {
    pub items: Vec<AuditLogRecord>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl AuditListing {
    pub fn total_pages(&self) -> i64 {
        if self.limit <= 0 {
            return 0;
        }
        (self.total + self.limit - 1) / self.limit
    }
}

pub struct AuditRecorder {
    store: Arc<dyn AuditLogStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditLogStore>) -> Self {
        Self { store }
    }

    /// 为刚入队的命令写一条 pending 审计，`details.commandId` 为关联键。
    pub async fn record_submission(
        &self,
        identity: &Identity,
        device_id: &str,
        action: &ControlAction,
        command_id: &str,
        meta: &RequestMeta,
        now_ms: i64,
    ) -> Result<AuditLogRecord, StorageError> {
        let mut details = Map::new();
        details.insert("action".to_string(), Value::from(action.name()));
        details.insert("parameters".to_string(), action.to_payload());
        details.insert(CORRELATION_KEY.to_string(), Value::from(command_id));
        let record = AuditLogRecord {
            audit_id: uuid::Uuid::new_v4().to_string(),
            action_type: action.audit_action_type(),
            device_id: device_id.to_string(),
            performed_by_user_id: Some(identity.user_id.clone()),
            performed_by_username: Some(identity.username.clone()),
            source: ActionSource::App,
            details: Value::Object(details),
            result_status: AuditResultStatus::Pending,
            result_message: None,
            result_error_code: None,
            ip_address: meta.ip_address.clone(),
            metadata: request_metadata(meta),
            created_at_ms: now_ms,
        };
        self.store.create_audit_log(record).await
    }

    /// 按回执结算关联审计；已结算或无关联记录时返回 `None`。
    pub async fn resolve_command(
        &self,
        command_id: &str,
        outcome: AckOutcome,
        result: Option<&Value>,
        now_ms: i64,
    ) -> Result<Option<AuditLogRecord>, StorageError> {
        let (status, default_message) = match outcome {
            AckOutcome::Done => (AuditResultStatus::Success, "Command executed successfully"),
            AckOutcome::Failed => (AuditResultStatus::Failed, "Command execution failed"),
        };
        let message = result
            .and_then(|value| value.get("message"))
            .and_then(Value::as_str)
            .unwrap_or(default_message)
            .to_string();
        self.store
            .resolve_by_command(
                command_id,
                AuditResolution {
                    status,
                    message: Some(message),
                    acknowledged_at_ms: now_ms,
                },
            )
            .await
    }

    /// 设备自报日志，不关联任何命令。
    pub async fn record_self_log(
        &self,
        device_id: &str,
        entry: SelfLogEntry,
        meta: &RequestMeta,
        now_ms: i64,
    ) -> Result<AuditLogRecord, ControlError> {
        let action_type = entry
            .action_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ControlError::Validation("actionType is required".to_string()))?;
        let action_type = AuditActionType::parse(action_type)
            .ok_or_else(|| ControlError::Validation(format!("invalid actionType: {action_type}")))?;
        let source = match entry.source.as_deref() {
            None => ActionSource::System,
            Some(value) => ActionSource::parse(value)
                .ok_or_else(|| ControlError::Validation(format!("invalid source: {value}")))?,
        };
        let result_status = match entry.result_status.as_deref() {
            None => AuditResultStatus::Success,
            Some(value) => AuditResultStatus::parse(value).ok_or_else(|| {
                ControlError::Validation(format!("invalid result status: {value}"))
            })?,
        };
        let record = AuditLogRecord {
            audit_id: uuid::Uuid::new_v4().to_string(),
            action_type,
            device_id: device_id.to_string(),
            performed_by_user_id: entry.user_id,
            performed_by_username: entry.username,
            source,
            details: entry.details.unwrap_or_else(|| json!({})),
            result_status,
            result_message: entry.result_message,
            result_error_code: entry.result_error_code,
            ip_address: meta.ip_address.clone(),
            metadata: request_metadata(meta),
            created_at_ms: now_ms,
        };
        Ok(self.store.create_audit_log(record).await?)
    }

    /// 分页查询；非管理员只能看到自己的记录。
    pub async fn list(
        &self,
        identity: &Identity,
        query: AuditQuery,
    ) -> Result<AuditListing, ControlError> {
        let action_type = match query.action_type.as_deref() {
            None => None,
            Some(value) => Some(AuditActionType::parse(value).ok_or_else(|| {
                ControlError::Validation(format!("invalid actionType: {value}"))
            })?),
        };
        let source = match query.source.as_deref() {
            None => None,
            Some(value) => Some(
                ActionSource::parse(value)
                    .ok_or_else(|| ControlError::Validation(format!("invalid source: {value}")))?,
            ),
        };
        let user_id = if identity.is_admin() {
            query.user_id
        } else {
            Some(identity.user_id.clone())
        };
        let limit = query
            .limit
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        let page = query.page.filter(|value| *value > 0).unwrap_or(1);
        let filter = AuditLogFilter {
            device_id: query.device_id,
            action_type,
            user_id,
            source,
            from_ms: query.from_ms,
            to_ms: query.to_ms,
            limit,
            offset: (page - 1).saturating_mul(limit),
        };
        let found = self.store.list_audit_logs(&filter).await?;
        Ok(AuditListing {
            items: found.items,
            total: found.total,
            page,
            limit,
        })
    }

    pub async fn find(
        &self,
        identity: &Identity,
        audit_id: &str,
    ) -> Result<AuditLogRecord, ControlError> {
        let record = self
            .store
            .find_audit_log(audit_id)
            .await?
            .filter(|record| {
                identity.is_admin()
                    || record.performed_by_user_id.as_deref() == Some(identity.user_id.as_str())
            })
            .ok_or_else(|| ControlError::NotFound("action log not found".to_string()))?;
        Ok(record)
    }

    /// 删除早于 `cutoff_ms` 的记录。
    pub async fn purge_before(&self, cutoff_ms: i64) -> Result<u64, StorageError> {
        self.store.purge_before(cutoff_ms).await
    }
}

fn request_metadata(meta: &RequestMeta) -> Value {
    let mut metadata = Map::new();
    if let Some(user_agent) = meta.user_agent.as_deref() {
        metadata.insert("userAgent".to_string(), Value::from(user_agent));
    }
    Value::Object(metadata)
}
