//! Postgres 审计日志实现

use crate::error::StorageError;
use crate::models::{AuditLogFilter, AuditLogPage, AuditLogRecord, AuditResolution};
use crate::traits::AuditLogStore;
use domain::{ActionSource, AuditActionType, AuditResultStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgAuditLogStore {
    pub pool: PgPool,
}

impl PgAuditLogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const AUDIT_COLUMNS: &str = "audit_id, action_type, device_id, performed_by_user_id, \
     performed_by_username, source, details, result_status, result_message, \
     result_error_code, ip_address, metadata, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms";

const AUDIT_FILTER: &str = "($1::text is null or device_id = $1) \
     and ($2::text is null or action_type = $2) \
     and ($3::text is null or performed_by_user_id = $3) \
     and ($4::text is null or source = $4) \
     and ($5::double precision is null or created_at >= to_timestamp($5 / 1000.0)) \
     and ($6::double precision is null or created_at <= to_timestamp($6 / 1000.0))";

fn audit_from_row(row: &PgRow) -> Result<AuditLogRecord, StorageError> {
    let action_type: String = row.try_get("action_type")?;
    let source: String = row.try_get("source")?;
    let result_status: String = row.try_get("result_status")?;
    Ok(AuditLogRecord {
        audit_id: row.try_get("audit_id")?,
        action_type: AuditActionType::parse(&action_type)
            .ok_or_else(|| StorageError::new(format!("unknown action type: {action_type}")))?,
        device_id: row.try_get("device_id")?,
        performed_by_user_id: row.try_get("performed_by_user_id")?,
        performed_by_username: row.try_get("performed_by_username")?,
        source: ActionSource::parse(&source)
            .ok_or_else(|| StorageError::new(format!("unknown action source: {source}")))?,
        details: row.try_get("details")?,
        result_status: AuditResultStatus::parse(&result_status)
            .ok_or_else(|| StorageError::new(format!("unknown result status: {result_status}")))?,
        result_message: row.try_get("result_message")?,
        result_error_code: row.try_get("result_error_code")?,
        ip_address: row.try_get("ip_address")?,
        metadata: row.try_get("metadata")?,
        created_at_ms: row.try_get("created_at_ms")?,
    })
}

#[async_trait::async_trait]
impl AuditLogStore for PgAuditLogStore {
    async fn create_audit_log(
        &self,
        record: AuditLogRecord,
    ) -> Result<AuditLogRecord, StorageError> {
        sqlx::query(
            "insert into audit_logs \
             (audit_id, action_type, device_id, performed_by_user_id, performed_by_username, \
              source, details, result_status, result_message, result_error_code, ip_address, \
              metadata, created_at) \
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, to_timestamp($13 / 1000.0))",
        )
        .bind(&record.audit_id)
        .bind(record.action_type.as_str())
        .bind(&record.device_id)
        .bind(&record.performed_by_user_id)
        .bind(&record.performed_by_username)
        .bind(record.source.as_str())
        .bind(&record.details)
        .bind(record.result_status.as_str())
        .bind(&record.result_message)
        .bind(&record.result_error_code)
        .bind(&record.ip_address)
        .bind(&record.metadata)
        .bind(record.created_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn resolve_by_command(
        &self,
        command_id: &str,
        resolution: AuditResolution,
    ) -> Result<Option<AuditLogRecord>, StorageError> {
        let sql = format!(
            "update audit_logs set result_status = $2, result_message = $3, \
             metadata = (case when jsonb_typeof(metadata) = 'object' then metadata else '{{}}'::jsonb end) \
                 || jsonb_build_object('acknowledgedAt', $4::bigint) \
             where audit_id = ( \
                 select audit_id from audit_logs \
                 where details->>'commandId' = $1 and result_status = 'pending' \
                 order by created_at \
                 limit 1 \
                 for update skip locked \
             ) \
             returning {AUDIT_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(command_id)
            .bind(resolution.status.as_str())
            .bind(&resolution.message)
            .bind(resolution.acknowledged_at_ms)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(audit_from_row).transpose()
    }

    async fn find_audit_log(&self, audit_id: &str) -> Result<Option<AuditLogRecord>, StorageError> {
        let sql = format!("select {AUDIT_COLUMNS} from audit_logs where audit_id = $1");
        let row = sqlx::query(&sql)
            .bind(audit_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(audit_from_row).transpose()
    }

    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> Result<AuditLogPage, StorageError> {
        let action_type = filter.action_type.map(|value| value.as_str());
        let source = filter.source.map(|value| value.as_str());
        let from = filter.from_ms.map(|value| value as f64);
        let to = filter.to_ms.map(|value| value as f64);

        let count_sql = format!("select count(*) as total from audit_logs where {AUDIT_FILTER}");
        let total: i64 = sqlx::query(&count_sql)
            .bind(&filter.device_id)
            .bind(action_type)
            .bind(&filter.user_id)
            .bind(source)
            .bind(from)
            .bind(to)
            .fetch_one(&self.pool)
            .await?
            .try_get("total")?;

        let list_sql = format!(
            "select {AUDIT_COLUMNS} from audit_logs where {AUDIT_FILTER} \
             order by created_at desc \
             limit $7 offset $8"
        );
        let rows = sqlx::query(&list_sql)
            .bind(&filter.device_id)
            .bind(action_type)
            .bind(&filter.user_id)
            .bind(source)
            .bind(from)
            .bind(to)
            .bind(filter.limit.max(0))
            .bind(filter.offset.max(0))
            .fetch_all(&self.pool)
            .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(audit_from_row(row)?);
        }
        Ok(AuditLogPage { items, total })
    }

    async fn purge_before(&self, cutoff_ms: i64) -> Result<u64, StorageError> {
        let result = sqlx::query("delete from audit_logs where created_at < to_timestamp($1 / 1000.0)")
            .bind(cutoff_ms as f64)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
