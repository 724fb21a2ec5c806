//! Postgres 命令队列实现

use crate::error::StorageError;
use crate::models::{AckWriteResult, CommandRecord};
use crate::traits::CommandStore;
use crate::validation::{ensure_command_id, ensure_device_id};
use domain::{AckOutcome, CommandStatus};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct PgCommandStore {
    pub pool: PgPool,
}

impl PgCommandStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COMMAND_COLUMNS: &str = "command_id, seq, device_id, action, requested_by, \
     requested_by_username, status, \
     (extract(epoch from created_at) * 1000)::bigint as created_at_ms, \
     (extract(epoch from sent_at) * 1000)::bigint as sent_at_ms, \
     (extract(epoch from delivered_at) * 1000)::bigint as delivered_at_ms, \
     result";

fn command_from_row(row: &PgRow) -> Result<CommandRecord, StorageError> {
    let status: String = row.try_get("status")?;
    let status = CommandStatus::parse(&status)
        .ok_or_else(|| StorageError::new(format!("unknown command status: {status}")))?;
    Ok(CommandRecord {
        command_id: row.try_get("command_id")?,
        device_id: row.try_get("device_id")?,
        action: row.try_get("action")?,
        requested_by: row.try_get("requested_by")?,
        requested_by_username: row.try_get("requested_by_username")?,
        status,
        created_at_ms: row.try_get("created_at_ms")?,
        sent_at_ms: row.try_get("sent_at_ms")?,
        delivered_at_ms: row.try_get("delivered_at_ms")?,
        result: row.try_get("result")?,
    })
}

#[async_trait::async_trait]
impl CommandStore for PgCommandStore {
    async fn create_command(&self, record: CommandRecord) -> Result<CommandRecord, StorageError> {
        ensure_device_id(&record.device_id)?;
        ensure_command_id(&record.command_id)?;
        sqlx::query(
            "insert into commands \
             (command_id, device_id, action, requested_by, requested_by_username, status, created_at) \
             values ($1, $2, $3, $4, $5, $6, to_timestamp($7 / 1000.0))",
        )
        .bind(&record.command_id)
        .bind(&record.device_id)
        .bind(&record.action)
        .bind(&record.requested_by)
        .bind(&record.requested_by_username)
        .bind(record.status.as_str())
        .bind(record.created_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn claim_pending(
        &self,
        device_id: &str,
        now_ms: i64,
        redeliver_before_ms: Option<i64>,
    ) -> Result<Vec<CommandRecord>, StorageError> {
        ensure_device_id(device_id)?;
        // skip locked：并发轮询各自认领不相交的行。
        let sql = format!(
            "with claimable as ( \
                 select command_id as claimed_id from commands \
                 where device_id = $1 \
                 and (status = 'pending' \
                      or ($3::double precision is not null \
                          and status = 'sent' \
                          and sent_at < to_timestamp($3 / 1000.0))) \
                 order by created_at, seq \
                 for update skip locked \
             ) \
             update commands set status = 'sent', sent_at = to_timestamp($2 / 1000.0) \
             from claimable where commands.command_id = claimable.claimed_id \
             returning {COMMAND_COLUMNS}"
        );
        let rows = sqlx::query(&sql)
            .bind(device_id)
            .bind(now_ms as f64)
            .bind(redeliver_before_ms.map(|value| value as f64))
            .fetch_all(&self.pool)
            .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let seq: i64 = row.try_get("seq")?;
            items.push((command_from_row(row)?, seq));
        }
        // returning 不保证顺序。
        items.sort_by_key(|(record, seq)| (record.created_at_ms, *seq));
        Ok(items.into_iter().map(|(record, _)| record).collect())
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
        let sql = format!(
            "update commands set status = $3, result = $4, \
             delivered_at = coalesce(delivered_at, to_timestamp($5 / 1000.0)) \
             where command_id = $1 and device_id = $2 and status in ('pending', 'sent') \
             returning {COMMAND_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(command_id)
            .bind(device_id)
            .bind(outcome.status().as_str())
            .bind(&result)
            .bind(now_ms as f64)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = row {
            return Ok(AckWriteResult::Updated(command_from_row(&row)?));
        }

        // 未更新：命令不存在，或已处于终态。
        let sql = format!(
            "select {COMMAND_COLUMNS} from commands where command_id = $1 and device_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(command_id)
            .bind(device_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(AckWriteResult::Missing);
        };
        let record = command_from_row(&row)?;
        if record.status.accepts_ack(outcome) {
            Ok(AckWriteResult::Updated(record))
        } else {
            Ok(AckWriteResult::Conflict(record))
        }
    }

    async fn find_command(&self, command_id: &str) -> Result<Option<CommandRecord>, StorageError> {
        let sql = format!("select {COMMAND_COLUMNS} from commands where command_id = $1");
        let row = sqlx::query(&sql)
            .bind(command_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(command_from_row).transpose()
    }
}
