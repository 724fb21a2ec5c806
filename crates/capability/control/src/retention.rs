//! 审计保留：定期删除超出保留期的记录。

use crate::audit::AuditRecorder;
use crate::now_epoch_ms;
use domain::MS_PER_DAY;
use homelink_storage::StorageError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// 删除早于 `now_ms - retention_days` 的审计记录。
pub async fn purge_expired_audit_logs(
    audit: &AuditRecorder,
    retention_days: u64,
    now_ms: i64,
) -> Result<u64, StorageError> {
    let horizon_ms = (retention_days as i64).saturating_mul(MS_PER_DAY);
    audit.purge_before(now_ms.saturating_sub(horizon_ms)).await
}

/// 启动后台清理任务；`interval_seconds` 为 0 时不启动。
pub fn spawn_audit_retention_task(
    audit: Arc<AuditRecorder>,
    retention_days: u64,
    interval_seconds: u64,
) -> Option<tokio::task::JoinHandle<()>> {
    if interval_seconds == 0 {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
        loop {
            ticker.tick().await;
            match purge_expired_audit_logs(&audit, retention_days, now_epoch_ms()).await {
                Ok(0) => {}
                Ok(deleted) => {
                    info!(
                        target: "homelink.control",
                        deleted = deleted,
                        retention_days = retention_days,
                        "audit_logs_purged"
                    );
                }
                Err(err) => {
                    warn!(
                        target: "homelink.control",
                        error = %err,
                        "audit_purge_failed"
                    );
                }
            }
        }
    }))
}
