//! 追踪、请求 ID 生成与进程内计数器。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 计数器快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub commands_enqueued: u64,
    pub commands_claimed: u64,
    pub commands_acknowledged: u64,
    pub signature_rejections: u64,
    pub authorization_denials: u64,
    pub audit_write_failures: u64,
}

/// 进程内计数器。
pub struct TelemetryMetrics {
    commands_enqueued: AtomicU64,
    commands_claimed: AtomicU64,
    commands_acknowledged: AtomicU64,
    signature_rejections: AtomicU64,
    authorization_denials: AtomicU64,
    audit_write_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            commands_enqueued: AtomicU64::new(0),
            commands_claimed: AtomicU64::new(0),
            commands_acknowledged: AtomicU64::new(0),
            signature_rejections: AtomicU64::new(0),
            authorization_denials: AtomicU64::new(0),
            audit_write_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            commands_enqueued: self.commands_enqueued.load(Ordering::Relaxed),
            commands_claimed: self.commands_claimed.load(Ordering::Relaxed),
            commands_acknowledged: self.commands_acknowledged.load(Ordering::Relaxed),
            signature_rejections: self.signature_rejections.load(Ordering::Relaxed),
            authorization_denials: self.authorization_denials.load(Ordering::Relaxed),
            audit_write_failures: self.audit_write_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录命令入队次数。
pub fn record_command_enqueued() {
    metrics().commands_enqueued.fetch_add(1, Ordering::Relaxed);
}

/// 记录轮询认领的命令条数。
pub fn record_commands_claimed(count: u64) {
    metrics().commands_claimed.fetch_add(count, Ordering::Relaxed);
}

/// 记录设备回执次数（含幂等重放）。
pub fn record_command_acknowledged() {
    metrics()
        .commands_acknowledged
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录设备签名校验失败次数。
pub fn record_signature_rejection() {
    metrics()
        .signature_rejections
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录授权拒绝次数。
pub fn record_authorization_denial() {
    metrics()
        .authorization_denials
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录审计写入失败次数（命令已入队）。
pub fn record_audit_write_failure() {
    metrics()
        .audit_write_failures
        .fetch_add(1, Ordering::Relaxed);
}
