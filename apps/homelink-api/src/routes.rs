//! 路由定义
//!
//! - 健康检查与指标：/health, /metrics
//! - 设备管理：/devices, /devices/{id}/status
//! - 操作员控制：/devices/{id}/control
//! - 设备轮询/回执/自报日志：/devices/{id}/commands, /devices/{id}/commands/{cid}/ack, /devices/{id}/log
//! - 审计日志：/action-logs, /action-logs/{id}

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route("/devices", post(register_device))
        .route("/devices/:device_id/status", get(get_device_status))
        .route("/devices/:device_id/control", post(control_device))
        .route("/devices/:device_id/commands", get(poll_commands))
        .route(
            "/devices/:device_id/commands/:command_id/ack",
            post(ack_command),
        )
        .route("/devices/:device_id/log", post(device_log))
        .route(
            "/action-logs",
            get(list_action_logs).delete(purge_action_logs),
        )
        .route("/action-logs/:log_id", get(get_action_log))
}
