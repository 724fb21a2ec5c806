//! 设备侧 handlers（HMAC 签名认证）
//!
//! - GET /devices/{device_id}/commands
//! - POST /devices/{device_id}/commands/{command_id}/ack
//! - POST /devices/{device_id}/log
//!
//! 请求体以原始字节接收：签名按传输字节校验通过后才解析 JSON。

use crate::AppState;
use crate::middleware::{authenticate_device, request_meta};
use crate::utils::response::{control_error, polled_command_to_dto};
use crate::utils::validation::parse_device_body;
use api_contract::{AckRequest, AckResponse, DeviceLogRequest, DeviceLogResponse, PollResponse};
use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::AckOutcome;
use homelink_control::SelfLogEntry;
use std::net::SocketAddr;

#[derive(serde::Deserialize)]
pub struct CommandPath {
    device_id: String,
    command_id: String,
}

/// 认领并返回全部待执行命令（FIFO）
pub async fn poll_commands(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let device = match authenticate_device(&state, &device_id, &headers, &body).await {
        Ok(device) => device,
        Err(response) => return response,
    };
    match state.gateway.poll(&device).await {
        Ok(commands) => (
            StatusCode::OK,
            Json(PollResponse {
                commands: commands.into_iter().map(polled_command_to_dto).collect(),
            }),
        )
            .into_response(),
        Err(err) => control_error(err),
    }
}

/// 命令执行回执
pub async fn ack_command(
    State(state): State<AppState>,
    Path(path): Path<CommandPath>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let device = match authenticate_device(&state, &path.device_id, &headers, &body).await {
        Ok(device) => device,
        Err(response) => return response,
    };
    let request: AckRequest = match parse_device_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let outcome = AckOutcome::from_wire(request.status.as_deref());
    match state
        .gateway
        .ack(&device, &path.command_id, outcome, request.result)
        .await
    {
        Ok(command) => (
            StatusCode::OK,
            Json(AckResponse {
                status: "ok".to_string(),
                command_id: command.command_id,
                new_status: command.status.as_str().to_string(),
            }),
        )
            .into_response(),
        Err(err) => control_error(err),
    }
}

/// 设备自报日志
pub async fn device_log(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Response {
    let device = match authenticate_device(&state, &device_id, &headers, &body).await {
        Ok(device) => device,
        Err(response) => return response,
    };
    let request: DeviceLogRequest = match parse_device_body(&body) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let performed_by = request.performed_by.unwrap_or_default();
    let result = request.result.unwrap_or_default();
    let entry = SelfLogEntry {
        action_type: request.action_type,
        details: request.details,
        user_id: performed_by.user_id,
        username: performed_by.username,
        source: performed_by.source,
        result_status: result.status,
        result_message: result.message,
        result_error_code: result.error_code,
    };
    match state
        .gateway
        .self_log(
            &device,
            entry,
            &request_meta(&headers, peer.map(|ConnectInfo(addr)| addr)),
        )
        .await
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(DeviceLogResponse {
                status: "ok".to_string(),
                log_id: record.audit_id,
            }),
        )
            .into_response(),
        Err(err) => control_error(err),
    }
}
