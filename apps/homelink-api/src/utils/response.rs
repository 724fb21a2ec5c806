//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：auth_error, forbidden_error, bad_request_error, not_found_error,
//!   conflict_error, internal_auth_error, storage_error, control_error
//! - DTO 转换：polled_command_to_dto, audit_log_to_dto, device_status_to_dto, registered_device_to_dto
//!
//! 失败响应统一使用 ApiResponse 错误体，成功响应保持设备固件依赖的扁平结构。

use api_contract::{
    ApiResponse, AuditLogDto, AuditResultView, DeviceStatusDto, PerformedByView,
    PolledCommandDto, RegisteredDeviceDto,
};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use homelink_auth::AuthError;
use homelink_control::{ControlError, MuteState};
use homelink_storage::{AuditLogRecord, CommandRecord, DeviceRecord, StorageError};
use tracing::error;

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 禁止访问错误响应（消息带上缺失的能力，便于排查）
pub fn forbidden_error(message: impl Into<String>) -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ApiResponse::<()>::error("AUTH.FORBIDDEN", message.into())),
    )
        .into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 资源未找到错误响应
pub fn not_found_error(message: impl Into<String>) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error("RESOURCE.NOT_FOUND", message.into())),
    )
        .into_response()
}

/// 状态冲突错误响应
pub fn conflict_error(message: impl Into<String>) -> Response {
    (
        StatusCode::CONFLICT,
        Json(ApiResponse::<()>::error("RESOURCE.CONFLICT", message.into())),
    )
        .into_response()
}

/// 认证内部错误响应
pub fn internal_auth_error(err: AuthError) -> Response {
    let message = err.to_string();
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 存储错误响应
pub fn storage_error(err: StorageError) -> Response {
    if err.is_conflict() {
        return conflict_error(err.to_string());
    }
    internal_error(err.to_string())
}

fn internal_error(message: String) -> Response {
    error!(target: "homelink.api", error = %message, "internal_error");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::error("INTERNAL.ERROR", message)),
    )
        .into_response()
}

/// 控制链路错误 → HTTP
pub fn control_error(err: ControlError) -> Response {
    match err {
        ControlError::Validation(message) => bad_request_error(message),
        ControlError::Authentication(_) => auth_error(StatusCode::UNAUTHORIZED),
        ControlError::Forbidden(denial) => forbidden_error(denial.to_string()),
        ControlError::NotFound(message) => not_found_error(message),
        ControlError::Conflict(message) => conflict_error(message),
        ControlError::Storage(message) => internal_error(message),
    }
}

/// `requestedBy` 给设备展示用，取下发时保存的用户名。
pub fn polled_command_to_dto(record: CommandRecord) -> PolledCommandDto {
    PolledCommandDto {
        command_id: record.command_id,
        action: record.action,
        requested_by: record.requested_by_username.or(record.requested_by),
    }
}

pub fn audit_log_to_dto(record: AuditLogRecord) -> AuditLogDto {
    AuditLogDto {
        log_id: record.audit_id,
        action_type: record.action_type.as_str().to_string(),
        device_id: record.device_id,
        performed_by: PerformedByView {
            user_id: record.performed_by_user_id,
            username: record.performed_by_username,
            source: record.source.as_str().to_string(),
        },
        details: record.details,
        result: AuditResultView {
            status: record.result_status.as_str().to_string(),
            message: record.result_message,
            error_code: record.result_error_code,
        },
        ip_address: record.ip_address,
        metadata: record.metadata,
        created_at: record.created_at_ms,
    }
}

/// 静音状态取当前生效值（过期即为空）。
pub fn device_status_to_dto(record: DeviceRecord, mute: MuteState) -> DeviceStatusDto {
    DeviceStatusDto {
        device_id: record.device_id,
        is_active: record.is_active,
        muted_sensors: mute.sensors,
        mute_ends_at: mute.ends_at_ms,
    }
}

/// 注册响应是唯一一次返回设备密钥的地方。
pub fn registered_device_to_dto(record: DeviceRecord) -> RegisteredDeviceDto {
    RegisteredDeviceDto {
        device_id: record.device_id,
        name: record.name,
        secret_key: record.secret_key,
    }
}
