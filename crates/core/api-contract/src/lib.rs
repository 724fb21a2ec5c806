//! 稳定的 DTO 与 API 响应契约。
//!
//! 设备侧接口（轮询/回执/日志）的成功响应保持固件依赖的扁平结构；
//! 所有失败响应统一使用 [`ApiResponse::error`] 封装。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

// ============================================================================
// 操作员控制
// ============================================================================

/// 控制请求已受理（202）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlAcceptedResponse {
    pub status: String,
    pub device_id: String,
    pub action: String,
    pub command_id: String,
}

// ============================================================================
// 设备轮询与回执
// ============================================================================

/// 轮询返回的单条命令。
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledCommandDto {
    pub command_id: String,
    pub action: serde_json::Value,
    pub requested_by: Option<String>,
}

/// 轮询响应。
#[derive(Debug, Serialize, Deserialize)]
pub struct PollResponse {
    pub commands: Vec<PolledCommandDto>,
}

/// 设备回执请求体。
#[derive(Debug, Default, Deserialize)]
pub struct AckRequest {
    pub status: Option<String>,
    pub result: Option<serde_json::Value>,
}

/// 设备回执响应。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AckResponse {
    pub status: String,
    pub command_id: String,
    pub new_status: String,
}

/// 设备自报日志中的执行者。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedByDto {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub source: Option<String>,
}

/// 设备自报日志中的结果。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResultDto {
    pub status: Option<String>,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

/// 设备自报日志请求体。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLogRequest {
    pub action_type: Option<String>,
    pub details: Option<serde_json::Value>,
    pub performed_by: Option<PerformedByDto>,
    pub result: Option<LogResultDto>,
}

/// 设备自报日志响应（201）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceLogResponse {
    pub status: String,
    pub log_id: String,
}

// ============================================================================
// 设备管理
// ============================================================================

/// 设备注册请求体（管理员）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub device_id: String,
    pub name: Option<String>,
    pub secret_key: Option<String>,
}

/// 设备注册响应（仅此一次返回密钥）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredDeviceDto {
    pub device_id: String,
    pub name: String,
    pub secret_key: String,
}

/// 设备静音状态。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatusDto {
    pub device_id: String,
    pub is_active: bool,
    pub muted_sensors: Vec<String>,
    pub mute_ends_at: Option<i64>,
}

// ============================================================================
// 审计日志
// ============================================================================

/// 审计日志查询参数。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogQuery {
    pub device_id: Option<String>,
    pub action_type: Option<String>,
    pub user_id: Option<String>,
    pub source: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub limit: Option<i64>,
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformedByView {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditResultView {
    pub status: String,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

/// 审计日志返回结构。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogDto {
    pub log_id: String,
    pub action_type: String,
    pub device_id: String,
    pub performed_by: PerformedByView,
    pub details: serde_json::Value,
    pub result: AuditResultView,
    pub ip_address: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// 审计日志分页结果。
#[derive(Debug, Serialize)]
pub struct AuditLogPage {
    pub logs: Vec<AuditLogDto>,
    pub pagination: PaginationDto,
}

/// 手动清理审计日志请求体（管理员）。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeAuditLogsRequest {
    pub before_date: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeAuditLogsResponse {
    pub deleted_count: u64,
}

// ============================================================================
// 指标
// ============================================================================

/// 计数器快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsDto {
    pub commands_enqueued: u64,
    pub commands_claimed: u64,
    pub commands_acknowledged: u64,
    pub signature_rejections: u64,
    pub authorization_denials: u64,
    pub audit_write_failures: u64,
}
