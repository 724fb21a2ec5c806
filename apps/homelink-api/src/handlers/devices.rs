//! 设备管理 handlers
//!
//! - POST /devices（管理员）
//! - GET /devices/{device_id}/status

use crate::AppState;
use crate::middleware::{require_admin, require_identity};
use crate::utils::response::{control_error, device_status_to_dto, registered_device_to_dto};
use crate::utils::validation::normalize_required;
use api_contract::RegisterDeviceRequest;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use homelink_control::DeviceRegistration;

/// 注册设备，响应中返回一次共享密钥
pub async fn register_device(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterDeviceRequest>,
) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&identity) {
        return response;
    }
    let device_id = match normalize_required(req.device_id, "deviceId") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let registration = DeviceRegistration {
        device_id,
        name: req.name,
        secret_key: req.secret_key,
    };
    match state.control.register_device(registration).await {
        Ok(device) => (
            StatusCode::CREATED,
            Json(registered_device_to_dto(device)),
        )
            .into_response(),
        Err(err) => control_error(err),
    }
}

/// 设备静音状态
pub async fn get_device_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_identity(&state, &headers) {
        return response;
    }
    match state.control.device_status(&device_id).await {
        Ok((device, mute)) => (
            StatusCode::OK,
            Json(device_status_to_dto(device, mute)),
        )
            .into_response(),
        Err(err) => control_error(err),
    }
}
