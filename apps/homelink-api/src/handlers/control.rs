//! 操作员控制 handlers
//!
//! - POST /devices/{device_id}/control

use crate::AppState;
use crate::middleware::{request_meta, require_identity};
use crate::utils::response::control_error;
use api_contract::ControlAcceptedResponse;
use axum::{
    Json,
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::net::SocketAddr;

/// 下发控制命令（入队后立即返回 202，不等待设备执行）
pub async fn control_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    Json(body): Json<Value>,
) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let meta = request_meta(&headers, peer.map(|ConnectInfo(addr)| addr));
    match state
        .control
        .submit(&identity, &device_id, &body, &meta)
        .await
    {
        Ok(command) => {
            let action = command
                .action
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            (
                StatusCode::ACCEPTED,
                Json(ControlAcceptedResponse {
                    status: "accepted".to_string(),
                    device_id: command.device_id,
                    action,
                    command_id: command.command_id,
                }),
            )
                .into_response()
        }
        Err(err) => control_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::control_device;
    use crate::test_support::{
        DEVICE_ID, admin, bearer_headers, read_json, state_with_device, user_with,
    };
    use axum::{
        Json,
        extract::{ConnectInfo, Path, State},
        http::{HeaderMap, StatusCode},
    };
    use domain::PermissionMatrix;
    use homelink_control::AuditQuery;
    use serde_json::json;
    use std::net::SocketAddr;

    #[tokio::test]
    async fn admin_submission_is_accepted() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &admin());
        let response = control_device(
            State(state),
            Path(DEVICE_ID.to_string()),
            headers,
            None,
            Json(json!({"action": "open_door"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let body = read_json(response).await;
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["deviceId"], DEVICE_ID);
        assert_eq!(body["action"], "open_door");
        assert!(body["commandId"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let state = state_with_device().await;
        let response = control_device(
            State(state),
            Path(DEVICE_ID.to_string()),
            HeaderMap::new(),
            None,
            Json(json!({"action": "open_door"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_action_is_bad_request() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &admin());
        let response = control_device(
            State(state),
            Path(DEVICE_ID.to_string()),
            headers,
            None,
            Json(json!({"sensor": "fire"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn denial_names_missing_capability() {
        let state = state_with_device().await;
        let user = user_with(PermissionMatrix::new().grant("alarm", "snoozeFire"));
        let headers = bearer_headers(&state, &user);
        let response = control_device(
            State(state),
            Path(DEVICE_ID.to_string()),
            headers,
            None,
            Json(json!({"action": "set_snooze", "sensor": "all"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = read_json(response).await;
        assert_eq!(body["error"]["code"], "AUTH.FORBIDDEN");
        assert!(
            body["error"]["message"]
                .as_str()
                .is_some_and(|message| message.contains("alarm.snoozeAll"))
        );
    }

    #[tokio::test]
    async fn unknown_device_is_not_found() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &admin());
        let response = control_device(
            State(state),
            Path("ghost".to_string()),
            headers,
            None,
            Json(json!({"action": "close_door"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn direct_connection_records_peer_ip() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &admin());
        let peer: SocketAddr = "198.51.100.4:40112".parse().expect("addr");
        let response = control_device(
            State(state.clone()),
            Path(DEVICE_ID.to_string()),
            headers,
            Some(ConnectInfo(peer)),
            Json(json!({"action": "open_door"})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let listing = state
            .audit
            .list(&admin(), AuditQuery::default())
            .await
            .expect("list");
        assert_eq!(listing.items[0].ip_address.as_deref(), Some("198.51.100.4"));
    }
}
