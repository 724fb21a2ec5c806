//! 指标快照与健康检查
//!
//! - GET /metrics（管理员）
//! - GET /health

use api_contract::MetricsDto;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use homelink_telemetry::metrics;

use crate::{
    AppState,
    middleware::{require_admin, require_identity},
};

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&identity) {
        return response;
    }

    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(MetricsDto {
            commands_enqueued: snapshot.commands_enqueued,
            commands_claimed: snapshot.commands_claimed,
            commands_acknowledged: snapshot.commands_acknowledged,
            signature_rejections: snapshot.signature_rejections,
            authorization_denials: snapshot.authorization_denials,
            audit_write_failures: snapshot.audit_write_failures,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::{get_metrics, health};
    use crate::test_support::{admin, bearer_headers, read_json, state_with_device, user_with};
    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use domain::PermissionMatrix;

    #[tokio::test]
    async fn health_reports_ok() {
        let response = health().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await["ok"], true);
    }

    #[tokio::test]
    async fn metrics_snapshot_for_admin() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &admin());
        let response = get_metrics(State(state), headers).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert!(body["commandsEnqueued"].is_u64());
        assert!(body["signatureRejections"].is_u64());
    }

    #[tokio::test]
    async fn metrics_hidden_from_users() {
        let state = state_with_device().await;
        let headers = bearer_headers(&state, &user_with(PermissionMatrix::new()));
        let response = get_metrics(State(state), headers).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
