//! 审计日志 handlers
//!
//! - GET /action-logs
//! - GET /action-logs/{log_id}
//! - DELETE /action-logs（管理员）

use crate::AppState;
use crate::middleware::{require_admin, require_identity};
use crate::utils::response::{
    audit_log_to_dto, bad_request_error, control_error, storage_error,
};
use api_contract::{
    AuditLogPage, AuditLogQuery, PaginationDto, PurgeAuditLogsRequest, PurgeAuditLogsResponse,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use homelink_control::AuditQuery;
use tracing::info;

/// 分页查询审计日志（按创建时间倒序）
pub async fn list_action_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
    headers: HeaderMap,
) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let query = AuditQuery {
        device_id: query.device_id,
        action_type: query.action_type,
        user_id: query.user_id,
        source: query.source,
        from_ms: query.from,
        to_ms: query.to,
        page: query.page,
        limit: query.limit,
    };
    match state.audit.list(&identity, query).await {
        Ok(listing) => {
            let pagination = PaginationDto {
                page: listing.page,
                limit: listing.limit,
                total: listing.total,
                total_pages: listing.total_pages(),
            };
            let page = AuditLogPage {
                logs: listing.items.into_iter().map(audit_log_to_dto).collect(),
                pagination,
            };
            (StatusCode::OK, Json(page)).into_response()
        }
        Err(err) => control_error(err),
    }
}

pub async fn get_action_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    match state.audit.find(&identity, &log_id).await {
        Ok(record) => (StatusCode::OK, Json(audit_log_to_dto(record))).into_response(),
        Err(err) => control_error(err),
    }
}

/// 手动清理早于 beforeDate 的审计日志
pub async fn purge_action_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurgeAuditLogsRequest>,
) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    if let Err(response) = require_admin(&identity) {
        return response;
    }
    let Some(before_ms) = req.before_date else {
        return bad_request_error("beforeDate required");
    };
    match state.audit.purge_before(before_ms).await {
        Ok(deleted_count) => {
            info!(
                target: "homelink.api",
                actor = %identity.user_id,
                before_ms = before_ms,
                deleted = deleted_count,
                "audit_logs_purged_manually"
            );
            (
                StatusCode::OK,
                Json(PurgeAuditLogsResponse { deleted_count }),
            )
                .into_response()
        }
        Err(err) => storage_error(err),
    }
}

#[cfg(test)]
mod tests {
    use super::{get_action_log, list_action_logs, purge_action_logs};
    use crate::handlers::control_device;
    use crate::test_support::{
        DEVICE_ID, admin, bearer_headers, read_json, state_with_device, user_with,
    };
    use crate::AppState;
    use api_contract::{AuditLogQuery, PurgeAuditLogsRequest};
    use axum::{
        Json,
        extract::{Path, Query, State},
        http::{HeaderMap, StatusCode},
    };
    use domain::{Identity, PermissionMatrix};
    use serde_json::json;

    async fn submit_as(state: &AppState, identity: &Identity, action: &str) {
        let response = control_device(
            State(state.clone()),
            Path(DEVICE_ID.to_string()),
            bearer_headers(state, identity),
            None,
            Json(json!({"action": action})),
        )
        .await;
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    fn door_user() -> Identity {
        user_with(
            PermissionMatrix::new()
                .grant("door", "open")
                .grant("door", "close"),
        )
    }

    #[tokio::test]
    async fn admin_sees_all_logs_newest_first() {
        let state = state_with_device().await;
        submit_as(&state, &admin(), "open_awning").await;
        submit_as(&state, &door_user(), "open_door").await;

        let response = list_action_logs(
            State(state.clone()),
            Query(AuditLogQuery::default()),
            bearer_headers(&state, &admin()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["pagination"]["total"], 2);
        assert_eq!(body["pagination"]["page"], 1);
        assert_eq!(body["pagination"]["limit"], 50);
        assert_eq!(body["pagination"]["totalPages"], 1);
        let logs = body["logs"].as_array().expect("logs");
        assert_eq!(logs[0]["actionType"], "door_open");
        assert_eq!(logs[0]["result"]["status"], "pending");
        assert_eq!(logs[1]["actionType"], "control_device");
    }

    #[tokio::test]
    async fn user_only_sees_own_logs() {
        let state = state_with_device().await;
        submit_as(&state, &admin(), "open_awning").await;
        submit_as(&state, &door_user(), "close_door").await;

        let query = AuditLogQuery {
            user_id: Some("admin-1".to_string()),
            ..AuditLogQuery::default()
        };
        let response = list_action_logs(
            State(state.clone()),
            Query(query),
            bearer_headers(&state, &door_user()),
        )
        .await;
        let body = read_json(response).await;
        assert_eq!(body["pagination"]["total"], 1);
        assert_eq!(body["logs"][0]["performedBy"]["userId"], "user-1");
        assert_eq!(body["logs"][0]["details"]["action"], "close_door");
    }

    #[tokio::test]
    async fn invalid_action_type_filter_is_bad_request() {
        let state = state_with_device().await;
        let query = AuditLogQuery {
            action_type: Some("reboot".to_string()),
            ..AuditLogQuery::default()
        };
        let response = list_action_logs(
            State(state.clone()),
            Query(query),
            bearer_headers(&state, &admin()),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn foreign_log_is_hidden_from_user() {
        let state = state_with_device().await;
        submit_as(&state, &admin(), "open_awning").await;
        let listing = read_json(
            list_action_logs(
                State(state.clone()),
                Query(AuditLogQuery::default()),
                bearer_headers(&state, &admin()),
            )
            .await,
        )
        .await;
        let log_id = listing["logs"][0]["logId"]
            .as_str()
            .expect("log id")
            .to_string();

        let as_admin = get_action_log(
            State(state.clone()),
            Path(log_id.clone()),
            bearer_headers(&state, &admin()),
        )
        .await;
        assert_eq!(as_admin.status(), StatusCode::OK);

        let as_user = get_action_log(
            State(state.clone()),
            Path(log_id),
            bearer_headers(&state, &door_user()),
        )
        .await;
        assert_eq!(as_user.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn purge_requires_admin_and_before_date() {
        let state = state_with_device().await;
        submit_as(&state, &admin(), "open_awning").await;

        let denied = purge_action_logs(
            State(state.clone()),
            bearer_headers(&state, &door_user()),
            Json(PurgeAuditLogsRequest {
                before_date: Some(i64::MAX),
            }),
        )
        .await;
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let missing = purge_action_logs(
            State(state.clone()),
            bearer_headers(&state, &admin()),
            Json(PurgeAuditLogsRequest { before_date: None }),
        )
        .await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let purged = purge_action_logs(
            State(state.clone()),
            bearer_headers(&state, &admin()),
            Json(PurgeAuditLogsRequest {
                before_date: Some(i64::MAX),
            }),
        )
        .await;
        assert_eq!(purged.status(), StatusCode::OK);
        assert_eq!(read_json(purged).await["deletedCount"], 1);
    }

    #[tokio::test]
    async fn listing_requires_token() {
        let state = state_with_device().await;
        let response =
            list_action_logs(State(state), Query(AuditLogQuery::default()), HeaderMap::new())
                .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
