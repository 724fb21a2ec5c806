//! 认证中间件与辅助函数
//!
//! - request_context：请求上下文中间件，注入 request_id/trace_id
//! - bearer_token / require_identity / require_admin：操作员 bearer token 校验
//! - signature_header / authenticate_device：设备 HMAC 签名校验
//! - request_meta：来源 IP 与 User-Agent（写入审计）
//!
//! 操作员接口走 bearer token，设备接口只认 `x-signature`，两条路径互不替代。

use axum::{
    body::Body,
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use domain::Identity;
use homelink_auth::AuthError;
use homelink_control::RequestMeta;
use homelink_storage::DeviceRecord;
use homelink_telemetry::new_request_ids;
use std::net::SocketAddr;
use tracing::{Instrument, info_span};

use crate::AppState;
use crate::utils::response::{auth_error, control_error, forbidden_error, internal_auth_error};

/// 设备签名请求头
pub const SIGNATURE_HEADER: &str = "x-signature";

/// 请求上下文中间件：注入 request_id/trace_id
pub async fn request_context(mut req: Request<Body>, next: Next) -> Response {
    let ids = new_request_ids();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    req.extensions_mut().insert(ids.clone());

    let span = info_span!(
        "request",
        request_id = %ids.request_id,
        trace_id = %ids.trace_id,
        method = %method,
        path = %path
    );

    let mut response = next.run(req).instrument(span).await;
    response.headers_mut().insert(
        "x-request-id",
        HeaderValue::from_str(&ids.request_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response.headers_mut().insert(
        "x-trace-id",
        HeaderValue::from_str(&ids.trace_id).unwrap_or_else(|_| HeaderValue::from_static("")),
    );
    response
}

/// 从请求头中提取 Bearer token
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header_value = headers.get(header::AUTHORIZATION)?;
    let auth_str = header_value.to_str().ok()?;
    auth_str.strip_prefix("Bearer ")
}

/// 校验 access token 并取出操作员身份
pub fn require_identity(state: &AppState, headers: &HeaderMap) -> Result<Identity, Response> {
    let token = match bearer_token(headers) {
        Some(token) => token,
        None => return Err(auth_error(StatusCode::UNAUTHORIZED)),
    };
    match state.jwt.decode_access(token) {
        Ok(identity) => Ok(identity),
        Err(AuthError::TokenInvalid | AuthError::TokenExpired) => {
            Err(auth_error(StatusCode::UNAUTHORIZED))
        }
        Err(err) => Err(internal_auth_error(err)),
    }
}

/// 仅管理员可访问
pub fn require_admin(identity: &Identity) -> Result<(), Response> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(forbidden_error("admin role required"))
    }
}

pub fn signature_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// 校验设备签名；必须在解析请求体之前调用。
pub async fn authenticate_device(
    state: &AppState,
    device_id: &str,
    headers: &HeaderMap,
    raw_body: &[u8],
) -> Result<DeviceRecord, Response> {
    state
        .gateway
        .authenticate(device_id, signature_header(headers), raw_body)
        .await
        .map_err(control_error)
}

/// 来源 IP 取 `x-forwarded-for` 的第一个地址，其次 `x-real-ip`，最后是对端地址。
pub fn request_meta(headers: &HeaderMap, peer: Option<SocketAddr>) -> RequestMeta {
    let ip_address = header_text(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .or_else(|| header_text(headers, "x-real-ip").map(str::to_string))
        .or_else(|| peer.map(|addr| addr.ip().to_string()));
    let user_agent = header_text(headers, header::USER_AGENT.as_str()).map(str::to_string);
    RequestMeta {
        ip_address,
        user_agent,
    }
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{bearer_token, request_meta};
    use axum::http::{HeaderMap, HeaderValue, header};
    use std::net::SocketAddr;

    #[test]
    fn bearer_token_extracts() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer token-1"),
        );
        assert_eq!(bearer_token(&headers), Some("token-1"));
    }

    #[test]
    fn bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn forwarded_for_wins_over_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("10.0.0.7, 172.16.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.2"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("hub-app/1.0"));
        let meta = request_meta(&headers, None);
        assert_eq!(meta.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("hub-app/1.0"));
    }

    #[test]
    fn peer_address_used_without_proxy_headers() {
        let peer: SocketAddr = "192.0.2.10:53124".parse().expect("addr");
        let meta = request_meta(&HeaderMap::new(), Some(peer));
        assert_eq!(meta.ip_address.as_deref(), Some("192.0.2.10"));

        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.1.1.1"));
        let meta = request_meta(&headers, Some(peer));
        assert_eq!(meta.ip_address.as_deref(), Some("10.1.1.1"));
        assert_eq!(request_meta(&HeaderMap::new(), None).ip_address, None);
    }
}
