//! 输入验证辅助函数
//!
//! - normalize_required：必填字段去除首尾空格并检查非空
//! - parse_device_body：解析设备请求体（签名校验之后才调用）

use crate::utils::response::bad_request_error;
use axum::response::Response;
use serde::de::DeserializeOwned;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: String, field: &str) -> Result<String, Response> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 空请求体按默认值处理，格式错误返回 400。
pub fn parse_device_body<T>(raw_body: &[u8]) -> Result<T, Response>
where
    T: DeserializeOwned + Default,
{
    if raw_body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(raw_body)
        .map_err(|err| bad_request_error(format!("malformed JSON body: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{normalize_required, parse_device_body};
    use api_contract::AckRequest;
    use axum::http::StatusCode;

    #[test]
    fn blank_required_field_rejected() {
        let response = normalize_required("  ".to_string(), "deviceId").expect_err("blank");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let Ok(value) = normalize_required(" hub-1 ".to_string(), "deviceId") else {
            panic!("trimmed value should pass");
        };
        assert_eq!(value, "hub-1");
    }

    #[test]
    fn empty_body_yields_default() {
        let Ok(request) = parse_device_body::<AckRequest>(b"  ") else {
            panic!("empty body should default");
        };
        assert!(request.status.is_none());
        assert!(request.result.is_none());
    }

    #[test]
    fn malformed_body_is_bad_request() {
        let response = parse_device_body::<AckRequest>(b"{\"status\":").expect_err("malformed");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
