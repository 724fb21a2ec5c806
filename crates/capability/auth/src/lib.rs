//! 认证能力：操作员 JWT、设备 HMAC 签名校验、控制动作授权。

mod device_signature;
mod jwt;
mod permission;

use async_trait::async_trait;
use homelink_storage::DeviceRecord;

pub use device_signature::{
    DeviceAuthError, DeviceSignatureVerifier, generate_device_secret, sign_payload,
};
pub use jwt::JwtManager;
pub use permission::{Denial, authorize, resolve_action};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 设备认证能力 trait，便于替换实现与测试。
#[async_trait]
pub trait DeviceAuthenticator: Send + Sync {
    async fn authenticate(
        &self,
        device_id: &str,
        signature: Option<&str>,
        raw_body: &[u8],
    ) -> Result<DeviceRecord, DeviceAuthError>;
}

#[async_trait]
impl DeviceAuthenticator for DeviceSignatureVerifier {
    async fn authenticate(
        &self,
        device_id: &str,
        signature: Option<&str>,
        raw_body: &[u8],
    ) -> Result<DeviceRecord, DeviceAuthError> {
        self.verify(device_id, signature, raw_body).await
    }
}
