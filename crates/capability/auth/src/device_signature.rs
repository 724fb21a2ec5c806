//! 设备请求签名校验（HMAC-SHA256，十六进制）。
//!
//! 签名可以覆盖两种载荷表示之一：
//! - 传输层原始字节（仅在请求体非空时参与比对）
//! - 解析后的 JSON 紧凑重序列化（保持键顺序），空请求体视为 `{}`
//!
//! 任一摘要匹配即通过，比较为常量时间。

use hmac::{Hmac, Mac};
use homelink_storage::{DeviceRecord, DeviceStore, StorageError};
use rand_core::{OsRng, RngCore};
use sha2::Sha256;
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// 设备密钥字节数（十六进制后 64 字符）。
const DEVICE_SECRET_BYTES: usize = 32;

/// 设备认证失败原因。
#[derive(Debug, thiserror::Error)]
pub enum DeviceAuthError {
    #[error("missing device signature")]
    MissingSignature,
    #[error("device not found")]
    DeviceNotFound,
    #[error("device inactive")]
    DeviceInactive,
    #[error("invalid device signature")]
    InvalidSignature,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// 计算载荷的 HMAC-SHA256 十六进制摘要。
pub fn sign_payload(secret: &str, payload: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        // HMAC 接受任意长度密钥。
        Err(_) => return String::new(),
    };
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// 生成新的设备密钥。
pub fn generate_device_secret() -> String {
    let mut bytes = [0u8; DEVICE_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 请求体的规范化表示；无法解析为 JSON 时返回 `None`。
fn canonical_payload(raw_body: &[u8]) -> Option<Vec<u8>> {
    if raw_body.iter().all(u8::is_ascii_whitespace) {
        return Some(b"{}".to_vec());
    }
    let value: serde_json::Value = serde_json::from_slice(raw_body).ok()?;
    serde_json::to_vec(&value).ok()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

/// 设备签名校验器。
pub struct DeviceSignatureVerifier {
    device_store: Arc<dyn DeviceStore>,
}

impl DeviceSignatureVerifier {
    pub fn new(device_store: Arc<dyn DeviceStore>) -> Self {
        Self { device_store }
    }

    /// 校验签名并返回对应设备。
    pub async fn verify(
        &self,
        device_id: &str,
        signature: Option<&str>,
        raw_body: &[u8],
    ) -> Result<DeviceRecord, DeviceAuthError> {
        let provided = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(DeviceAuthError::MissingSignature)?;

        let device = self
            .device_store
            .find_device(device_id)
            .await?
            .ok_or(DeviceAuthError::DeviceNotFound)?;

        let mut candidates = Vec::with_capacity(2);
        if !raw_body.is_empty() {
            candidates.push(raw_body.to_vec());
        }
        if let Some(canonical) = canonical_payload(raw_body) {
            candidates.push(canonical);
        }

        // 逐个比对，不提前短路。
        let mut matched = false;
        for candidate in &candidates {
            let expected = sign_payload(&device.secret_key, candidate);
            matched |= constant_time_eq(expected.as_bytes(), provided.as_bytes());
        }
        if !matched {
            tracing::warn!(
                target: "homelink.auth",
                device_id = %device_id,
                "device_signature_rejected"
            );
            return Err(DeviceAuthError::InvalidSignature);
        }
        if !device.is_active {
            return Err(DeviceAuthError::DeviceInactive);
        }
        Ok(device)
    }
}
