use crate::AuthError;
use domain::{GrantSet, Identity, ModuleGrant, PermissionMatrix, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

// 登录服务签发的 token 带类型字段，这里只接受 access。
const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Serialize, Deserialize)]
/// JWT 内部 claims。
struct Claims {
    sub: String,
    username: String,
    role: Role,
    #[serde(default)]
    permissions: PermissionMatrix,
    #[serde(default)]
    modules: Vec<ModuleGrant>,
    exp: usize,
    token_type: String,
}

impl Claims {
    fn into_identity(self) -> Identity {
        Identity::new(
            self.sub,
            self.username,
            self.role,
            GrantSet::from_parts(self.permissions, self.modules),
        )
    }
}

/// 操作员 JWT 校验（token 由共用同一密钥的登录服务签发）。
pub struct JwtManager {
    secret: Vec<u8>,
}

impl JwtManager {
    pub fn new(secret: String) -> Self {
        Self {
            secret: secret.into_bytes(),
        }
    }

    /// 签发 access token，供本地调试与测试使用。
    pub fn issue_access_token(
        &self,
        identity: &Identity,
        ttl_seconds: u64,
    ) -> Result<String, AuthError> {
        let exp = now_epoch_seconds().saturating_add(ttl_seconds) as usize;
        let (permissions, modules) = identity.grants.to_parts();
        let claims = Claims {
            sub: identity.user_id.clone(),
            username: identity.username.clone(),
            role: identity.role,
            permissions,
            modules,
            exp,
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| AuthError::Internal(err.to_string()))
    }

    /// 解析 access token。
    pub fn decode_access(&self, token: &str) -> Result<Identity, AuthError> {
        let claims = self.decode_claims(token)?;
        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims.into_identity())
    }

    fn decode_claims(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(map_jwt_error)?;
        Ok(decoded.claims)
    }
}

/// 当前时间戳（秒）。
fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
