//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 未设置时使用内存存储
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub snooze_default_seconds: u64,
    pub audit_retention_days: u64,
    /// 0 表示关闭定时清理
    pub audit_sweep_interval_seconds: u64,
    /// 0 表示关闭重投
    pub command_redelivery_seconds: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let jwt_secret = read_optional("HOMELINK_JWT_SECRET")
            .ok_or_else(|| ConfigError::Missing("HOMELINK_JWT_SECRET".to_string()))?;
        let http_addr =
            env::var("HOMELINK_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let database_url = read_optional("HOMELINK_DATABASE_URL");
        let database_max_connections =
            read_u32_with_default("HOMELINK_DATABASE_MAX_CONNECTIONS", 8)?;
        let snooze_default_seconds =
            read_u64_with_default("HOMELINK_SNOOZE_DEFAULT_SECONDS", 300)?;
        if snooze_default_seconds == 0 {
            return Err(ConfigError::Invalid(
                "HOMELINK_SNOOZE_DEFAULT_SECONDS".to_string(),
                "0".to_string(),
            ));
        }
        let audit_retention_days = read_u64_with_default("HOMELINK_AUDIT_RETENTION_DAYS", 180)?;
        let audit_sweep_interval_seconds =
            read_u64_with_default("HOMELINK_AUDIT_SWEEP_INTERVAL_SECONDS", 3600)?;
        let command_redelivery_seconds =
            read_u64_with_default("HOMELINK_COMMAND_REDELIVERY_SECONDS", 0)?;

        Ok(Self {
            http_addr,
            database_url,
            database_max_connections,
            jwt_secret,
            snooze_default_seconds,
            audit_retention_days,
            audit_sweep_interval_seconds,
            command_redelivery_seconds,
        })
    }
}

fn read_u32_with_default(key: &str, default: u32) -> Result<u32, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u32>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}
