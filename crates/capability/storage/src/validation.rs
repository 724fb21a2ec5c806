//! 验证辅助函数
//!
//! 存储层入口的最小一致性校验：
//! - ensure_device_id：设备 ID 非空
//! - ensure_command_id：命令 ID 非空
//!
//! 设备 ID 是字符串键而非外键，空值会让整张队列被错误匹配，因此在存储层兜底拒绝。

use crate::error::StorageError;

/// 验证设备 ID 非空
pub fn ensure_device_id(device_id: &str) -> Result<(), StorageError> {
    if device_id.trim().is_empty() {
        return Err(StorageError::new("device_id required"));
    }
    Ok(())
}

/// 验证命令 ID 非空
pub fn ensure_command_id(command_id: &str) -> Result<(), StorageError> {
    if command_id.trim().is_empty() {
        return Err(StorageError::new("command_id required"));
    }
    Ok(())
}
