//! 控制动作授权。
//!
//! 判定顺序：
//! 1. 动作名必须可解析（未知动作对所有角色一律拒绝）
//! 2. admin 直接放行
//! 3. 权限矩阵：所需能力必须显式为 `true`
//! 4. 旧版模块授权：目标设备的模块条目 `canControl` 为 `true`

use domain::{ActionError, Capability, ControlAction, GrantSet, Identity};
use serde_json::Value;

/// 拒绝原因。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denial {
    #[error("unknown action: {0}")]
    UnknownAction(String),
    #[error("permission denied: requires {capability}")]
    InsufficientPermission { capability: Capability },
    #[error("no control permission for module {device_id}")]
    NoModuleControl { device_id: String },
}

/// 从请求体解析动作。
///
/// 外层错误为参数问题（缺少动作、参数非法），内层为未知动作的拒绝。
pub fn resolve_action(body: &Value) -> Result<Result<ControlAction, Denial>, ActionError> {
    match ControlAction::from_request(body) {
        Ok(action) => Ok(Ok(action)),
        Err(ActionError::Unknown(name)) => Ok(Err(Denial::UnknownAction(name))),
        Err(err) => Err(err),
    }
}

/// 判断身份能否对设备执行动作。
pub fn authorize(identity: &Identity, device_id: &str, action: &ControlAction) -> Result<(), Denial> {
    if identity.is_admin() {
        return Ok(());
    }
    match &identity.grants {
        GrantSet::Matrix(matrix) => {
            let capability = action.required_capability();
            if matrix.allows(capability.category.as_str(), capability.name) {
                Ok(())
            } else {
                Err(Denial::InsufficientPermission { capability })
            }
        }
        GrantSet::LegacyModules(modules) => {
            let allowed = modules
                .iter()
                .any(|grant| grant.module_id == device_id && grant.can_control);
            if allowed {
                Ok(())
            } else {
                Err(Denial::NoModuleControl {
                    device_id: device_id.to_string(),
                })
            }
        }
    }
}
