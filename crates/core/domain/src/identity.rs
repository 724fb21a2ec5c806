//! 操作员身份与授权形态。
//!
//! 身份由外部账号子系统签发（bearer token），本系统只消费：
//! - `role`：admin / user / guest
//! - 授权数据：细粒度权限矩阵，或旧版按模块的 canControl 列表
//!
//! 两种授权数据在 token 中可能同时出现，[`GrantSet::from_parts`] 在加载时选定唯一形态，
//! 之后的鉴权只走一条路径。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 账号角色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
    Guest,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
            Role::Guest => "guest",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            "guest" => Some(Role::Guest),
            _ => None,
        }
    }
}

/// 权限矩阵：category → capability → 是否授予。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<String, BTreeMap<String, bool>>);

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式授予一项能力。
    pub fn grant(mut self, category: &str, capability: &str) -> Self {
        self.set(category, capability, true);
        self
    }

    pub fn set(&mut self, category: &str, capability: &str, allowed: bool) {
        self.0
            .entry(category.to_string())
            .or_default()
            .insert(capability.to_string(), allowed);
    }

    /// 仅当矩阵中显式为 `true` 时允许。
    pub fn allows(&self, category: &str, capability: &str) -> bool {
        self.0
            .get(category)
            .and_then(|caps| caps.get(capability))
            .copied()
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|caps| caps.is_empty())
    }
}

/// 旧版模块授权条目（按设备 ID 授权）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleGrant {
    pub module_id: String,
    #[serde(default)]
    pub can_read: bool,
    #[serde(default)]
    pub can_control: bool,
}

/// 身份实际采用的授权形态。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantSet {
    Matrix(PermissionMatrix),
    LegacyModules(Vec<ModuleGrant>),
}

impl GrantSet {
    /// 矩阵为空且存在模块列表时才回退到旧版形态。
    pub fn from_parts(permissions: PermissionMatrix, modules: Vec<ModuleGrant>) -> Self {
        if permissions.is_empty() && !modules.is_empty() {
            GrantSet::LegacyModules(modules)
        } else {
            GrantSet::Matrix(permissions)
        }
    }

    /// 拆回 token claims 使用的两个字段。
    pub fn to_parts(&self) -> (PermissionMatrix, Vec<ModuleGrant>) {
        match self {
            GrantSet::Matrix(matrix) => (matrix.clone(), Vec::new()),
            GrantSet::LegacyModules(modules) => (PermissionMatrix::default(), modules.clone()),
        }
    }
}

impl Default for GrantSet {
    fn default() -> Self {
        GrantSet::Matrix(PermissionMatrix::default())
    }
}

/// 已验证的操作员身份。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub username: String,
    pub role: Role,
    pub grants: GrantSet,
}

impl Identity {
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        role: Role,
        grants: GrantSet,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            role,
            grants,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
