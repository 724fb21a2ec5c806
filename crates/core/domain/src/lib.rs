//! 领域模型：身份、控制动作、命令状态与审计分类。

pub mod action;
pub mod audit;
pub mod command;
pub mod identity;

pub use action::{
    ActionError, Capability, CapabilityCategory, ControlAction, DEFAULT_SNOOZE_SECONDS,
    MAX_SNOOZE_SECONDS, SENSOR_ALL, SnoozeTarget,
};
pub use audit::{
    AUDIT_RETENTION_DAYS, ActionSource, AuditActionType, AuditResultStatus, CORRELATION_KEY,
    MS_PER_DAY,
};
pub use command::{AckOutcome, CommandStatus};
pub use identity::{GrantSet, Identity, ModuleGrant, PermissionMatrix, Role};
