//! 命令状态机。
//!
//! `pending → sent` 只由轮询认领触发；`sent → done | failed` 只由设备回执触发。

use serde::{Deserialize, Serialize};

/// 命令状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Pending,
    Sent,
    Failed,
    Done,
}

impl CommandStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandStatus::Pending => "pending",
            CommandStatus::Sent => "sent",
            CommandStatus::Failed => "failed",
            CommandStatus::Done => "done",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(CommandStatus::Pending),
            "sent" => Some(CommandStatus::Sent),
            "failed" => Some(CommandStatus::Failed),
            "done" => Some(CommandStatus::Done),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CommandStatus::Failed | CommandStatus::Done)
    }

    /// 回执能否把当前状态推进到 `outcome`。
    ///
    /// 终态只接受相同结果的重复回执（幂等），不允许 done/failed 互相改写。
    pub fn accepts_ack(&self, outcome: AckOutcome) -> bool {
        match self {
            CommandStatus::Pending | CommandStatus::Sent => true,
            terminal => *terminal == outcome.status(),
        }
    }
}

/// 设备回执结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    Done,
    Failed,
}

impl AckOutcome {
    /// 只有显式的 `"failed"` 视为失败，其余一律视为完成。
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("failed") => AckOutcome::Failed,
            _ => AckOutcome::Done,
        }
    }

    pub fn status(&self) -> CommandStatus {
        match self {
            AckOutcome::Done => CommandStatus::Done,
            AckOutcome::Failed => CommandStatus::Failed,
        }
    }
}
