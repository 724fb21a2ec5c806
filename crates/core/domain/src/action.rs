//! 控制动作（封闭枚举）与所需能力。
//!
//! 操作员请求体形如 `{action, ...params}`。未登记的动作名解析为
//! [`ActionError::Unknown`]，不会落到任何默认权限。

use crate::audit::AuditActionType;
use serde_json::{Map, Value};
use std::fmt;

/// `set_snooze` 未指定时长时的默认秒数。
pub const DEFAULT_SNOOZE_SECONDS: u64 = 300;

/// `seconds` 参数上限（7 天）。
pub const MAX_SNOOZE_SECONDS: u64 = 7 * 24 * 3600;

/// 表示"全部传感器"的哨兵值。
pub const SENSOR_ALL: &str = "all";

/// 权限类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityCategory {
    Door,
    Awning,
    Alarm,
    Sensors,
}

impl CapabilityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityCategory::Door => "door",
            CapabilityCategory::Awning => "awning",
            CapabilityCategory::Alarm => "alarm",
            CapabilityCategory::Sensors => "sensors",
        }
    }
}

/// 类别内的一项能力，例如 `door.open`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capability {
    pub category: CapabilityCategory,
    pub name: &'static str,
}

impl Capability {
    pub const fn new(category: CapabilityCategory, name: &'static str) -> Self {
        Self { category, name }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.category.as_str(), self.name)
    }
}

/// 静音目标传感器。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SnoozeTarget {
    All,
    Fire,
    Gas,
    Other(String),
}

impl SnoozeTarget {
    pub fn parse(value: &str) -> Self {
        match value {
            SENSOR_ALL => SnoozeTarget::All,
            "fire" => SnoozeTarget::Fire,
            "gas" => SnoozeTarget::Gas,
            other => SnoozeTarget::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SnoozeTarget::All => SENSOR_ALL,
            SnoozeTarget::Fire => "fire",
            SnoozeTarget::Gas => "gas",
            SnoozeTarget::Other(value) => value.as_str(),
        }
    }

    /// 静音"全部"比静音单一传感器更敏感，因此各自对应独立能力。
    fn snooze_capability(&self) -> &'static str {
        match self {
            SnoozeTarget::All => "snoozeAll",
            SnoozeTarget::Fire => "snoozeFire",
            SnoozeTarget::Gas => "snoozeGas",
            SnoozeTarget::Other(_) => "snooze",
        }
    }
}

/// 动作解析错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("action is required")]
    Missing,
    #[error("unknown action: {0}")]
    Unknown(String),
    #[error("invalid {field}: {reason}")]
    InvalidParameter { field: &'static str, reason: String },
}

/// 可下发给设备的控制动作。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAction {
    OpenDoor,
    CloseDoor,
    OpenAwning,
    CloseAwning,
    SetAuto,
    SetManual,
    SetSnooze {
        sensor: SnoozeTarget,
        seconds: Option<u64>,
    },
    CancelSnooze {
        sensor: SnoozeTarget,
    },
}

impl ControlAction {
    /// 从请求体解析。`action` 可以是动作名字符串，也可以是 `{name, ...params}` 对象。
    pub fn from_request(body: &Value) -> Result<Self, ActionError> {
        let empty = Map::new();
        let object = body.as_object().unwrap_or(&empty);
        match object.get("action") {
            Some(Value::String(name)) => Self::parse(name, object),
            Some(Value::Object(inner)) => {
                let name = inner
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or(ActionError::Missing)?;
                Self::parse(name, inner)
            }
            _ => Err(ActionError::Missing),
        }
    }

    /// 按动作名和参数构造动作。
    pub fn parse(name: &str, params: &Map<String, Value>) -> Result<Self, ActionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ActionError::Missing);
        }
        let action = match name {
            "open_door" => ControlAction::OpenDoor,
            "close_door" => ControlAction::CloseDoor,
            "open_awning" => ControlAction::OpenAwning,
            "close_awning" => ControlAction::CloseAwning,
            "set_auto" => ControlAction::SetAuto,
            "set_manual" => ControlAction::SetManual,
            "set_snooze" => ControlAction::SetSnooze {
                sensor: sensor_param(params)?,
                seconds: seconds_param(params)?,
            },
            "cancel_snooze" => ControlAction::CancelSnooze {
                sensor: sensor_param(params)?,
            },
            other => return Err(ActionError::Unknown(other.to_string())),
        };
        Ok(action)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ControlAction::OpenDoor => "open_door",
            ControlAction::CloseDoor => "close_door",
            ControlAction::OpenAwning => "open_awning",
            ControlAction::CloseAwning => "close_awning",
            ControlAction::SetAuto => "set_auto",
            ControlAction::SetManual => "set_manual",
            ControlAction::SetSnooze { .. } => "set_snooze",
            ControlAction::CancelSnooze { .. } => "cancel_snooze",
        }
    }

    /// 执行该动作所需的能力。
    pub fn required_capability(&self) -> Capability {
        use CapabilityCategory::*;
        match self {
            ControlAction::OpenDoor => Capability::new(Door, "open"),
            ControlAction::CloseDoor => Capability::new(Door, "close"),
            ControlAction::OpenAwning => Capability::new(Awning, "open"),
            ControlAction::CloseAwning => Capability::new(Awning, "close"),
            ControlAction::SetAuto | ControlAction::SetManual => Capability::new(Awning, "setMode"),
            ControlAction::SetSnooze { sensor, .. } => {
                Capability::new(Alarm, sensor.snooze_capability())
            }
            ControlAction::CancelSnooze { .. } => Capability::new(Alarm, "cancelSnooze"),
        }
    }

    /// 是否会修改设备静音状态。
    pub fn is_mute_action(&self) -> bool {
        matches!(
            self,
            ControlAction::SetSnooze { .. } | ControlAction::CancelSnooze { .. }
        )
    }

    /// 补齐 `set_snooze` 的默认时长。
    pub fn with_default_snooze(self, default_seconds: u64) -> Self {
        match self {
            ControlAction::SetSnooze {
                sensor,
                seconds: None,
            } => ControlAction::SetSnooze {
                sensor,
                seconds: Some(default_seconds),
            },
            other => other,
        }
    }

    pub fn audit_action_type(&self) -> AuditActionType {
        match self {
            ControlAction::OpenDoor => AuditActionType::DoorOpen,
            ControlAction::CloseDoor => AuditActionType::DoorClose,
            ControlAction::SetSnooze { .. } => AuditActionType::SetSnooze,
            ControlAction::CancelSnooze { .. } => AuditActionType::CancelSnooze,
            _ => AuditActionType::ControlDevice,
        }
    }

    /// 入队用的结构化动作：`{name, sensor?, seconds?}`。
    pub fn to_payload(&self) -> Value {
        let mut payload = Map::new();
        payload.insert("name".to_string(), Value::String(self.name().to_string()));
        match self {
            ControlAction::SetSnooze { sensor, seconds } => {
                payload.insert(
                    "sensor".to_string(),
                    Value::String(sensor.as_str().to_string()),
                );
                if let Some(seconds) = seconds {
                    payload.insert("seconds".to_string(), Value::from(*seconds));
                }
            }
            ControlAction::CancelSnooze { sensor } => {
                payload.insert(
                    "sensor".to_string(),
                    Value::String(sensor.as_str().to_string()),
                );
            }
            _ => {}
        }
        Value::Object(payload)
    }
}

fn sensor_param(params: &Map<String, Value>) -> Result<SnoozeTarget, ActionError> {
    match params.get("sensor") {
        None | Some(Value::Null) => Ok(SnoozeTarget::All),
        Some(Value::String(sensor)) if !sensor.trim().is_empty() => {
            Ok(SnoozeTarget::parse(sensor.trim()))
        }
        Some(_) => Err(ActionError::InvalidParameter {
            field: "sensor",
            reason: "expected non-empty string".to_string(),
        }),
    }
}

fn seconds_param(params: &Map<String, Value>) -> Result<Option<u64>, ActionError> {
    match params.get("seconds") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .filter(|seconds| (1..=MAX_SNOOZE_SECONDS).contains(seconds))
            .map(Some)
            .ok_or_else(|| ActionError::InvalidParameter {
                field: "seconds",
                reason: format!("expected integer between 1 and {MAX_SNOOZE_SECONDS}"),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snooze_capability_refined_by_sensor() {
        let all = ControlAction::from_request(&json!({"action": "set_snooze", "sensor": "all"}))
            .expect("action");
        let fire = ControlAction::from_request(&json!({"action": "set_snooze", "sensor": "fire"}))
            .expect("action");
        let other =
            ControlAction::from_request(&json!({"action": "set_snooze", "sensor": "smoke"}))
                .expect("action");
        assert_eq!(all.required_capability().to_string(), "alarm.snoozeAll");
        assert_eq!(fire.required_capability().to_string(), "alarm.snoozeFire");
        assert_eq!(other.required_capability().to_string(), "alarm.snooze");
    }

    #[test]
    fn missing_sensor_targets_all() {
        let action =
            ControlAction::from_request(&json!({"action": "set_snooze"})).expect("action");
        assert_eq!(
            action,
            ControlAction::SetSnooze {
                sensor: SnoozeTarget::All,
                seconds: None
            }
        );
    }

    #[test]
    fn action_object_form_is_accepted() {
        let action = ControlAction::from_request(
            &json!({"action": {"name": "set_snooze", "sensor": "gas", "seconds": 60}}),
        )
        .expect("action");
        assert_eq!(
            action.to_payload(),
            json!({"name": "set_snooze", "sensor": "gas", "seconds": 60})
        );
    }

    #[test]
    fn unknown_and_missing_actions_rejected() {
        assert_eq!(
            ControlAction::from_request(&json!({"action": "launch_missiles"})),
            Err(ActionError::Unknown("launch_missiles".to_string()))
        );
        assert_eq!(
            ControlAction::from_request(&json!({"sensor": "all"})),
            Err(ActionError::Missing)
        );
    }

    #[test]
    fn invalid_seconds_rejected() {
        let err = ControlAction::from_request(&json!({"action": "set_snooze", "seconds": -5}))
            .expect_err("invalid");
        assert!(matches!(
            err,
            ActionError::InvalidParameter { field: "seconds", .. }
        ));
    }

    #[test]
    fn seconds_above_limit_rejected() {
        let err = ControlAction::from_request(
            &json!({"action": "set_snooze", "sensor": "fire", "seconds": 9_223_372_036_000_000u64}),
        )
        .expect_err("too long");
        assert!(matches!(
            err,
            ActionError::InvalidParameter { field: "seconds", .. }
        ));

        let action = ControlAction::from_request(
            &json!({"action": "set_snooze", "seconds": MAX_SNOOZE_SECONDS}),
        )
        .expect("at limit");
        assert_eq!(
            action,
            ControlAction::SetSnooze {
                sensor: SnoozeTarget::All,
                seconds: Some(MAX_SNOOZE_SECONDS)
            }
        );
    }
}
