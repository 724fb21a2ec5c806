//! 设备静音状态代数。
//!
//! - `set_snooze(all)`：集合变为 `{all}`
//! - `set_snooze(sensor)`：去掉 `all` 后并入 `sensor`
//! - `cancel_snooze(all)`：清空，结束时间为空
//! - `cancel_snooze(sensor)`：去掉 `sensor` 与 `all`，集合非空时按默认时长重新计时
//!
//! 已过期的静音在运算前视为空集。

use domain::{ControlAction, SENSOR_ALL, SnoozeTarget};

/// 设备当前静音状态。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MuteState {
    pub sensors: Vec<String>,
    pub ends_at_ms: Option<i64>,
}

impl MuteState {
    pub fn new(sensors: Vec<String>, ends_at_ms: Option<i64>) -> Self {
        Self {
            sensors,
            ends_at_ms,
        }
    }

    /// 按 `now_ms` 计算仍然生效的状态。
    pub fn effective(&self, now_ms: i64) -> MuteState {
        match self.ends_at_ms {
            Some(ends_at) if ends_at > now_ms => self.clone(),
            _ => MuteState::default(),
        }
    }

    pub fn is_muted(&self, sensor: &str) -> bool {
        self.sensors
            .iter()
            .any(|item| item == SENSOR_ALL || item == sensor)
    }

    /// 对静音类动作求新状态；非静音动作返回 `None`。
    pub fn apply(
        &self,
        action: &ControlAction,
        now_ms: i64,
        default_seconds: u64,
    ) -> Option<MuteState> {
        let current = self.effective(now_ms);
        let next = match action {
            ControlAction::SetSnooze { sensor, seconds } => {
                let seconds = seconds.unwrap_or(default_seconds);
                current.set_snooze(sensor, now_ms.saturating_add(seconds_to_ms(seconds)))
            }
            ControlAction::CancelSnooze { sensor } => {
                let renewed_ends_at_ms = now_ms.saturating_add(seconds_to_ms(default_seconds));
                current.cancel_snooze(sensor, renewed_ends_at_ms)
            }
            _ => return None,
        };
        Some(next)
    }

    fn set_snooze(&self, sensor: &SnoozeTarget, ends_at_ms: i64) -> MuteState {
        let sensors = match sensor {
            SnoozeTarget::All => vec![SENSOR_ALL.to_string()],
            other => {
                let mut sensors: Vec<String> = self
                    .sensors
                    .iter()
                    .filter(|item| item.as_str() != SENSOR_ALL)
                    .cloned()
                    .collect();
                if !sensors.iter().any(|item| item == other.as_str()) {
                    sensors.push(other.as_str().to_string());
                }
                sensors
            }
        };
        MuteState::new(sensors, Some(ends_at_ms))
    }

    fn cancel_snooze(&self, sensor: &SnoozeTarget, renewed_ends_at_ms: i64) -> MuteState {
        if *sensor == SnoozeTarget::All {
            return MuteState::default();
        }
        let sensors: Vec<String> = self
            .sensors
            .iter()
            .filter(|item| item.as_str() != SENSOR_ALL && item.as_str() != sensor.as_str())
            .cloned()
            .collect();
        let ends_at_ms = (!sensors.is_empty()).then_some(renewed_ends_at_ms);
        MuteState::new(sensors, ends_at_ms)
    }
}

fn seconds_to_ms(seconds: u64) -> i64 {
    i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
}
