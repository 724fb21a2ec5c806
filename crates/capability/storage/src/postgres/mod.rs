//! # PostgreSQL 存储实现模块
//!
//! 本模块提供所有存储接口的 PostgreSQL 实现，用于生产环境。
//!
//! ## 包含的实现
//!
//! - **CommandStore** (`command.rs`)：命令队列，认领使用 `for update skip locked`
//! - **DeviceStore** (`device.rs`)：设备身份与静音状态
//! - **AuditLogStore** (`audit.rs`)：审计日志，按 `details->>'commandId'` 关联命令
//!
//! ## 数据库模式要求
//!
//! 表结构见 `migrations/0001_init.sql`：
//! - `devices`：设备表（device_id, name, secret_key, is_active, muted_sensors, mute_ends_at）
//! - `commands`：命令表（command_id, seq, device_id, action, status, created_at, sent_at, delivered_at, result）
//! - `audit_logs`：审计表（audit_id, action_type, device_id, performed_by_*, details, result_*, metadata）
//!
//! ## 时间字段
//!
//! 数据库使用 `timestamptz`，读写时与毫秒 epoch 互转：
//! - 写入：`to_timestamp($n / 1000.0)`，绑定 `f64`
//! - 读取：`(extract(epoch from ts) * 1000)::bigint`

pub mod audit;
pub mod command;
pub mod device;

pub use audit::*;
pub use command::*;
pub use device::*;
