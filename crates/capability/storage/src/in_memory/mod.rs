//! 内存存储实现模块
//!
//! 仅用于本地演示和测试（未配置数据库时使用）。
//!
//! 包含以下实现：
//! - CommandStore: InMemoryCommandStore
//! - DeviceStore: InMemoryDeviceStore
//! - AuditLogStore: InMemoryAuditLogStore

pub mod audit;
pub mod command;
pub mod device;

pub use audit::*;
pub use command::*;
pub use device::*;
