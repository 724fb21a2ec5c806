//! Handlers 模块

pub mod audit;
pub mod control;
pub mod device_commands;
pub mod devices;
pub mod metrics;

pub use audit::*;
pub use control::*;
pub use device_commands::*;
pub use devices::*;
pub use metrics::*;
