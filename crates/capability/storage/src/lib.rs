//! # HomeLink Storage 模块
//!
//! 本模块提供统一的数据存储抽象层，支持内存与 PostgreSQL 两种后端。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：命令队列、设备、审计日志的异步 Trait 接口
//! 2. **数据模型层** (`models.rs`)：存储相关的数据结构
//! 3. **错误处理层** (`error.rs`)：统一的存储错误类型（区分唯一约束冲突）
//! 4. **验证辅助层** (`validation.rs`)：入口参数校验
//! 5. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 6. **实现层**：
//!    - `in_memory/`：内存存储实现（未配置数据库时使用，也用于测试）
//!    - `postgres/`：PostgreSQL 存储实现（生产环境使用）
//!
//! ## 队列语义
//!
//! - 每个设备一条 FIFO 队列，按 `created_at` 升序出队
//! - `claim_pending` 原子地把 `pending` 改为 `sent`，并发认领互不重叠
//! - 回执只推进 `pending/sent`，终态仅接受相同结果的重复回执
//! - `delivered_at` 只在首次回执时写入
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use homelink_storage::{CommandStore, InMemoryCommandStore};
//!
//! let store = InMemoryCommandStore::new();
//! let claimed = store.claim_pending("hub-1", now_ms, None).await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod models;
pub mod postgres;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use models::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{InMemoryAuditLogStore, InMemoryCommandStore, InMemoryDeviceStore};

pub use postgres::{PgAuditLogStore, PgCommandStore, PgDeviceStore};
