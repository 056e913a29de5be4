//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责队列、批量调度和会话状态，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `queue` - 处理队列
//! - 有序保存提交的文章（Vec<QueueItem>）
//! - 按 id 执行状态迁移：pending → processing → completed / error
//!
//! ### `batch_processor` - 批量调度器
//! - 快照 pending 条目，按 `concurrency_limit` 分批
//! - 批内并发调用 provider（Semaphore），逐条落地结果
//! - 拒绝重入，广播状态迁移事件
//!
//! ### `projection` - 选中条目视图
//! - 当前结果 / 当前错误
//!
//! ### `session` - 工作台
//! - 选中、删除、补充来源、存档
//!
//! ### `app` - 命令行入口
//! - 读取文件夹中的文章，批量优化并存档
//!
//! ## 层次关系
//!
//! ```text
//! app (处理文件夹)
//!     ↓
//! session::Workbench (用户操作)
//!     ↓
//! batch_processor (处理 Vec<pending>)
//!     ↓
//! services (能力层：provider / fallback / scoring)
//!     ↓
//! storage (存档：local / remote)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：queue 管状态，batch_processor 管并发，session 管选中
//! 2. **按 id 更新**：并发结果只替换对应条目，互不覆盖
//! 3. **持锁不 await**：队列锁只在同步代码中持有

pub mod app;
pub mod batch_processor;
pub mod projection;
pub mod queue;
pub mod session;

// 重新导出主要类型
pub use app::App;
pub use batch_processor::{lock_queue, BatchReport, BatchScheduler, QueueEvent, SharedQueue};
pub use queue::Queue;
pub use session::{EnrichOutcome, Workbench};
