//! # SEO Batch
//!
//! 批量文章 SEO 优化工具：提交文章 → 有限并发调用 LLM → 查看 / 补充来源 / 存档
//!
//! ## 架构设计
//!
//! ### ① 模型层（Models）
//! - `models/` - 队列条目、SEO 结果、存档记录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单篇文章
//! - `LlmService` - OpenAI 兼容接口的优化 / 补充来源能力
//! - `ProviderChain` - 按顺序回退的 provider 组合
//! - `scoring` - SEO / 可读性评分
//! - `AuthGate` - 访问码校验
//!
//! ### ③ 存档层（Storage）
//! - `storage/` - 本地 JSON 文件 + 可选的远程 PostgREST
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/queue` - 处理队列和状态迁移
//! - `orchestrator/batch_processor` - 批量调度器，管理并发
//! - `orchestrator/session` - 工作台，管理选中和补充来源
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod storage;
pub mod utils;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, Result};
pub use models::{ItemId, ItemStatus, QueueItem, SavedSeoResult, SeoResult};
pub use orchestrator::{App, BatchReport, BatchScheduler, EnrichOutcome, Queue, Workbench};
pub use services::{LlmService, ProviderChain, SeoProvider};
pub use utils::DebugLog;
