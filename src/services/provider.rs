//! 远程优化能力的抽象
//!
//! 调度器和会话只依赖这个 trait，不关心背后是哪个模型服务。

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SeoResult;

#[async_trait]
pub trait SeoProvider: Send + Sync {
    /// 用于日志的名称
    fn name(&self) -> &str;

    /// 把原始文章优化为结构化结果
    async fn optimize(&self, text: &str) -> Result<SeoResult>;

    /// 在已有结果上补充链接和来源，返回完整的新结果
    async fn enrich(&self, current: &SeoResult) -> Result<SeoResult>;
}
