//! 存档层
//!
//! 只负责保存 / 读取 / 删除已完成的优化结果，不参与批量调度

pub mod archive;
pub mod local;
pub mod remote;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::SavedSeoResult;

pub use archive::Archive;
pub use local::LocalStore;
pub use remote::RemoteStore;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn save(&self, article: &SavedSeoResult) -> Result<()>;
    async fn load_all(&self) -> Result<Vec<SavedSeoResult>>;
    async fn delete(&self, id: &str) -> Result<()>;
}
