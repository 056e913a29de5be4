//! 工作台会话
//!
//! 持有队列、当前选中条目、会话级最近错误和"补充来源中"标记，
//! 把用户操作（入队、删除、选中、批量优化、补充来源、存档）落到队列上。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::json;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{ItemId, QueueItem, SavedSeoResult, SeoResult};
use crate::orchestrator::batch_processor::{
    lock_queue, BatchReport, BatchScheduler, InFlightGuard, QueueEvent, SharedQueue,
};
use crate::orchestrator::projection;
use crate::orchestrator::queue::Queue;
use crate::services::SeoProvider;
use crate::storage::Archive;
use crate::utils::DebugLog;

/// 补充来源的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// 没有选中条目 / 选中条目没有结果 / 已有补充在进行中
    Skipped,
    Enriched,
    /// 失败信息写入会话级最近错误
    Failed,
}

#[derive(Debug, Default)]
struct SessionState {
    selected: Option<ItemId>,
    last_error: Option<String>,
}

pub struct Workbench {
    queue: SharedQueue,
    scheduler: BatchScheduler,
    provider: Arc<dyn SeoProvider>,
    archive: Archive,
    debug_log: DebugLog,
    state: Mutex<SessionState>,
    enriching: AtomicBool,
}

impl Workbench {
    pub fn new(
        provider: Arc<dyn SeoProvider>,
        archive: Archive,
        debug_log: DebugLog,
        concurrency_limit: usize,
    ) -> Self {
        let queue: SharedQueue = Arc::new(Mutex::new(Queue::new()));
        let scheduler = BatchScheduler::new(queue.clone(), provider.clone(), concurrency_limit);
        Self {
            queue,
            scheduler,
            provider,
            archive,
            debug_log,
            state: Mutex::new(SessionState::default()),
            enriching: AtomicBool::new(false),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn debug_log(&self) -> &DebugLog {
        &self.debug_log
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<QueueEvent> {
        self.scheduler.subscribe()
    }

    // ========== 队列操作 ==========

    /// 提交文章；没有选中条目时自动选中新条目
    pub fn add_to_queue(&self, text: impl Into<String>) -> Result<ItemId> {
        let id = lock_queue(&self.queue).enqueue(text)?;
        let mut state = self.state();
        if state.selected.is_none() {
            state.selected = Some(id);
        }
        info!("📥 文章 {} 已加入队列", id);
        Ok(id)
    }

    /// 删除条目；若删除的是选中条目则清空选中
    pub fn remove(&self, id: ItemId) -> Option<QueueItem> {
        let removed = lock_queue(&self.queue).remove(id);
        let mut state = self.state();
        if state.selected == Some(id) {
            state.selected = None;
        }
        removed
    }

    pub fn select(&self, id: ItemId) {
        self.state().selected = Some(id);
    }

    pub fn clear_selection(&self) {
        self.state().selected = None;
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.state().selected
    }

    /// 按顺序的队列快照
    pub fn items(&self) -> Vec<QueueItem> {
        lock_queue(&self.queue).iter().cloned().collect()
    }

    pub fn item(&self, id: ItemId) -> Option<QueueItem> {
        lock_queue(&self.queue).get(id).cloned()
    }

    pub fn has_pending(&self) -> bool {
        lock_queue(&self.queue).has_pending()
    }

    pub fn is_processing(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn is_enriching(&self) -> bool {
        self.enriching.load(Ordering::SeqCst)
    }

    // ========== 展示 ==========

    pub fn current_result(&self) -> Option<SeoResult> {
        let selected = self.selected();
        let queue = lock_queue(&self.queue);
        projection::current_result(&queue, selected).cloned()
    }

    pub fn current_error(&self) -> Option<String> {
        let (selected, last_error) = {
            let state = self.state();
            (state.selected, state.last_error.clone())
        };
        let queue = lock_queue(&self.queue);
        projection::current_error(&queue, selected, last_error.as_deref()).map(str::to_string)
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    pub fn clear_last_error(&self) {
        self.state().last_error = None;
    }

    // ========== 远程操作 ==========

    /// 批量优化当前所有 pending 条目
    pub async fn run_batch(&self) -> Result<BatchReport> {
        self.scheduler.run_batch().await
    }

    /// 为选中条目补充来源
    ///
    /// 成功时整体替换结果；失败时只记录会话级错误，条目保持 `completed`
    pub async fn enrich_selected(&self) -> EnrichOutcome {
        let Some(id) = self.selected() else {
            return EnrichOutcome::Skipped;
        };
        let Some(current) = self.item(id).and_then(|item| item.result().cloned()) else {
            return EnrichOutcome::Skipped;
        };

        let Some(_enriching) = InFlightGuard::try_acquire(&self.enriching) else {
            warn!("⚠️ 已有补充来源任务在进行中");
            return EnrichOutcome::Skipped;
        };

        info!("🔗 正在为条目 {} 补充来源...", id);
        match self.provider.enrich(&current).await {
            Ok(enriched) => match lock_queue(&self.queue).replace_result(id, enriched) {
                Ok(()) => EnrichOutcome::Enriched,
                Err(e) => {
                    // 条目在补充过程中被删除
                    warn!("⚠️ 条目 {} 补充结果未写回: {}", id, e);
                    EnrichOutcome::Skipped
                }
            },
            Err(e) => {
                let message = format!("补充来源时出错: {}", e.user_message());
                self.debug_log
                    .error("补充来源失败", Some(json!({ "id": id.0, "error": message })));
                self.state().last_error = Some(message);
                EnrichOutcome::Failed
            }
        }
    }

    // ========== 存档 ==========

    /// 把选中条目的结果存档
    ///
    /// `final_html` 为编辑后的正文，提供时覆盖结果中的 html
    pub async fn save_selected(&self, final_html: Option<String>) -> Result<Option<SavedSeoResult>> {
        let Some(id) = self.selected() else {
            return Ok(None);
        };
        let Some(item) = self.item(id) else {
            return Ok(None);
        };
        let Some(result) = item.result() else {
            return Ok(None);
        };

        let mut result = result.clone();
        if let Some(html) = final_html {
            result.html_content = html;
        }
        let saved = SavedSeoResult {
            id: format!("{}-{}", chrono::Utc::now().timestamp_millis(), id.0),
            original_article_text: item.text().to_string(),
            result,
        };

        self.archive.save(&saved).await?;
        info!("💾 条目 {} 已存档为 {}", id, saved.id);
        Ok(Some(saved))
    }

    /// 从存档恢复：作为新的 completed 条目加入队列并选中
    pub fn load_article(&self, saved: SavedSeoResult) -> ItemId {
        let id = lock_queue(&self.queue).insert_completed(saved.original_article_text, saved.result);
        self.select(id);
        id
    }

    pub async fn saved_articles(&self) -> Result<Vec<SavedSeoResult>> {
        self.archive.load_all().await
    }

    pub async fn delete_saved(&self, id: &str) -> Result<()> {
        self.archive.delete(id).await
    }
}
