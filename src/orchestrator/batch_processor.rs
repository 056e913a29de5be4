//! 批量调度器 - 编排层
//!
//! ## 职责
//!
//! 把队列中所有 `pending` 条目推进到终态（`completed` / `error`），
//! 同时进行的远程调用不超过 `concurrency_limit`。
//!
//! ## 核心流程
//!
//! 1. **快照**：调用时取一次 `pending` 条目（按入队顺序），之后新入队的条目留给下一次
//! 2. **分批**：按 `concurrency_limit` 切成若干批，一批全部结束后才开始下一批
//! 3. **并发**：批内每个条目先标记为 `processing`，再 spawn 远程调用；Semaphore 兜底并发上限
//! 4. **逐条落地**：每个调用结束后立即按 id 更新队列并广播事件，不等整批结束
//! 5. **失败隔离**：单条失败只写入该条目的 `error`，不影响同批和后续批次
//!
//! ## 重入
//!
//! 上一次 `run_batch` 尚未结束时再次调用会直接返回 `QueueError::BatchInFlight`，不做任何修改。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures::future::join_all;
use tokio::sync::{broadcast, Semaphore};
use tracing::{error, info, warn};

use crate::error::{QueueError, Result, UNKNOWN_ERROR};
use crate::models::{ItemId, ItemStatus, SeoResult};
use crate::orchestrator::queue::Queue;
use crate::services::SeoProvider;
use crate::utils::logging::{log_wave_complete, log_wave_start};

/// 调度器和会话共享的队列
pub type SharedQueue = Arc<Mutex<Queue>>;

/// 锁住队列；持锁期间不允许 await
pub fn lock_queue(queue: &SharedQueue) -> MutexGuard<'_, Queue> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 一次状态迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEvent {
    pub id: ItemId,
    pub status: ItemStatus,
}

/// 批量处理统计
///
/// `completed + failed == total`；处理过程中被删除的条目计入 `failed`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// 本次快照中的 pending 数量
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub waves: usize,
}

/// 单批处理结果
#[derive(Debug, Default)]
struct WaveResult {
    success: usize,
    failed: usize,
}

/// 按 id 应用状态迁移并广播事件
#[derive(Clone)]
struct Transitions {
    queue: SharedQueue,
    events: broadcast::Sender<QueueEvent>,
}

impl Transitions {
    fn apply(&self, id: ItemId, f: impl FnOnce(&mut Queue) -> Result<()>) -> bool {
        let applied = {
            let mut queue = lock_queue(&self.queue);
            f(&mut queue).map(|_| queue.get(id).map(|item| item.status()))
        };
        match applied {
            Ok(Some(status)) => {
                let _ = self.events.send(QueueEvent { id, status });
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("⚠️ 条目 {} 状态更新被跳过: {}", id, e);
                false
            }
        }
    }

    /// 根据远程调用结果落地终态，返回是否成功
    fn finish(&self, id: ItemId, outcome: Result<SeoResult>) -> bool {
        match outcome {
            Ok(result) => {
                info!("✓ 条目 {} 优化完成: {}", id, result.title);
                self.apply(id, |q| q.complete(id, result))
            }
            Err(e) => {
                let message = e.user_message();
                error!("❌ 条目 {} 优化失败: {}", id, message);
                self.apply(id, |q| q.fail(id, message));
                false
            }
        }
    }
}

/// 运行标记，drop 时复位（包括 future 被取消的情况）
pub(crate) struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    /// 标记已被占用时返回 `None`
    pub(crate) fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }

    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        Ok(Self::try_acquire(flag).ok_or(QueueError::BatchInFlight)?)
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 批量调度器
pub struct BatchScheduler {
    transitions: Transitions,
    provider: Arc<dyn SeoProvider>,
    concurrency_limit: usize,
    in_flight: AtomicBool,
}

impl BatchScheduler {
    pub fn new(queue: SharedQueue, provider: Arc<dyn SeoProvider>, concurrency_limit: usize) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            transitions: Transitions { queue, events },
            provider,
            concurrency_limit: concurrency_limit.max(1),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// 订阅状态迁移事件
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.transitions.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// 处理调用时刻所有 `pending` 条目
    ///
    /// 单条失败不会作为错误返回；只有重入时返回 `BatchInFlight`
    pub async fn run_batch(&self) -> Result<BatchReport> {
        let _guard = InFlightGuard::acquire(&self.in_flight)?;

        let pending = lock_queue(&self.transitions.queue).pending_snapshot();
        let total = pending.len();
        let mut report = BatchReport {
            total,
            ..Default::default()
        };

        if pending.is_empty() {
            info!("队列中没有待处理的文章");
            return Ok(report);
        }

        let limit = self.concurrency_limit;
        let semaphore = Arc::new(Semaphore::new(limit));
        let total_waves = total.div_ceil(limit);

        // 分批处理
        for (wave_index, wave) in pending.chunks(limit).enumerate() {
            let wave_num = wave_index + 1;
            let wave_start = wave_index * limit;
            log_wave_start(wave_num, total_waves, wave_start + 1, wave_start + wave.len(), total);

            let wave_result = self.run_wave(wave, semaphore.clone()).await;

            report.completed += wave_result.success;
            report.failed += wave_result.failed;
            report.waves += 1;

            log_wave_complete(wave_num, wave_result.success, wave.len());
        }

        Ok(report)
    }

    /// 处理单个批次，等待批内所有条目到达终态
    async fn run_wave(&self, wave: &[(ItemId, String)], semaphore: Arc<Semaphore>) -> WaveResult {
        let mut handles = Vec::with_capacity(wave.len());
        let mut result = WaveResult::default();

        for (id, text) in wave {
            let id = *id;

            // 先同步标记为 processing，再发起远程调用
            if !self.transitions.apply(id, |q| q.mark_processing(id)) {
                warn!("⚠️ 条目 {} 已不在待处理状态，跳过", id);
                result.failed += 1;
                continue;
            }

            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    self.transitions.finish(id, Err(crate::error::AppError::llm_api_failed(
                        self.provider.name(),
                        e.to_string(),
                    )));
                    result.failed += 1;
                    continue;
                }
            };

            let provider = self.provider.clone();
            let transitions = self.transitions.clone();
            let text = text.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let outcome = provider.optimize(&text).await;
                transitions.finish(id, outcome)
            });
            handles.push((id, handle));
        }

        // 等待本批所有任务完成
        let outcomes = join_all(
            handles
                .into_iter()
                .map(|(id, handle)| async move { (id, handle.await) }),
        )
        .await;

        for (id, outcome) in outcomes {
            match outcome {
                Ok(true) => result.success += 1,
                Ok(false) => result.failed += 1,
                Err(e) => {
                    error!("[条目 {}] 任务执行失败: {}", id, e);
                    let message = if e.is_panic() {
                        format!("任务执行失败: {}", UNKNOWN_ERROR)
                    } else {
                        format!("任务执行失败: {}", e)
                    };
                    self.transitions.apply(id, |q| q.fail(id, message));
                    result.failed += 1;
                }
            }
        }

        result
    }
}
