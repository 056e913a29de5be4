//! 调试日志总线
//!
//! 保存最近的若干条调试记录，并把每次变化推送给订阅者（例如调试面板）。
//! 不是全局单例：由调用方创建后以引用（clone）的方式传给各个服务。

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// 默认保留的记录条数
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    Info,
    Warn,
    Error,
}

/// 一条调试记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugEntry {
    pub timestamp: String,
    pub level: DebugLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonValue>,
}

#[derive(Clone)]
pub struct DebugLog {
    entries: Arc<Mutex<VecDeque<DebugEntry>>>,
    capacity: usize,
    sender: broadcast::Sender<Vec<DebugEntry>>,
}

impl DebugLog {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(16);
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
            sender,
        }
    }

    /// 记录一条日志，同时输出到 tracing 并通知订阅者
    pub fn log(&self, level: DebugLevel, message: impl Into<String>, details: Option<JsonValue>) {
        let entry = DebugEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level,
            message: message.into(),
            details,
        };

        let details_text = entry
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        match level {
            DebugLevel::Info => info!("{} {}", entry.message, details_text),
            DebugLevel::Warn => warn!("{} {}", entry.message, details_text),
            DebugLevel::Error => error!("{} {}", entry.message, details_text),
        }

        let snapshot = {
            let mut entries = self.lock();
            entries.push_back(entry);
            while entries.len() > self.capacity {
                entries.pop_front();
            }
            entries.iter().cloned().collect::<Vec<_>>()
        };

        // 没有订阅者时 send 会返回错误，忽略即可
        let _ = self.sender.send(snapshot);
    }

    pub fn info(&self, message: impl Into<String>, details: Option<JsonValue>) {
        self.log(DebugLevel::Info, message, details);
    }

    pub fn warn(&self, message: impl Into<String>, details: Option<JsonValue>) {
        self.log(DebugLevel::Warn, message, details);
    }

    pub fn error(&self, message: impl Into<String>, details: Option<JsonValue>) {
        self.log(DebugLevel::Error, message, details);
    }

    /// 订阅日志快照
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<DebugEntry>> {
        self.sender.subscribe()
    }

    pub fn entries(&self) -> Vec<DebugEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn error_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.level == DebugLevel::Error)
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
        let _ = self.sender.send(Vec::new());
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<DebugEntry>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DebugLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
