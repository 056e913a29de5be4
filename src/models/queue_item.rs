//! 队列条目
//!
//! 一篇文章从提交到优化完成的全部进度。状态和载荷放在同一个枚举里，
//! `completed` 必带 `result`、`error` 必带错误描述，其它状态两者都没有。

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::models::seo::SeoResult;

/// 条目 ID，入队时分配，进程内不复用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 条目状态（不带载荷），用于日志和事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Processing => "processing",
            ItemStatus::Completed => "completed",
            ItemStatus::Error => "error",
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Error)
    }
}

impl Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 条目状态及其载荷
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemState {
    Pending,
    Processing,
    Completed { result: Box<SeoResult> },
    Error { error: String },
}

impl ItemState {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemState::Pending => ItemStatus::Pending,
            ItemState::Processing => ItemStatus::Processing,
            ItemState::Completed { .. } => ItemStatus::Completed,
            ItemState::Error { .. } => ItemStatus::Error,
        }
    }
}

/// 队列条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    id: ItemId,
    text: String,
    #[serde(flatten)]
    state: ItemState,
}

impl QueueItem {
    pub(crate) fn new(id: ItemId, text: String, state: ItemState) -> Self {
        Self { id, text, state }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// 原始文章内容，创建后不可变
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> &ItemState {
        &self.state
    }

    pub fn status(&self) -> ItemStatus {
        self.state.status()
    }

    pub fn result(&self) -> Option<&SeoResult> {
        match &self.state {
            ItemState::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ItemState::Error { error } => Some(error),
            _ => None,
        }
    }

    /// 列表中显示的标题：有结果用结果标题，否则取正文前 40 个字符
    pub fn display_title(&self) -> String {
        match self.result() {
            Some(result) if !result.title.is_empty() => result.title.clone(),
            _ => crate::utils::logging::truncate_text(&self.text, 40),
        }
    }

    pub(crate) fn set_state(&mut self, state: ItemState) {
        self.state = state;
    }
}
