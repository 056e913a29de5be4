//! 处理队列
//!
//! 有序索引 + 按 id 的哈希表。所有状态迁移都按 id 定位、整条替换，
//! 同一批次中的多个条目可以交错更新而互不覆盖。

use std::collections::HashMap;

use crate::error::{QueueError, Result};
use crate::models::{ItemId, ItemState, ItemStatus, QueueItem, SeoResult};

#[derive(Debug, Default)]
pub struct Queue {
    order: Vec<ItemId>,
    items: HashMap<ItemId, QueueItem>,
    next_id: u64,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> ItemId {
        self.next_id += 1;
        ItemId(self.next_id)
    }

    fn push(&mut self, item: QueueItem) -> ItemId {
        let id = item.id();
        self.order.push(id);
        self.items.insert(id, item);
        id
    }

    /// 新文章入队，状态为 `pending`
    ///
    /// 去掉首尾空白后为空的文本会被拒绝；保存的是原文本，不做修剪
    pub fn enqueue(&mut self, text: impl Into<String>) -> Result<ItemId> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(QueueError::EmptyText.into());
        }
        let id = self.allocate_id();
        Ok(self.push(QueueItem::new(id, text, ItemState::Pending)))
    }

    /// 直接以 `completed` 状态加入（从存档恢复）
    pub fn insert_completed(&mut self, text: impl Into<String>, result: SeoResult) -> ItemId {
        let id = self.allocate_id();
        let state = ItemState::Completed {
            result: Box::new(result),
        };
        self.push(QueueItem::new(id, text.into(), state))
    }

    pub fn remove(&mut self, id: ItemId) -> Option<QueueItem> {
        let item = self.items.remove(&id)?;
        self.order.retain(|existing| *existing != id);
        Some(item)
    }

    pub fn get(&self, id: ItemId) -> Option<&QueueItem> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    /// 按入队顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &QueueItem> + '_ {
        self.order.iter().filter_map(|id| self.items.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn has_pending(&self) -> bool {
        self.iter().any(|item| item.status() == ItemStatus::Pending)
    }

    /// 当前所有 `pending` 条目的快照（按入队顺序）
    pub fn pending_snapshot(&self) -> Vec<(ItemId, String)> {
        self.iter()
            .filter(|item| item.status() == ItemStatus::Pending)
            .map(|item| (item.id(), item.text().to_string()))
            .collect()
    }

    pub fn mark_processing(&mut self, id: ItemId) -> Result<()> {
        self.transition(id, ItemStatus::Pending, ItemState::Processing)
    }

    pub fn complete(&mut self, id: ItemId, result: SeoResult) -> Result<()> {
        let state = ItemState::Completed {
            result: Box::new(result),
        };
        self.transition(id, ItemStatus::Processing, state)
    }

    pub fn fail(&mut self, id: ItemId, error: impl Into<String>) -> Result<()> {
        let state = ItemState::Error {
            error: error.into(),
        };
        self.transition(id, ItemStatus::Processing, state)
    }

    /// 替换已完成条目的结果（补充来源），状态保持 `completed`
    pub fn replace_result(&mut self, id: ItemId, result: SeoResult) -> Result<()> {
        self.transition(
            id,
            ItemStatus::Completed,
            ItemState::Completed {
                result: Box::new(result),
            },
        )
    }

    fn transition(&mut self, id: ItemId, expected: ItemStatus, next: ItemState) -> Result<()> {
        let item = self.items.get_mut(&id).ok_or(QueueError::NotFound(id))?;
        let current = item.status();
        if current != expected {
            return Err(QueueError::InvalidTransition {
                id,
                from: current.as_str(),
                to: next.status().as_str(),
            }
            .into());
        }
        item.set_state(next);
        Ok(())
    }
}
