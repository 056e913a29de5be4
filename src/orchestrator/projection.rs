//! 当前选中条目的只读视图

use crate::models::{ItemId, SeoResult};
use crate::orchestrator::queue::Queue;

/// 选中条目的结果；未选中或条目已不存在时为 `None`
pub fn current_result(queue: &Queue, selected: Option<ItemId>) -> Option<&SeoResult> {
    selected
        .and_then(|id| queue.get(id))
        .and_then(|item| item.result())
}

/// 选中条目的错误
///
/// 未选中时退回到会话级别的最近错误（例如补充来源失败）
pub fn current_error<'a>(
    queue: &'a Queue,
    selected: Option<ItemId>,
    last_error: Option<&'a str>,
) -> Option<&'a str> {
    match selected {
        Some(id) => queue.get(id).and_then(|item| item.error()),
        None => last_error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue_with_outcomes() -> (Queue, ItemId, ItemId, ItemId) {
        let mut queue = Queue::new();
        let ok = queue.insert_completed(
            "a",
            SeoResult {
                title: "ok".to_string(),
                ..Default::default()
            },
        );
        let failed = queue.enqueue("b").unwrap();
        queue.mark_processing(failed).unwrap();
        queue.fail(failed, "boom").unwrap();
        let pending = queue.enqueue("c").unwrap();
        (queue, ok, failed, pending)
    }

    #[test]
    fn test_current_result() {
        let (queue, ok, failed, pending) = queue_with_outcomes();
        assert_eq!(current_result(&queue, Some(ok)).unwrap().title, "ok");
        assert!(current_result(&queue, Some(failed)).is_none());
        assert!(current_result(&queue, Some(pending)).is_none());
        assert!(current_result(&queue, None).is_none());
        assert!(current_result(&queue, Some(ItemId(404))).is_none());
        assert!(current_result(&Queue::new(), Some(ok)).is_none());
    }

    #[test]
    fn test_current_error_falls_back_only_without_selection() {
        let (queue, ok, failed, _) = queue_with_outcomes();
        let session_error = Some("sessione");

        assert_eq!(current_error(&queue, Some(failed), session_error), Some("boom"));
        assert_eq!(current_error(&queue, Some(ok), session_error), None);
        assert_eq!(current_error(&queue, Some(ItemId(404)), session_error), None);
        assert_eq!(current_error(&queue, None, session_error), Some("sessione"));
        assert_eq!(current_error(&queue, None, None), None);
    }
}
