//! 投票窗口
//!
//! 固定长度的 FIFO，保存最近的分类结果，用多数票抑制分类器逐帧抖动。
//! 初始时填满"无类别"哨兵，因此从第一个样本起长度就恒为窗口长度。

use std::collections::VecDeque;

/// 投票窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteWindow {
    /// `None` 为哨兵（无类别）
    entries: VecDeque<Option<u8>>,
    capacity: usize,
}

impl VoteWindow {
    /// 创建填满哨兵的窗口
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: std::iter::repeat_n(None, capacity).collect(),
            capacity,
        }
    }

    /// 追加最新样本，淘汰最旧的
    pub fn push(&mut self, class_id: u8) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Some(class_id));
    }

    /// 窗口中等于 `class_id` 的票数
    pub fn count(&self, class_id: u8) -> usize {
        self.entries
            .iter()
            .filter(|entry| **entry == Some(class_id))
            .count()
    }

    /// 从旧到新遍历
    pub fn iter(&self) -> impl Iterator<Item = Option<u8>> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 恢复为全哨兵
    pub fn clear(&mut self) {
        self.entries.iter_mut().for_each(|entry| *entry = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefilled_with_sentinel() {
        let window = VoteWindow::new(20);
        assert_eq!(window.len(), 20);
        assert!(window.iter().all(|e| e.is_none()));
        // 哨兵与类别 0 不同
        assert_eq!(window.count(0), 0);
    }

    #[test]
    fn test_fifo_eviction() {
        let mut window = VoteWindow::new(3);
        window.push(1);
        window.push(2);
        window.push(3);
        window.push(4);
        assert_eq!(
            window.iter().collect::<Vec<_>>(),
            vec![Some(2), Some(3), Some(4)]
        );
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_count() {
        let mut window = VoteWindow::new(20);
        for _ in 0..19 {
            window.push(1);
        }
        assert_eq!(window.count(1), 19);
        window.push(4);
        assert_eq!(window.count(1), 19);
        assert_eq!(window.count(4), 1);
        window.push(4);
        assert_eq!(window.count(1), 18);
    }

    #[test]
    fn test_clear() {
        let mut window = VoteWindow::new(4);
        window.push(2);
        window.clear();
        assert_eq!(window, VoteWindow::new(4));
    }
}
