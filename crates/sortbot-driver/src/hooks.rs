//! 钩子系统（Hook System）
//!
//! 在解码出事件或发送命令帧时触发自定义回调，例如事件监视、报警转发。
//!
//! # 使用示例
//!
//! ```rust
//! use sortbot_driver::hooks::{ChannelEventHook, EventCallback, HookManager};
//! use sortbot_protocol::{Alarm, DecodedEvent};
//! use std::sync::Arc;
//!
//! let mut hooks = HookManager::new();
//! let (hook, rx) = ChannelEventHook::new(16);
//! hooks.add_callback(Arc::new(hook));
//!
//! hooks.trigger_event(&DecodedEvent::Alarm(Alarm { level: 1, kind: 2 }));
//! assert!(rx.try_recv().is_ok());
//! ```

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use sortbot_protocol::DecodedEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// 事件回调 Trait
///
/// 回调在轮询线程中同步执行，实现应尽快返回；
/// 需要耗时处理时使用 [`ChannelEventHook`] 转交给其他线程。
pub trait EventCallback: Send + Sync {
    /// 解码出一个有效帧时调用（寄存器镜像已更新）
    fn on_event(&self, event: &DecodedEvent);

    /// 命令帧写入串口成功后调用（可选）
    fn on_frame_sent(&self, bytes: &[u8]) {
        let _ = bytes;
    }
}

/// 钩子管理器
#[derive(Default)]
pub struct HookManager {
    callbacks: Vec<Arc<dyn EventCallback>>,
}

impl HookManager {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// 添加回调
    pub fn add_callback(&mut self, callback: Arc<dyn EventCallback>) {
        self.callbacks.push(callback);
    }

    /// 移除所有回调
    pub fn clear(&mut self) {
        self.callbacks.clear();
    }

    /// 触发所有事件回调
    pub fn trigger_event(&self, event: &DecodedEvent) {
        for callback in self.callbacks.iter() {
            callback.on_event(event);
        }
    }

    /// 触发所有发送回调
    pub fn trigger_sent(&self, bytes: &[u8]) {
        for callback in self.callbacks.iter() {
            callback.on_frame_sent(bytes);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl std::fmt::Debug for HookManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookManager")
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

/// 基于有界 Channel 的事件钩子
///
/// 队列满时丢弃事件而不是阻塞轮询，丢弃数量可通过 [`dropped_events`](Self::dropped_events) 监控。
pub struct ChannelEventHook {
    tx: Sender<DecodedEvent>,
    dropped_events: Arc<AtomicU64>,
}

impl ChannelEventHook {
    /// 创建钩子及其接收端
    pub fn new(capacity: usize) -> (Self, Receiver<DecodedEvent>) {
        let (tx, rx) = bounded(capacity);
        (
            Self {
                tx,
                dropped_events: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// 丢弃计数器
    pub fn dropped_events(&self) -> &Arc<AtomicU64> {
        &self.dropped_events
    }
}

impl EventCallback for ChannelEventHook {
    fn on_event(&self, event: &DecodedEvent) {
        if let Err(TrySendError::Full(_)) = self.tx.try_send(event.clone()) {
            self.dropped_events.fetch_add(1, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortbot_protocol::Alarm;
    use std::sync::Mutex;

    struct CountingHook {
        events: AtomicU64,
        sent: Mutex<Vec<Vec<u8>>>,
    }

    impl EventCallback for CountingHook {
        fn on_event(&self, _event: &DecodedEvent) {
            self.events.fetch_add(1, Ordering::Relaxed);
        }

        fn on_frame_sent(&self, bytes: &[u8]) {
            self.sent.lock().unwrap().push(bytes.to_vec());
        }
    }

    fn alarm() -> DecodedEvent {
        DecodedEvent::Alarm(Alarm { level: 1, kind: 1 })
    }

    #[test]
    fn test_trigger_all_callbacks() {
        let hook = Arc::new(CountingHook {
            events: AtomicU64::new(0),
            sent: Mutex::new(Vec::new()),
        });
        let mut hooks = HookManager::new();
        hooks.add_callback(hook.clone());
        hooks.add_callback(hook.clone());
        assert_eq!(hooks.len(), 2);

        hooks.trigger_event(&alarm());
        hooks.trigger_sent(&[0xAA, 0x77]);

        assert_eq!(hook.events.load(Ordering::Relaxed), 2);
        assert_eq!(hook.sent.lock().unwrap().len(), 2);

        hooks.clear();
        assert!(hooks.is_empty());
    }

    #[test]
    fn test_channel_hook_drops_when_full() {
        let (hook, rx) = ChannelEventHook::new(1);
        hook.on_event(&alarm());
        hook.on_event(&alarm());
        assert_eq!(hook.dropped_events().load(Ordering::Relaxed), 1);
        assert_eq!(rx.try_recv().unwrap(), alarm());
        assert!(rx.try_recv().is_err());
    }
}
