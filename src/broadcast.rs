//! 跨上下文变更广播
//!
//! 宿主（浏览器）在另一个上下文修改同一存储后，会向当前上下文投递
//! "storage changed" 事件。此模块把该通道抽象为 [`ChangeBroadcast`]，
//! 便于在浏览器之外替换为进程内实现。

use std::cell::Cell;
use std::rc::Rc;

mod local;
#[cfg(target_arch = "wasm32")]
mod window;

pub use local::LocalBroadcast;
#[cfg(target_arch = "wasm32")]
pub use window::WindowBroadcast;

/// 一次外部存储变更（原始文本，尚未反序列化）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StorageChange {
    /// 物理键；`None` 表示对方调用了 `clear()`
    pub key: Option<String>,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
}

impl StorageChange {
    pub fn new(
        key: impl Into<String>,
        new_value: Option<String>,
        old_value: Option<String>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            new_value,
            old_value,
        }
    }

    /// 对方清空整个存储
    pub fn cleared() -> Self {
        Self::default()
    }
}

pub type ChangeHandler = Rc<dyn Fn(&StorageChange)>;

/// 广播订阅标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

pub trait ChangeBroadcast {
    fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId;
    /// 未知或已移除的 id 直接忽略
    fn unsubscribe(&self, id: SubscriptionId);
}

/// 不投递任何外部变更的通道
///
/// 非浏览器平台的默认值：没有宿主会发出 storage 事件，处理函数不会被保留。
#[derive(Debug, Default)]
pub struct NoopBroadcast {
    next_id: Cell<u64>,
}

impl NoopBroadcast {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeBroadcast for NoopBroadcast {
    fn subscribe(&self, _handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        id
    }

    fn unsubscribe(&self, _id: SubscriptionId) {}
}

/// 当前目标平台的默认广播通道
#[cfg(target_arch = "wasm32")]
pub(crate) fn default_broadcast() -> Rc<dyn ChangeBroadcast> {
    Rc::new(WindowBroadcast::new())
}

#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn default_broadcast() -> Rc<dyn ChangeBroadcast> {
    Rc::new(NoopBroadcast::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_broadcast_hands_out_distinct_ids_and_drops_handlers() {
        let broadcast = NoopBroadcast::new();
        let handler: ChangeHandler = Rc::new(|_: &StorageChange| panic!("never delivered"));

        let first = broadcast.subscribe(handler.clone());
        let second = broadcast.subscribe(handler.clone());

        assert_ne!(first, second);
        assert_eq!(Rc::strong_count(&handler), 1);
        broadcast.unsubscribe(first);
        broadcast.unsubscribe(first);
    }
}
