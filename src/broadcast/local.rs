use std::cell::RefCell;
use std::rc::Rc;

use super::{ChangeBroadcast, ChangeHandler, StorageChange, SubscriptionId};

/// 进程内广播
///
/// 由调用方显式 `dispatch`，用于非浏览器环境和测试中模拟"另一个标签页"。
#[derive(Clone, Default)]
pub struct LocalBroadcast {
    hub: Rc<RefCell<Hub>>,
}

#[derive(Default)]
struct Hub {
    next_id: u64,
    handlers: Vec<(SubscriptionId, ChangeHandler)>,
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    /// 投递一次外部变更
    pub fn dispatch(&self, change: &StorageChange) {
        // 先复制快照，处理函数内可以再订阅或退订
        let handlers: Vec<ChangeHandler> = self
            .hub
            .borrow()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            handler(change);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.hub.borrow().handlers.len()
    }
}

impl ChangeBroadcast for LocalBroadcast {
    fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        let mut hub = self.hub.borrow_mut();
        let id = SubscriptionId(hub.next_id);
        hub.next_id += 1;
        hub.handlers.push((id, handler));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.hub
            .borrow_mut()
            .handlers
            .retain(|(existing, _)| *existing != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_reaches_every_subscriber_until_unsubscribed() {
        let broadcast = LocalBroadcast::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = seen.clone();
        let first = broadcast.subscribe(Rc::new(move |change: &StorageChange| {
            log.borrow_mut().push(format!("first:{:?}", change.key));
        }));
        let log = seen.clone();
        broadcast.subscribe(Rc::new(move |change: &StorageChange| {
            log.borrow_mut().push(format!("second:{:?}", change.key));
        }));

        broadcast.dispatch(&StorageChange::new("k", Some("1".into()), None));
        broadcast.unsubscribe(first);
        broadcast.unsubscribe(first);
        broadcast.dispatch(&StorageChange::cleared());

        assert_eq!(
            *seen.borrow(),
            vec![
                "first:Some(\"k\")".to_string(),
                "second:Some(\"k\")".to_string(),
                "second:None".to_string(),
            ]
        );
        assert_eq!(broadcast.subscriber_count(), 1);
    }

    #[test]
    fn handlers_may_unsubscribe_during_dispatch() {
        let broadcast = LocalBroadcast::new();
        let slot: Rc<RefCell<Option<SubscriptionId>>> = Rc::new(RefCell::new(None));

        let inner = broadcast.clone();
        let own_id = slot.clone();
        let id = broadcast.subscribe(Rc::new(move |_: &StorageChange| {
            if let Some(id) = *own_id.borrow() {
                inner.unsubscribe(id);
            }
        }));
        *slot.borrow_mut() = Some(id);

        broadcast.dispatch(&StorageChange::cleared());
        assert_eq!(broadcast.subscriber_count(), 0);
    }
}
