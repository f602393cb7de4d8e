//! `window` 上的 "storage" 事件
//!
//! 浏览器只向"其他"上下文投递该事件，当前上下文自己的写入不会触发。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use wasm_bindgen::prelude::*;

use super::{ChangeBroadcast, ChangeHandler, StorageChange, SubscriptionId};

const STORAGE_EVENT: &str = "storage";

/// 每个订阅对应一个 DOM 事件监听器
///
/// 闭包由本结构体持有；退订或 drop 时从 window 上移除。
#[derive(Default)]
pub struct WindowBroadcast {
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<SubscriptionId, Closure<dyn Fn(web_sys::StorageEvent)>>>,
}

impl WindowBroadcast {
    pub fn new() -> Self {
        Self::default()
    }

    fn detach(closure: &Closure<dyn Fn(web_sys::StorageEvent)>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if window
            .remove_event_listener_with_callback(STORAGE_EVENT, closure.as_ref().unchecked_ref())
            .is_err()
        {
            log_error!("[WindowBroadcast] Failed to remove storage listener");
        }
    }
}

impl ChangeBroadcast for WindowBroadcast {
    fn subscribe(&self, handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let closure = Closure::<dyn Fn(web_sys::StorageEvent)>::new(
            move |event: web_sys::StorageEvent| {
                handler(&StorageChange {
                    key: event.key(),
                    new_value: event.new_value(),
                    old_value: event.old_value(),
                });
            },
        );

        match web_sys::window() {
            Some(window) => {
                if window
                    .add_event_listener_with_callback(
                        STORAGE_EVENT,
                        closure.as_ref().unchecked_ref(),
                    )
                    .is_err()
                {
                    log_error!("[WindowBroadcast] Failed to add storage listener");
                }
            }
            None => log_error!("[WindowBroadcast] No window, cross-tab changes are not observed"),
        }

        self.listeners.borrow_mut().insert(id, closure);
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        // 先取出闭包再移除监听，避免持有 RefCell 借用
        let removed = self.listeners.borrow_mut().remove(&id);
        if let Some(closure) = removed {
            Self::detach(&closure);
        }
    }
}

impl Drop for WindowBroadcast {
    fn drop(&mut self) {
        for (_, closure) in self.listeners.get_mut().drain() {
            Self::detach(&closure);
        }
    }
}
