//! 进程内监听器注册表
//!
//! 回调按领域键分组。不同键的值类型不同，回调以 `Box<dyn Any>` 存放，
//! 通知时再按值类型取回；这是唯一的类型擦除点。

use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

/// 变更回调：(新值, 旧值)
pub(crate) type Callback<V> = Rc<dyn Fn(Option<&V>, Option<&V>)>;

struct ListenerEntry {
    id: u64,
    callback: Box<dyn Any>,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    next_id: u64,
    by_key: HashMap<String, Vec<ListenerEntry>>,
}

impl ListenerRegistry {
    pub(crate) fn add<V: 'static>(&mut self, key: &str, callback: Callback<V>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.by_key
            .entry(key.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                callback: Box::new(callback),
            });
        id
    }

    /// 返回是否真的移除了监听器
    pub(crate) fn remove(&mut self, key: &str, id: u64) -> bool {
        let Some(entries) = self.by_key.get_mut(key) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.by_key.remove(key);
        }
        removed
    }

    /// 取出某个键上值类型为 `V` 的全部回调
    ///
    /// 同名但值类型不同的键注册的回调会被跳过。
    pub(crate) fn matching<V: 'static>(&self, key: &str) -> Vec<Callback<V>> {
        let Some(entries) = self.by_key.get(key) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                let callback = entry.callback.downcast_ref::<Callback<V>>();
                if callback.is_none() {
                    log_warn!(
                        "[LocalStore] Listener {} on '{}' expects a different value type, skipped",
                        entry.id,
                        key
                    );
                }
                callback.cloned()
            })
            .collect()
    }

    pub(crate) fn count(&self, key: &str) -> usize {
        self.by_key.get(key).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn remove_is_idempotent() {
        let mut registry = ListenerRegistry::default();
        let cb: Callback<u32> = Rc::new(|_, _| {});
        let id = registry.add("k", cb);

        assert_eq!(registry.count("k"), 1);
        assert!(registry.remove("k", id));
        assert!(!registry.remove("k", id));
        assert_eq!(registry.count("k"), 0);
    }

    #[test]
    fn matching_skips_callbacks_of_another_value_type() {
        let mut registry = ListenerRegistry::default();
        let hits = Rc::new(Cell::new(0));

        let counter = hits.clone();
        let typed: Callback<u32> = Rc::new(move |_, _| counter.set(counter.get() + 1));
        registry.add("k", typed);
        let other: Callback<String> = Rc::new(|_, _| panic!("wrong listener invoked"));
        registry.add("k", other);

        let callbacks = registry.matching::<u32>("k");
        assert_eq!(callbacks.len(), 1);
        for callback in callbacks {
            callback(Some(&1), None);
        }
        assert_eq!(hits.get(), 1);
        assert!(registry.matching::<u32>("missing").is_empty());
    }
}
