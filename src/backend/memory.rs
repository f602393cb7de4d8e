use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::StorageBackend;
use crate::error::{StoreError, StoreResult};

/// 内存后端
///
/// 克隆出的句柄共享同一份数据，可以模拟同源的多个上下文共用一个存储。
/// 可选的配额以 UTF-16 码元计（键 + 值），与浏览器的计量方式一致。
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    items: BTreeMap<String, String>,
    quota: Option<usize>,
}

fn units(text: &str) -> usize {
    text.encode_utf16().count()
}

impl MemoryInner {
    fn usage(&self) -> usize {
        self.items.iter().map(|(k, v)| units(k) + units(v)).sum()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 带容量上限的内存后端
    pub fn with_quota(quota: usize) -> Self {
        let storage = Self::default();
        storage.inner.borrow_mut().quota = Some(quota);
        storage
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// 当前占用（UTF-16 码元）
    pub fn usage(&self) -> usize {
        self.inner.borrow().usage()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.inner.borrow().items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut inner = self.inner.borrow_mut();

        if let Some(quota) = inner.quota {
            // 覆盖写入时旧值的占用会被释放
            let replaced = inner
                .items
                .get(key)
                .map(|old| units(key) + units(old))
                .unwrap_or(0);
            let required = inner.usage() - replaced + units(key) + units(value);
            if required > quota {
                return Err(StoreError::quota_exceeded(format!(
                    "writing {} would use {} of {} units",
                    key, required, quota
                ))
                .in_op_with("memory.set_item", key));
            }
        }

        inner.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        self.inner.borrow_mut().items.remove(key);
    }

    fn clear(&self) {
        self.inner.borrow_mut().items.clear();
    }

    fn keys(&self) -> Vec<String> {
        self.inner.borrow().items.keys().cloned().collect()
    }
}
