use crate::error::{StoreError, StoreResult};

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

// =========================================================
// 配额错误识别
// =========================================================

/// `DOMException.QUOTA_EXCEEDED_ERR`
const QUOTA_EXCEEDED_CODE: u16 = 22;
const QUOTA_NAME: &str = "QuotaExceededError";
/// Firefox 旧版本使用的配额错误名
const FIREFOX_QUOTA_NAME: &str = "NS_ERROR_DOM_QUOTA_REACHED";

/// 按 DOMException 的 code / name 判断是否为容量耗尽
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn is_quota_signal(code: u16, name: &str) -> bool {
    code == QUOTA_EXCEEDED_CODE || name == QUOTA_NAME || name == FIREFOX_QUOTA_NAME
}

/// 把写入时抛出的 DOMException 归类为 `QuotaExceeded` 或 `WriteFailed`
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn classify_dom_write_error(code: u16, name: &str, message: &str) -> StoreError {
    if is_quota_signal(code, name) {
        StoreError::quota_exceeded(message)
    } else {
        StoreError::write_failed(format!("{}: {}", name, message))
    }
}

// =========================================================
// 抽象后端接口
// =========================================================

/// 同步键值后端：字符串键映射到字符串值
///
/// 与浏览器 `Storage` 接口一一对应。只有写入可能失败；
/// 读取失败等同于键不存在，删除和清空不报告错误。
pub trait StorageBackend {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;
    fn remove_item(&self, key: &str);
    fn clear(&self);
    /// 当前所有物理键
    fn keys(&self) -> Vec<String>;
}

impl<T: StorageBackend + ?Sized> StorageBackend for &T {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) {
        (**self).remove_item(key)
    }

    fn clear(&self) {
        (**self).clear()
    }

    fn keys(&self) -> Vec<String> {
        (**self).keys()
    }
}
