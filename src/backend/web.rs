//! 浏览器 Storage 后端
//!
//! 直接使用 `web_sys::Storage`，覆盖 localStorage 与 sessionStorage。

use wasm_bindgen::{JsCast, JsValue};
use web_sys::DomException;

use super::{StorageBackend, classify_dom_write_error};
use crate::config::StorageArea;
use crate::error::{StoreError, StoreResult};

/// 浏览器存储区域的句柄
pub struct WebStorage(web_sys::Storage);

impl WebStorage {
    /// `window.localStorage`
    pub fn local() -> StoreResult<Self> {
        Self::open(StorageArea::Local)
    }

    /// `window.sessionStorage`
    pub fn session() -> StoreResult<Self> {
        Self::open(StorageArea::Session)
    }

    pub fn open(area: StorageArea) -> StoreResult<Self> {
        let window = web_sys::window()
            .ok_or_else(|| StoreError::unavailable("no window object").in_op("web.open"))?;

        let storage = match area {
            StorageArea::Local => window.local_storage(),
            StorageArea::Session => window.session_storage(),
        }
        .map_err(|e| StoreError::unavailable(describe(&e)).in_op_with("web.open", area_name(area)))?;

        storage
            .map(Self)
            .ok_or_else(|| {
                StoreError::unavailable("storage area is disabled")
                    .in_op_with("web.open", area_name(area))
            })
    }

    pub fn from_raw(storage: web_sys::Storage) -> Self {
        Self(storage)
    }
}

fn area_name(area: StorageArea) -> &'static str {
    match area {
        StorageArea::Local => "localStorage",
        StorageArea::Session => "sessionStorage",
    }
}

fn describe(err: &JsValue) -> String {
    match err.dyn_ref::<DomException>() {
        Some(ex) => format!("{}: {}", ex.name(), ex.message()),
        None => err.as_string().unwrap_or_else(|| format!("{:?}", err)),
    }
}

/// 按 DOMException 的原生分类识别配额错误，其余归为一般写入失败
fn classify_write_error(err: JsValue) -> StoreError {
    if let Some(ex) = err.dyn_ref::<DomException>() {
        return classify_dom_write_error(ex.code(), &ex.name(), &ex.message());
    }
    StoreError::write_failed(describe(&err))
}

impl StorageBackend for WebStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.0.get_item(key).ok()?
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        self.0
            .set_item(key, value)
            .map_err(|e| classify_write_error(e).in_op_with("web.set_item", key))
    }

    fn remove_item(&self, key: &str) {
        let _ = self.0.remove_item(key);
    }

    fn clear(&self) {
        let _ = self.0.clear();
    }

    fn keys(&self) -> Vec<String> {
        let len = self.0.length().unwrap_or(0);
        (0..len).filter_map(|i| self.0.key(i).ok().flatten()).collect()
    }
}
