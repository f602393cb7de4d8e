//! localstore：同步键值存储之上的类型化门面
//!
//! - `key`: 类型化的键（键名 + 值类型）
//! - `backend`: 同步键值后端（浏览器 Storage / 内存）
//! - `broadcast`: 跨上下文变更广播（window storage 事件 / 进程内）
//! - `store`: 门面本体，get/set/update/clear/clear_all/on_change
//!
//! ```
//! use localstore::{Key, LocalStore, MemoryStorage, StoreConfig};
//! use serde_json::json;
//!
//! const PROFILE: Key<serde_json::Value> = Key::new("profile");
//!
//! let store = LocalStore::new(MemoryStorage::new(), StoreConfig::new().with_prefix("app:"));
//! store.set(&PROFILE, &json!({ "name": "Ann" })).unwrap();
//! store.update(&PROFILE, &json!({ "age": 30 })).unwrap();
//! assert_eq!(store.get(&PROFILE), Some(json!({ "name": "Ann", "age": 30 })));
//! ```

// =========================================================
// 跨平台日志宏
// =========================================================

#[cfg(target_arch = "wasm32")]
macro_rules! log_warn {
    ($($t:tt)*) => (web_sys::console::warn_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_warn {
    ($($t:tt)*) => (eprintln!($($t)*))
}

#[cfg(target_arch = "wasm32")]
macro_rules! log_error {
    ($($t:tt)*) => (web_sys::console::error_1(&format!($($t)*).into()))
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error {
    ($($t:tt)*) => (eprintln!($($t)*))
}

pub mod backend;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod key;
mod listener;
pub mod store;

pub use backend::StorageBackend;
pub use backend::memory::MemoryStorage;
#[cfg(target_arch = "wasm32")]
pub use backend::web::WebStorage;
pub use broadcast::{ChangeBroadcast, LocalBroadcast, NoopBroadcast, StorageChange};
pub use config::{StorageArea, StoreConfig};
pub use error::{StoreError, StoreErrorKind, StoreResult};
pub use key::{Key, StoreKey};
pub use store::{LocalStore, Subscription};
