//! 类型化存储门面
//!
//! 在同步键值后端之上提供 get/set/update/clear 以及变更通知：
//! - 值以 JSON 文本写入，读取时解析失败等同于"无值"
//! - 物理键 = 前缀 + 领域键
//! - set/clear 成功后同步通知本上下文的监听器
//! - on_change 同时订阅跨上下文广播，接收其他标签页的修改

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::backend::StorageBackend;
use crate::broadcast::{self, ChangeBroadcast, ChangeHandler, StorageChange, SubscriptionId};
use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::key::StoreKey;
use crate::listener::{Callback, ListenerRegistry};


// =========================================================
// 存储门面
// =========================================================

pub struct LocalStore<S: StorageBackend> {
    storage: S,
    prefix: String,
    listeners: Rc<RefCell<ListenerRegistry>>,
    broadcast: Rc<dyn ChangeBroadcast>,
}

impl<S: StorageBackend> LocalStore<S> {
    /// 使用当前平台默认的跨上下文广播
    ///
    /// 浏览器中监听 window 的 storage 事件；其他平台没有跨上下文通道，
    /// 只通知本上下文的监听器。需要跨上下文投递时使用 [`LocalStore::with_broadcast`]。
    pub fn new(storage: S, config: StoreConfig) -> Self {
        Self::with_broadcast(storage, config, broadcast::default_broadcast())
    }

    pub fn with_broadcast(
        storage: S,
        config: StoreConfig,
        broadcast: Rc<dyn ChangeBroadcast>,
    ) -> Self {
        Self {
            storage,
            prefix: config.prefix,
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
            broadcast,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn storage_key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    /// 读取值；键不存在或文本无法解析为 `K::Value` 时返回 `None`
    pub fn get<K: StoreKey + ?Sized>(&self, key: &K) -> Option<K::Value> {
        let raw = self.storage.get_item(&self.storage_key(&key.name()));
        parse_stored(raw.as_deref())
    }

    /// 序列化并写入
    ///
    /// 配额耗尽时只记录日志：不写入、不通知，调用正常返回。
    /// 其他写入错误返回给调用方。
    pub fn set<K: StoreKey + ?Sized>(&self, key: &K, value: &K::Value) -> StoreResult<()> {
        let name = key.name();
        let storage_key = self.storage_key(&name);
        let old_value = self.get(key);

        let text = serde_json::to_string(value)
            .map_err(|e| StoreError::from(e).in_op_with("store.set", storage_key.as_str()))?;

        match self.storage.set_item(&storage_key, &text) {
            Ok(()) => {
                self.notify(&name, Some(value), old_value.as_ref());
                Ok(())
            }
            Err(e) if e.is_quota_exceeded() => {
                log_error!(
                    "[LocalStore] Storage quota exceeded, write to '{}' dropped: {}",
                    storage_key,
                    e
                );
                Ok(())
            }
            Err(e) => Err(e.in_op_with("store.set", storage_key)),
        }
    }

    /// 浅合并：`partial` 的字段覆盖当前值的同名字段，再调用 `set`
    ///
    /// 当前值缺失、为 null 或无法解析时从空对象开始。当前值或 `partial`
    /// 不是对象时返回 `NotAnObject`，不写入任何内容。
    pub fn update<K, P>(&self, key: &K, partial: &P) -> StoreResult<()>
    where
        K: StoreKey + ?Sized,
        P: Serialize + ?Sized,
    {
        let storage_key = self.storage_key(&key.name());
        let in_update = |e: StoreError| e.in_op_with("store.update", storage_key.as_str());

        let mut merged = match self.get(key) {
            Some(current) => {
                match serde_json::to_value(&current).map_err(|e| in_update(e.into()))? {
                    // 存储的 null 与缺失等价
                    Value::Null => Map::new(),
                    current => into_object(current, "stored value").map_err(in_update)?,
                }
            }
            None => Map::new(),
        };

        let patch = serde_json::to_value(partial).map_err(|e| in_update(e.into()))?;
        merged.extend(into_object(patch, "partial value").map_err(in_update)?);

        let value: K::Value =
            serde_json::from_value(Value::Object(merged)).map_err(|e| in_update(e.into()))?;
        self.set(key, &value)
    }

    /// 删除键并以 (None, 旧值) 通知监听器
    pub fn clear<K: StoreKey + ?Sized>(&self, key: &K) {
        let name = key.name();
        let old_value = self.get(key);
        self.storage.remove_item(&self.storage_key(&name));
        self.notify::<K::Value>(&name, None, old_value.as_ref());
    }

    /// 有前缀时只删除以前缀开头的物理键，否则清空整个后端。不触发通知。
    pub fn clear_all(&self) {
        if self.prefix.is_empty() {
            self.storage.clear();
            return;
        }

        // 先收集再删除，浏览器 Storage 的键索引会随删除而移动
        let owned: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(&self.prefix))
            .collect();
        for key in owned {
            self.storage.remove_item(&key);
        }
    }

    /// 注册变更监听
    ///
    /// 同时接收本上下文的 set/clear 和其他上下文对同一物理键的修改。
    /// 返回的 [`Subscription`] 被 drop 时不会退订，需显式调用 `unsubscribe`。
    pub fn on_change<K, F>(&self, key: &K, callback: F) -> Subscription
    where
        K: StoreKey + ?Sized,
        F: Fn(Option<&K::Value>, Option<&K::Value>) + 'static,
    {
        let name = key.name().into_owned();
        let callback: Callback<K::Value> = Rc::new(callback);

        let listener_id = self.listeners.borrow_mut().add(&name, callback.clone());
        let handler = cross_context_handler(self.storage_key(&name), callback);
        let broadcast_id = self.broadcast.subscribe(handler);

        Subscription {
            listeners: Rc::downgrade(&self.listeners),
            broadcast: self.broadcast.clone(),
            key: name,
            listener_id,
            broadcast_id,
            active: Cell::new(true),
        }
    }

    /// 某个键上当前注册的本地监听器数量
    pub fn listener_count<K: StoreKey + ?Sized>(&self, key: &K) -> usize {
        self.listeners.borrow().count(&key.name())
    }

    fn notify<V: 'static>(&self, name: &str, new_value: Option<&V>, old_value: Option<&V>) {
        // 释放借用后再回调，回调里可以继续读写本存储或退订
        let callbacks = self.listeners.borrow().matching::<V>(name);
        for callback in callbacks {
            callback(new_value, old_value);
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl LocalStore<crate::backend::web::WebStorage> {
    /// 打开浏览器存储（按 `config.area` 选择 localStorage 或 sessionStorage），
    /// 并监听 window 上的 storage 事件
    pub fn open(config: StoreConfig) -> StoreResult<Self> {
        let storage = crate::backend::web::WebStorage::open(config.area)?;
        Ok(Self::new(storage, config))
    }
}

fn parse_stored<V: DeserializeOwned>(raw: Option<&str>) -> Option<V> {
    serde_json::from_str(raw?).ok()
}

fn into_object(value: Value, what: &str) -> StoreResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::not_an_object(format!(
            "{} is {}, expected an object",
            what,
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// 只响应同一物理键的外部变更，新旧值各自解析
fn cross_context_handler<V>(storage_key: String, callback: Callback<V>) -> ChangeHandler
where
    V: DeserializeOwned + 'static,
{
    Rc::new(move |change: &StorageChange| {
        if change.key.as_deref() != Some(storage_key.as_str()) {
            return;
        }
        let new_value = parse_stored::<V>(change.new_value.as_deref());
        let old_value = parse_stored::<V>(change.old_value.as_deref());
        callback(new_value.as_ref(), old_value.as_ref());
    })
}

// =========================================================
// 订阅句柄
// =========================================================

/// `on_change` 返回的退订句柄
///
/// `unsubscribe` 可重复调用，只有第一次生效。
pub struct Subscription {
    listeners: Weak<RefCell<ListenerRegistry>>,
    broadcast: Rc<dyn ChangeBroadcast>,
    key: String,
    listener_id: u64,
    broadcast_id: SubscriptionId,
    active: Cell<bool>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        // 存储已被 drop 时本地注册表随之释放，只需解除广播订阅
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().remove(&self.key, self.listener_id);
        }
        self.broadcast.unsubscribe(self.broadcast_id);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}
