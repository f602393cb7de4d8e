//! 类型化的存储键
//!
//! 每个键通过关联类型 `Value` 绑定它所存储的值类型，
//! 使 get/set/on_change 在编译期就确定值的形状。

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::{Serialize, de::DeserializeOwned};

/// 定义一个存储键及其值类型
pub trait StoreKey {
    /// 该键对应的值类型
    type Value: Serialize + DeserializeOwned + 'static;

    /// 领域键的字符串形式（不含前缀）
    fn name(&self) -> Cow<'_, str>;
}

impl<K: StoreKey + ?Sized> StoreKey for &K {
    type Value = K::Value;

    fn name(&self) -> Cow<'_, str> {
        (**self).name()
    }
}

/// 通用键：名称 + 值类型标记
///
/// ```
/// use localstore::Key;
///
/// const THEME: Key<String> = Key::new("theme");
/// let draft: Key<String> = Key::dynamic(format!("draft:{}", 42));
/// ```
pub struct Key<V> {
    name: Cow<'static, str>,
    _value: PhantomData<fn() -> V>,
}

impl<V> Key<V> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            _value: PhantomData,
        }
    }

    /// 运行时拼出的键名
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            _value: PhantomData,
        }
    }
}

impl<V> Clone for Key<V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> fmt::Debug for Key<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key").field(&self.name).finish()
    }
}

impl<V> StoreKey for Key<V>
where
    V: Serialize + DeserializeOwned + 'static,
{
    type Value = V;

    fn name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Theme;

    impl StoreKey for Theme {
        type Value = String;

        fn name(&self) -> Cow<'_, str> {
            Cow::Borrowed("theme")
        }
    }

    #[test]
    fn static_and_dynamic_keys_expose_their_name() {
        const COUNT: Key<u32> = Key::new("count");
        let draft: Key<String> = Key::dynamic(format!("draft:{}", 7));

        assert_eq!(COUNT.name(), "count");
        assert_eq!(draft.name(), "draft:7");
        assert_eq!(draft.clone().name(), "draft:7");
    }

    #[test]
    fn references_forward_to_the_key() {
        let theme = Theme;
        let by_ref: &Theme = &theme;
        assert_eq!(StoreKey::name(&by_ref), "theme");
    }
}
