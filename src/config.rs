//! 存储门面配置
//!
//! 对应构造参数 `{ storage?, prefix? }`：后端实例直接传给构造函数，
//! 这里只保留可序列化的部分（前缀和浏览器存储区域）。

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// 默认前缀为空：物理键与领域键相同
const DEFAULT_PREFIX: &str = "";

/// 浏览器存储区域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageArea {
    /// `window.localStorage`
    Local,
    /// `window.sessionStorage`
    Session,
}

impl Default for StorageArea {
    fn default() -> Self {
        StorageArea::Local
    }
}

/// 存储门面配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 物理键前缀，物理键 = prefix + 领域键
    pub prefix: String,
    /// 仅在浏览器中由 `LocalStore::open` 使用
    pub area: StorageArea,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            area: StorageArea::default(),
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_area(mut self, area: StorageArea) -> Self {
        self.area = area;
        self
    }

    /// 从 JSON 文本加载配置，缺失字段使用默认值
    pub fn from_json(text: &str) -> StoreResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| StoreError::from(e).in_op("config.from_json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;

    #[test]
    fn defaults_to_empty_prefix_and_local_area() {
        let config = StoreConfig::default();
        assert_eq!(config.prefix, "");
        assert_eq!(config.area, StorageArea::Local);
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = StoreConfig::from_json(r#"{"prefix":"app:"}"#).unwrap();
        assert_eq!(config, StoreConfig::new().with_prefix("app:"));

        let config = StoreConfig::from_json(r#"{"area":"session"}"#).unwrap();
        assert_eq!(config.prefix, "");
        assert_eq!(config.area, StorageArea::Session);
    }

    #[test]
    fn from_json_rejects_malformed_text() {
        let err = StoreConfig::from_json("{prefix:").unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Serialization);
        assert_eq!(err.spans()[0].operation, "config.from_json");
    }
}
