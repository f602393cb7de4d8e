use std::fmt;

// =========================================================
// 错误类型枚举
// =========================================================

/// 错误类型枚举
///
/// 解析失败不在此列：读取时无法解析的值一律视为"无值"。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// 后端容量耗尽（浏览器的 QuotaExceededError）
    QuotaExceeded,
    /// 其他写入失败
    WriteFailed,
    /// 后端不可用（没有 window、存储被禁用等）
    Unavailable,
    /// 值无法序列化，或合并结果无法还原为目标类型
    Serialization,
    /// update 只接受对象形状的值
    NotAnObject,
}

impl StoreErrorKind {
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreErrorKind::QuotaExceeded => "QUOTA_EXCEEDED",
            StoreErrorKind::WriteFailed => "WRITE_FAILED",
            StoreErrorKind::Unavailable => "STORAGE_UNAVAILABLE",
            StoreErrorKind::Serialization => "JSON_ERROR",
            StoreErrorKind::NotAnObject => "NOT_AN_OBJECT",
        }
    }
}

// =========================================================
// 错误上下文追踪
// =========================================================

/// 结构化的错误追踪片段
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorSpan {
    /// 操作名称，如 "store.set", "backend.set_item"
    pub operation: String,
    /// 额外的细节信息，通常是物理键
    pub detail: Option<String>,
}

impl ErrorSpan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: None,
        }
    }

    pub fn with_detail(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            detail: Some(detail.into()),
        }
    }
}

// =========================================================
// 核心错误类型
// =========================================================

/// 存储门面的错误
///
/// - kind: 错误语义
/// - message: 错误消息
/// - source: 原始错误（可选，用于错误链）
/// - spans: 结构化的调用追踪栈
#[derive(Debug)]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
    spans: Vec<ErrorSpan>,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
            spans: Vec::new(),
        }
    }

    // --- Convenience constructors ---

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::QuotaExceeded, message)
    }

    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::WriteFailed, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Serialization, message)
    }

    pub fn not_an_object(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotAnObject, message)
    }

    // --- Context builders ---

    /// 添加操作追踪（无额外细节）
    pub fn in_op(mut self, operation: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::new(operation));
        self
    }

    /// 添加操作追踪（带额外细节）
    pub fn in_op_with(mut self, operation: impl Into<String>, detail: impl Into<String>) -> Self {
        self.spans.push(ErrorSpan::with_detail(operation, detail));
        self
    }

    /// 设置原始错误源
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // --- Accessors ---

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    pub fn is_quota_exceeded(&self) -> bool {
        self.kind == StoreErrorKind::QuotaExceeded
    }

    pub fn error_code(&self) -> &'static str {
        self.kind.error_code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn spans(&self) -> &[ErrorSpan] {
        &self.spans
    }
}

// =========================================================
// Display & Error trait 实现
// =========================================================

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.error_code(), self.message)?;

        if !self.spans.is_empty() {
            write!(f, " | trace: ")?;
            for (i, span) in self.spans.iter().enumerate() {
                if i > 0 {
                    write!(f, " -> ")?;
                }
                write!(f, "{}", span.operation)?;
                if let Some(detail) = &span.detail {
                    write!(f, "({})", detail)?;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

// =========================================================
// 类型转换实现
// =========================================================

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::serialization(e.to_string()).with_source(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn display_includes_code_and_trace() {
        let err = StoreError::write_failed("disk on fire")
            .in_op_with("backend.set_item", "app:profile")
            .in_op("store.set");

        assert_eq!(
            err.to_string(),
            "[WRITE_FAILED] disk on fire | trace: backend.set_item(app:profile) -> store.set"
        );
        assert_eq!(err.spans().len(), 2);
    }

    #[test]
    fn serde_errors_map_to_serialization_with_source() {
        let json_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = StoreError::from(json_err);

        assert_eq!(err.kind(), StoreErrorKind::Serialization);
        assert!(err.source().is_some());
        assert!(!err.is_quota_exceeded());
    }
}
