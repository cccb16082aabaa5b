//! # bsonkit-codec
//!
//! 内存文档模型与 BSON 编码器。
//!
//! - **单遍编码**：长度前缀先占位、写完后回填，不做两遍长度预计算
//! - **有界递归**：嵌套深度与文档体积均可配置，超限立即失败
//! - **键校验**：拒绝含 NUL 的键，`$` 前缀与 `.` 可按选项放开
//! - **纯函数**：编码器不持有全局状态，可在多线程中并发调用
//!
//! ## 快速开始
//!
//! ```rust
//! use bsonkit_codec::{doc, encode, EncodeOptions};
//!
//! let doc = doc! {
//!     "name": "bsonkit",
//!     "tags": vec!["x", "y"],
//! };
//! let bytes = encode(&doc, &EncodeOptions::default()).unwrap();
//! assert_eq!(bytes.len() as i32, i32::from_le_bytes(bytes[0..4].try_into().unwrap()));
//! ```

pub mod document;
pub mod encoder;
pub mod json;
pub mod options;
pub mod spec;
pub mod value;

mod path;

pub use document::Document;
pub use encoder::{encode, encode_into, encode_to_vec, encode_value, encode_with_id};
pub use options::{EncodeOptions, EncodeOptionsBuilder};
pub use spec::{BinarySubtype, ElementType};
pub use value::{Binary, BsonValue, JavaScriptCodeWithScope, Regex, Timestamp};

pub use bsonkit_common::ObjectId;

use std::fmt;
use thiserror::Error;

/// BSON 编码错误
///
/// 每个变体都携带出错位置的键路径（如 `a.b[2]`），根文档为空字符串。
/// 任何错误都会终止本次编码，且不返回部分输出。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// 编码器不支持的值类型
    #[error("Unsupported type '{kind}' at {}", display_path(.path))]
    UnsupportedType { kind: &'static str, path: String },

    /// 键不合法
    #[error("Invalid key at {}: {reason}", display_path(.path))]
    InvalidKey { path: String, reason: KeyViolation },

    /// 严格模式下字符串不是合法 UTF-8
    #[error("Invalid UTF-8 in string at {}", display_path(.path))]
    InvalidUtf8 { path: String },

    /// 嵌套层级过深
    #[error("Nesting too deep at {}: max {max}", display_path(.path))]
    DepthExceeded { path: String, max: usize },

    /// 文档体积超出限制
    #[error("Document too large at {}: {size} bytes exceeds max {max}", display_path(.path))]
    SizeExceeded { path: String, size: usize, max: usize },

    /// 值无法按线上格式表示（如正则中含 NUL）
    #[error("Invalid value at {}: {reason}", display_path(.path))]
    InvalidValue { path: String, reason: String },
}

/// 键被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyViolation {
    EmbeddedNul,
    DollarPrefix,
    Dotted,
}

impl fmt::Display for KeyViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyViolation::EmbeddedNul => write!(f, "key contains a NUL byte"),
            KeyViolation::DollarPrefix => write!(f, "key starts with '$'"),
            KeyViolation::Dotted => write!(f, "key contains '.'"),
        }
    }
}

/// 错误种类（不含诊断信息）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedType,
    InvalidKey,
    InvalidUtf8,
    DepthExceeded,
    SizeExceeded,
    InvalidValue,
}

impl EncodingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncodingError::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            EncodingError::InvalidKey { .. } => ErrorKind::InvalidKey,
            EncodingError::InvalidUtf8 { .. } => ErrorKind::InvalidUtf8,
            EncodingError::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            EncodingError::SizeExceeded { .. } => ErrorKind::SizeExceeded,
            EncodingError::InvalidValue { .. } => ErrorKind::InvalidValue,
        }
    }

    /// 出错位置的键路径
    pub fn path(&self) -> &str {
        match self {
            EncodingError::UnsupportedType { path, .. }
            | EncodingError::InvalidKey { path, .. }
            | EncodingError::InvalidUtf8 { path }
            | EncodingError::DepthExceeded { path, .. }
            | EncodingError::SizeExceeded { path, .. }
            | EncodingError::InvalidValue { path, .. } => path,
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "<root>"
    } else {
        path
    }
}

/// 编码操作的 Result 类型别名
pub type EncodingResult<T> = Result<T, EncodingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = EncodingError::InvalidKey {
            path: "a.b[2].$x".to_string(),
            reason: KeyViolation::DollarPrefix,
        };
        assert_eq!(err.to_string(), "Invalid key at a.b[2].$x: key starts with '$'");
        assert_eq!(err.kind(), ErrorKind::InvalidKey);
        assert_eq!(err.path(), "a.b[2].$x");
    }

    #[test]
    fn test_error_display_root() {
        let err = EncodingError::SizeExceeded {
            path: String::new(),
            size: 10,
            max: 5,
        };
        assert_eq!(
            err.to_string(),
            "Document too large at <root>: 10 bytes exceeds max 5"
        );
    }
}
