//! 编码选项模块
//!
//! 每次调用传入的编码配置。可以直接构造、通过 builder 构造，或从 TOML/JSON
//! 配置反序列化（缺省字段取默认值）。

use crate::spec::{DEFAULT_MAX_DEPTH, DEFAULT_MAX_DOCUMENT_SIZE};
use serde::{Deserialize, Serialize};

/// 编码选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// 单个文档（含嵌入文档）允许的最大编码体积 (默认: 16 MiB)
    #[serde(default = "default_max_document_size")]
    pub max_document_size: usize,

    /// 最大嵌套深度，根文档为 0 (默认: 100)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// 是否允许以 `$` 开头的键 (默认: false)
    #[serde(default)]
    pub allow_dollar_keys: bool,

    /// 是否允许包含 `.` 的键 (默认: false)
    #[serde(default)]
    pub allow_dotted_keys: bool,

    /// 严格模式: 校验 RawString 是否为合法 UTF-8 (默认: false)
    #[serde(default)]
    pub validate_utf8: bool,

    /// 根文档缺少 `_id` 时追加一个新生成的 ObjectId (默认: false)
    #[serde(default)]
    pub generate_id: bool,
}

fn default_max_document_size() -> usize { DEFAULT_MAX_DOCUMENT_SIZE }
fn default_max_depth() -> usize { DEFAULT_MAX_DEPTH }

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_document_size: default_max_document_size(),
            max_depth: default_max_depth(),
            allow_dollar_keys: false,
            allow_dotted_keys: false,
            validate_utf8: false,
            generate_id: false,
        }
    }
}

impl EncodeOptions {
    pub fn builder() -> EncodeOptionsBuilder {
        EncodeOptionsBuilder::default()
    }

    /// 放宽键校验: 同时允许 `$` 前缀与 `.`
    pub fn relaxed() -> Self {
        Self {
            allow_dollar_keys: true,
            allow_dotted_keys: true,
            ..Self::default()
        }
    }

    /// 实际生效的体积上限
    ///
    /// 长度前缀为 int32，上限不能超过 `i32::MAX`。
    pub fn effective_max_size(&self) -> usize {
        self.max_document_size.min(i32::MAX as usize)
    }
}

/// EncodeOptions 构造器
#[derive(Debug, Clone, Default)]
pub struct EncodeOptionsBuilder {
    options: EncodeOptions,
}

impl EncodeOptionsBuilder {
    pub fn max_document_size(mut self, size: usize) -> Self {
        self.options.max_document_size = size;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.options.max_depth = depth;
        self
    }

    pub fn allow_dollar_keys(mut self, allow: bool) -> Self {
        self.options.allow_dollar_keys = allow;
        self
    }

    pub fn allow_dotted_keys(mut self, allow: bool) -> Self {
        self.options.allow_dotted_keys = allow;
        self
    }

    pub fn validate_utf8(mut self, validate: bool) -> Self {
        self.options.validate_utf8 = validate;
        self
    }

    pub fn generate_id(mut self, generate: bool) -> Self {
        self.options.generate_id = generate;
        self
    }

    pub fn build(self) -> EncodeOptions {
        self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = EncodeOptions::default();
        assert_eq!(options.max_document_size, 16_777_216);
        assert_eq!(options.max_depth, 100);
        assert!(!options.allow_dollar_keys);
        assert!(!options.allow_dotted_keys);
        assert!(!options.validate_utf8);
        assert!(!options.generate_id);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let options: EncodeOptions =
            serde_json::from_str(r#"{"max_depth": 8, "allow_dollar_keys": true}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert!(options.allow_dollar_keys);
        assert_eq!(options.max_document_size, DEFAULT_MAX_DOCUMENT_SIZE);
    }

    #[test]
    fn test_builder() {
        let options = EncodeOptions::builder()
            .max_document_size(64)
            .allow_dotted_keys(true)
            .validate_utf8(true)
            .build();
        assert_eq!(options.max_document_size, 64);
        assert!(options.allow_dotted_keys);
        assert!(options.validate_utf8);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_effective_max_size_is_clamped() {
        let options = EncodeOptions::builder().max_document_size(usize::MAX).build();
        assert_eq!(options.effective_max_size(), i32::MAX as usize);
    }
}
