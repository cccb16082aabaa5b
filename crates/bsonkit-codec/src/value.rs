//! BSON 值类型定义模块
//!
//! 定义编码器可接受的全部数据类型，每个变体对应一个 BSON 元素类型字节。
//! 使用 `CompactString` 优化短字符串的内存占用。

use crate::document::Document;
use crate::spec::{BinarySubtype, ElementType};
use bsonkit_common::ObjectId;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use std::fmt;

/// BSON 值的枚举类型
///
/// # 支持的类型
///
/// - **标量**: Double, String, RawString, Boolean, Null, Int32, Int64
/// - **复合类型**: Document, Array, JavaScriptCodeWithScope
/// - **扩展类型**: Binary, ObjectId, DateTime, Regex, JavaScriptCode, Timestamp, MinKey, MaxKey
/// - **废弃类型**: Undefined, Symbol（可以表示，但编码器拒绝写出）
///
/// # 示例
///
/// ```rust
/// use bsonkit_codec::BsonValue;
///
/// let value = BsonValue::from("hello");
/// assert_eq!(value.type_name(), "string");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    /// 64 位浮点数
    Double(f64),
    /// UTF-8 字符串
    String(CompactString),
    /// 未经 UTF-8 校验的字节串，按字符串类型编码
    RawString(Vec<u8>),
    /// 嵌入文档
    Document(Document),
    /// 值数组，编码时键为 "0", "1", ...
    Array(Vec<BsonValue>),
    /// 二进制数据
    Binary(Binary),
    /// 已废弃
    Undefined,
    /// 12 字节对象标识符
    ObjectId(ObjectId),
    /// 布尔值
    Boolean(bool),
    /// UTC 日期时间（毫秒精度）
    DateTime(DateTime<Utc>),
    /// 空值
    Null,
    /// 正则表达式
    Regex(Regex),
    /// JavaScript 代码
    JavaScriptCode(CompactString),
    /// 已废弃
    Symbol(CompactString),
    /// 带作用域的 JavaScript 代码
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32 位有符号整数
    Int32(i32),
    /// 内部复制时间戳
    Timestamp(Timestamp),
    /// 64 位有符号整数
    Int64(i64),
    MinKey,
    MaxKey,
}

/// 二进制值
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binary {
    pub subtype: BinarySubtype,
    pub bytes: Vec<u8>,
}

impl Binary {
    pub fn new(subtype: BinarySubtype, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype,
            bytes: bytes.into(),
        }
    }
}

/// 正则表达式值
///
/// 选项字符按字母序存储。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Regex {
    pub pattern: CompactString,
    pub options: CompactString,
}

impl Regex {
    /// 创建正则表达式值
    ///
    /// # Brief
    /// 构造正则值，并将选项字符排序
    ///
    /// # Arguments
    /// * `pattern` - 正则表达式模式
    /// * `options` - 正则表达式选项（如 i, m, s, x）
    pub fn new(pattern: impl Into<CompactString>, options: &str) -> Self {
        let mut chars: Vec<char> = options.chars().collect();
        chars.sort_unstable();
        Self {
            pattern: pattern.into(),
            options: chars.into_iter().collect(),
        }
    }
}

/// 带作用域的 JavaScript 代码
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    pub code: CompactString,
    pub scope: Document,
}

/// 复制时间戳
///
/// 线上格式为先 increment 后 time，均为小端 u32。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    /// 秒级时间
    pub time: u32,
    /// 同一秒内的序号
    pub increment: u32,
}

impl BsonValue {
    /// 获取值对应的 BSON 元素类型
    pub fn element_type(&self) -> ElementType {
        match self {
            BsonValue::Double(_) => ElementType::Double,
            BsonValue::String(_) | BsonValue::RawString(_) => ElementType::String,
            BsonValue::Document(_) => ElementType::EmbeddedDocument,
            BsonValue::Array(_) => ElementType::Array,
            BsonValue::Binary(_) => ElementType::Binary,
            BsonValue::Undefined => ElementType::Undefined,
            BsonValue::ObjectId(_) => ElementType::ObjectId,
            BsonValue::Boolean(_) => ElementType::Boolean,
            BsonValue::DateTime(_) => ElementType::DateTime,
            BsonValue::Null => ElementType::Null,
            BsonValue::Regex(_) => ElementType::RegularExpression,
            BsonValue::JavaScriptCode(_) => ElementType::JavaScriptCode,
            BsonValue::Symbol(_) => ElementType::Symbol,
            BsonValue::JavaScriptCodeWithScope(_) => ElementType::JavaScriptCodeWithScope,
            BsonValue::Int32(_) => ElementType::Int32,
            BsonValue::Timestamp(_) => ElementType::Timestamp,
            BsonValue::Int64(_) => ElementType::Int64,
            BsonValue::MinKey => ElementType::MinKey,
            BsonValue::MaxKey => ElementType::MaxKey,
        }
    }

    /// 获取值的类型名称
    ///
    /// # Brief
    /// 返回类型名称字符串，用于错误信息
    pub fn type_name(&self) -> &'static str {
        match self {
            BsonValue::Double(_) => "double",
            BsonValue::String(_) => "string",
            BsonValue::RawString(_) => "string",
            BsonValue::Document(_) => "document",
            BsonValue::Array(_) => "array",
            BsonValue::Binary(_) => "binary",
            BsonValue::Undefined => "undefined",
            BsonValue::ObjectId(_) => "objectId",
            BsonValue::Boolean(_) => "boolean",
            BsonValue::DateTime(_) => "dateTime",
            BsonValue::Null => "null",
            BsonValue::Regex(_) => "regex",
            BsonValue::JavaScriptCode(_) => "javascript",
            BsonValue::Symbol(_) => "symbol",
            BsonValue::JavaScriptCodeWithScope(_) => "javascriptWithScope",
            BsonValue::Int32(_) => "int32",
            BsonValue::Timestamp(_) => "timestamp",
            BsonValue::Int64(_) => "int64",
            BsonValue::MinKey => "minKey",
            BsonValue::MaxKey => "maxKey",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BsonValue::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BsonValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            BsonValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// 尝试获取 i64 值
    ///
    /// Int32 与 Int64 都会返回。
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            BsonValue::Int32(n) => Some(*n as i64),
            BsonValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            BsonValue::Double(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BsonValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<BsonValue>> {
        match self {
            BsonValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            BsonValue::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// 获取指定键的值
    ///
    /// # Brief
    /// 从文档中获取指定键的值，或从数组中获取指定索引的值
    ///
    /// # Arguments
    /// * `key` - 键名（文档）或索引字符串（数组）
    pub fn get(&self, key: &str) -> Option<&BsonValue> {
        match self {
            BsonValue::Document(doc) => doc.get(key),
            BsonValue::Array(arr) => key.parse::<usize>().ok().and_then(|i| arr.get(i)),
            _ => None,
        }
    }
}

impl Default for BsonValue {
    fn default() -> Self {
        BsonValue::Null
    }
}

impl fmt::Display for BsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BsonValue::Double(n) => write!(f, "{}", n),
            BsonValue::String(s) => write!(f, "\"{}\"", s),
            BsonValue::RawString(b) => write!(f, "\"{}\"", String::from_utf8_lossy(b)),
            BsonValue::Document(doc) => write!(f, "{}", doc),
            BsonValue::Array(arr) => {
                write!(f, "[")?;
                for (i, v) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            BsonValue::Binary(b) => {
                write!(f, "Binary({:#04x}, {} bytes)", u8::from(b.subtype), b.bytes.len())
            }
            BsonValue::Undefined => write!(f, "undefined"),
            BsonValue::ObjectId(id) => write!(f, "ObjectId(\"{}\")", id),
            BsonValue::Boolean(b) => write!(f, "{}", b),
            BsonValue::DateTime(dt) => write!(f, "DateTime(\"{}\")", dt.to_rfc3339()),
            BsonValue::Null => write!(f, "null"),
            BsonValue::Regex(r) => write!(f, "/{}/{}", r.pattern, r.options),
            BsonValue::JavaScriptCode(code) => write!(f, "Code(\"{}\")", code),
            BsonValue::Symbol(s) => write!(f, "Symbol(\"{}\")", s),
            BsonValue::JavaScriptCodeWithScope(js) => {
                write!(f, "Code(\"{}\", {})", js.code, js.scope)
            }
            BsonValue::Int32(n) => write!(f, "{}", n),
            BsonValue::Timestamp(ts) => write!(f, "Timestamp({}, {})", ts.time, ts.increment),
            BsonValue::Int64(n) => write!(f, "NumberLong({})", n),
            BsonValue::MinKey => write!(f, "MinKey"),
            BsonValue::MaxKey => write!(f, "MaxKey"),
        }
    }
}

impl From<bool> for BsonValue {
    fn from(v: bool) -> Self {
        BsonValue::Boolean(v)
    }
}

impl From<i32> for BsonValue {
    fn from(v: i32) -> Self {
        BsonValue::Int32(v)
    }
}

impl From<i64> for BsonValue {
    fn from(v: i64) -> Self {
        BsonValue::Int64(v)
    }
}

impl From<f64> for BsonValue {
    fn from(v: f64) -> Self {
        BsonValue::Double(v)
    }
}

impl From<&str> for BsonValue {
    fn from(v: &str) -> Self {
        BsonValue::String(CompactString::from(v))
    }
}

impl From<String> for BsonValue {
    fn from(v: String) -> Self {
        BsonValue::String(CompactString::from(v))
    }
}

impl From<CompactString> for BsonValue {
    fn from(v: CompactString) -> Self {
        BsonValue::String(v)
    }
}

impl From<Binary> for BsonValue {
    fn from(v: Binary) -> Self {
        BsonValue::Binary(v)
    }
}

impl From<ObjectId> for BsonValue {
    fn from(v: ObjectId) -> Self {
        BsonValue::ObjectId(v)
    }
}

impl From<DateTime<Utc>> for BsonValue {
    fn from(v: DateTime<Utc>) -> Self {
        BsonValue::DateTime(v)
    }
}

impl From<Regex> for BsonValue {
    fn from(v: Regex) -> Self {
        BsonValue::Regex(v)
    }
}

impl From<Timestamp> for BsonValue {
    fn from(v: Timestamp) -> Self {
        BsonValue::Timestamp(v)
    }
}

impl From<Document> for BsonValue {
    fn from(v: Document) -> Self {
        BsonValue::Document(v)
    }
}

impl<T: Into<BsonValue>> From<Vec<T>> for BsonValue {
    fn from(v: Vec<T>) -> Self {
        BsonValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<BsonValue>> From<Option<T>> for BsonValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(BsonValue::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_options_sorted() {
        let r = Regex::new("^a", "xmi");
        assert_eq!(r.options, "imx");
        assert_eq!(r.pattern, "^a");
    }

    #[test]
    fn test_element_type() {
        assert_eq!(BsonValue::from(1i32).element_type(), ElementType::Int32);
        assert_eq!(BsonValue::from(1i64).element_type(), ElementType::Int64);
        assert_eq!(
            BsonValue::RawString(b"abc".to_vec()).element_type(),
            ElementType::String
        );
        assert_eq!(BsonValue::MinKey.element_type() as u8, 0xFF);
    }

    #[test]
    fn test_from_vec_builds_array() {
        let value = BsonValue::from(vec!["x", "y"]);
        assert_eq!(value.get("1").and_then(|v| v.as_str()), Some("y"));
        assert_eq!(value.get("2"), None);
    }

    #[test]
    fn test_from_option() {
        assert!(BsonValue::from(None::<i32>).is_null());
        assert_eq!(BsonValue::from(Some(3)).as_i32(), Some(3));
    }
}
