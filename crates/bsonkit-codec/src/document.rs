//! BSON 文档结构模块
//!
//! 提供有序键值对的 Document API。字段顺序即线上顺序，使用 `IndexMap`
//! 保持插入顺序。

use crate::value::BsonValue;
use compact_str::CompactString;
use indexmap::IndexMap;
use std::fmt;

/// BSON 文档
///
/// 有序的 (键, 值) 序列，键在同一文档内唯一。重复插入同一个键会替换旧值
/// 并保留该键原来的位置。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    fields: IndexMap<CompactString, BsonValue>,
}

impl Document {
    /// 创建空文档
    pub fn new() -> Self {
        Self {
            fields: IndexMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: IndexMap::with_capacity(capacity),
        }
    }

    /// 插入字段
    ///
    /// # Brief
    /// 向文档中插入或更新一个字段
    ///
    /// # Arguments
    /// * `key` - 字段名
    /// * `value` - 字段值
    ///
    /// # Returns
    /// 键已存在时返回被替换的旧值
    pub fn insert(
        &mut self,
        key: impl Into<CompactString>,
        value: impl Into<BsonValue>,
    ) -> Option<BsonValue> {
        self.fields.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&BsonValue> {
        self.fields.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut BsonValue> {
        self.fields.get_mut(key)
    }

    /// 移除字段
    ///
    /// 其余字段保持原有顺序。
    pub fn remove(&mut self, key: &str) -> Option<BsonValue> {
        self.fields.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(|k| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &BsonValue> {
        self.fields.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BsonValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.as_str())
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(|v| v.as_i32())
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(|v| v.as_i64())
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(|v| v.as_bool())
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<BsonValue>> {
        self.get(key).and_then(|v| v.as_array())
    }

    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(|v| v.as_document())
    }

    /// 按路径获取嵌套值
    ///
    /// # Brief
    /// 使用点分隔的路径访问嵌套文档或数组中的值
    ///
    /// # Arguments
    /// * `path` - 点分隔的路径，如 "user.tags.0"
    ///
    /// # Returns
    /// `Some(&BsonValue)` 如果路径存在，否则 `None`
    pub fn get_path(&self, path: &str) -> Option<&BsonValue> {
        let mut parts = path.split('.');
        let mut current = self.fields.get(parts.next()?)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " \"{}\": {}", k, v)?;
        }
        if !self.fields.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "}}")
    }
}

impl From<IndexMap<CompactString, BsonValue>> for Document {
    fn from(fields: IndexMap<CompactString, BsonValue>) -> Self {
        Self { fields }
    }
}

impl<K: Into<CompactString>, V: Into<BsonValue>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a CompactString, &'a BsonValue);
    type IntoIter = indexmap::map::Iter<'a, CompactString, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl IntoIterator for Document {
    type Item = (CompactString, BsonValue);
    type IntoIter = indexmap::map::IntoIter<CompactString, BsonValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// 构造 Document 的便捷宏
///
/// # 示例
///
/// ```rust
/// use bsonkit_codec::doc;
///
/// let empty = doc! {};
/// assert!(empty.is_empty());
///
/// let doc = doc! {
///     "name": "test",
///     "value": 123,
///     "inner": doc! { "ok": true },
/// };
/// assert_eq!(doc.get_i32("value"), Some(123));
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::Document::new()
    };
    ($($key:literal : $value:expr),* $(,)?) => {
        {
            let mut doc = $crate::Document::new();
            $(
                doc.insert($key, $value);
            )*
            doc
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_preserves_order() {
        let mut doc = Document::new();
        doc.insert("b", 1);
        doc.insert("a", 2);
        doc.insert("c", 3);
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);

        let old = doc.insert("a", 20);
        assert_eq!(old, Some(BsonValue::Int32(2)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut doc = crate::doc! { "x": 1, "y": 2, "z": 3 };
        assert_eq!(doc.remove("x"), Some(BsonValue::Int32(1)));
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["y", "z"]);
    }

    #[test]
    fn test_get_path() {
        let doc = crate::doc! {
            "user": crate::doc! {
                "tags": vec!["a", "b"],
            },
        };
        assert_eq!(doc.get_path("user.tags.1").and_then(|v| v.as_str()), Some("b"));
        assert_eq!(doc.get_path("user.missing"), None);
    }

    #[test]
    fn test_display() {
        let doc = crate::doc! { "a": 1, "b": "x" };
        assert_eq!(doc.to_string(), "{ \"a\": 1, \"b\": \"x\" }");
        assert_eq!(Document::new().to_string(), "{}");
    }
}
