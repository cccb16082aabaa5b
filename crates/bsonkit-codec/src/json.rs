//! JSON 到 BSON 值的转换模块
//!
//! 将 `serde_json::Value` 转换为 [`BsonValue`]，识别 MongoDB 扩展 JSON v2
//! （relaxed 与 canonical 两种形式）以及旧式的 `$binary`/`$type`、
//! `$regex`/`$options` 包装。对象字段顺序保持不变。
//!
//! 无法识别的 `$` 开头对象按普通文档处理，由编码器按键校验规则决定是否接受。

use crate::document::Document;
use crate::path::KeyPath;
use crate::spec::BinarySubtype;
use crate::value::{Binary, BsonValue, JavaScriptCodeWithScope, Regex, Timestamp};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bsonkit_common::ObjectId;
use chrono::{DateTime, TimeZone, Utc};
use compact_str::CompactString;
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

/// JSON 转换错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// JSON 文本解析失败
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// 扩展 JSON 包装格式不正确
    #[error("Invalid extended JSON at {}: {reason}", crate::display_path(.path))]
    InvalidExtendedJson { path: String, reason: String },

    /// 顶层不是 JSON 对象
    #[error("Expected a JSON object at the top level, got {0}")]
    NotAnObject(&'static str),
}

pub type ConvertResult<T> = Result<T, ConvertError>;

/// 从 JSON 转换为 BsonValue
///
/// # Brief
/// 将 JSON 值转换为 BSON 值，识别扩展 JSON 格式
///
/// # 数字规则
/// - 落在 int32 范围内的整数转为 Int32，否则为 Int64
/// - 超过 i64 范围的无符号整数与小数转为 Double
///
/// # Arguments
/// * `value` - JSON 值
///
/// # Returns
/// 成功返回 BSON 值，扩展 JSON 包装非法时返回带路径的错误
pub fn from_json(value: &JsonValue) -> ConvertResult<BsonValue> {
    let mut path = KeyPath::new();
    convert(value, &mut path)
}

pub fn from_json_str(s: &str) -> ConvertResult<BsonValue> {
    let value: JsonValue = serde_json::from_str(s).map_err(|e| ConvertError::Parse(e.to_string()))?;
    from_json(&value)
}

pub fn from_json_slice(bytes: &[u8]) -> ConvertResult<BsonValue> {
    let value: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| ConvertError::Parse(e.to_string()))?;
    from_json(&value)
}

/// 从 JSON 对象转换为 Document
///
/// 顶层必须是普通对象（不能是扩展 JSON 包装）。
pub fn document_from_json(value: &JsonValue) -> ConvertResult<Document> {
    match from_json(value)? {
        BsonValue::Document(doc) => Ok(doc),
        _ => Err(ConvertError::NotAnObject(json_kind(value))),
    }
}

pub fn document_from_json_str(s: &str) -> ConvertResult<Document> {
    let value: JsonValue = serde_json::from_str(s).map_err(|e| ConvertError::Parse(e.to_string()))?;
    document_from_json(&value)
}

pub fn document_from_json_slice(bytes: &[u8]) -> ConvertResult<Document> {
    let value: JsonValue =
        serde_json::from_slice(bytes).map_err(|e| ConvertError::Parse(e.to_string()))?;
    document_from_json(&value)
}

fn convert<'a>(value: &'a JsonValue, path: &mut KeyPath<'a>) -> ConvertResult<BsonValue> {
    match value {
        JsonValue::Null => Ok(BsonValue::Null),
        JsonValue::Bool(b) => Ok(BsonValue::Boolean(*b)),
        JsonValue::Number(n) => Ok(number(n)),
        JsonValue::String(s) => Ok(BsonValue::String(CompactString::new(s))),
        JsonValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                path.push_index(index);
                out.push(convert(item, path)?);
                path.pop();
            }
            Ok(BsonValue::Array(out))
        }
        JsonValue::Object(obj) => match extended(obj, path)? {
            Some(value) => Ok(value),
            None => convert_object(obj, path).map(BsonValue::Document),
        },
    }
}

fn convert_object<'a>(
    obj: &'a Map<String, JsonValue>,
    path: &mut KeyPath<'a>,
) -> ConvertResult<Document> {
    let mut doc = Document::with_capacity(obj.len());
    for (key, value) in obj {
        path.push_key(key);
        let converted = convert(value, path)?;
        path.pop();
        doc.insert(key.as_str(), converted);
    }
    Ok(doc)
}

fn number(n: &Number) -> BsonValue {
    if let Some(i) = n.as_i64() {
        match i32::try_from(i) {
            Ok(small) => BsonValue::Int32(small),
            Err(_) => BsonValue::Int64(i),
        }
    } else if let Some(u) = n.as_u64() {
        BsonValue::Double(u as f64)
    } else {
        BsonValue::Double(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// 识别扩展 JSON 包装
///
/// 返回 `Ok(None)` 表示这是一个普通文档。
fn extended<'a>(
    obj: &'a Map<String, JsonValue>,
    path: &mut KeyPath<'a>,
) -> ConvertResult<Option<BsonValue>> {
    match obj.len() {
        1 => {
            let Some((key, inner)) = obj.iter().next() else {
                return Ok(None);
            };
            single_key(key, inner, path)
        }
        2 => {
            if let (Some(data), Some(subtype)) = (obj.get("$binary"), obj.get("$type")) {
                let data = expect_str(data, path, "$binary")?;
                let subtype = expect_str(subtype, path, "$type")?;
                return binary(data, subtype, path).map(Some);
            }
            if let (Some(JsonValue::String(pattern)), Some(options)) =
                (obj.get("$regex"), obj.get("$options"))
            {
                let options = expect_str(options, path, "$options")?;
                return Ok(Some(BsonValue::Regex(Regex::new(pattern.as_str(), options))));
            }
            if let (Some(code), Some(scope)) = (obj.get("$code"), obj.get("$scope")) {
                let code = expect_str(code, path, "$code")?;
                let JsonValue::Object(scope) = scope else {
                    return Err(invalid(path, "$scope must be an object"));
                };
                let scope = convert_object(scope, path)?;
                return Ok(Some(BsonValue::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                    code: CompactString::new(code),
                    scope,
                })));
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

fn single_key(key: &str, inner: &JsonValue, path: &KeyPath<'_>) -> ConvertResult<Option<BsonValue>> {
    let value = match key {
        "$oid" => {
            let hex = expect_str(inner, path, key)?;
            let oid = ObjectId::from_hex(hex).map_err(|e| invalid(path, e.to_string()))?;
            BsonValue::ObjectId(oid)
        }
        "$date" => BsonValue::DateTime(date(inner, path)?),
        "$numberInt" => {
            let s = expect_str(inner, path, key)?;
            let n = s
                .parse::<i32>()
                .map_err(|_| invalid(path, format!("'{}' is not a valid int32", s)))?;
            BsonValue::Int32(n)
        }
        "$numberLong" => BsonValue::Int64(number_long(inner, path)?),
        "$numberDouble" => {
            let s = expect_str(inner, path, key)?;
            let n = match s {
                "Infinity" => f64::INFINITY,
                "-Infinity" => f64::NEG_INFINITY,
                "NaN" => f64::NAN,
                other => other
                    .parse::<f64>()
                    .map_err(|_| invalid(path, format!("'{}' is not a valid double", other)))?,
            };
            BsonValue::Double(n)
        }
        "$binary" => match inner {
            JsonValue::Object(fields) => {
                let data = field_str(fields, "base64", path)?;
                let subtype = field_str(fields, "subType", path)?;
                binary(data, subtype, path)?
            }
            JsonValue::String(data) => binary(data, "00", path)?,
            _ => return Err(invalid(path, "$binary must be an object or a string")),
        },
        "$regularExpression" => {
            let JsonValue::Object(fields) = inner else {
                return Err(invalid(path, "$regularExpression must be an object"));
            };
            let pattern = field_str(fields, "pattern", path)?;
            let options = field_str(fields, "options", path)?;
            BsonValue::Regex(Regex::new(pattern, options))
        }
        "$regex" => match inner {
            JsonValue::String(pattern) => BsonValue::Regex(Regex::new(pattern.as_str(), "")),
            // 查询操作符 {"$regex": {...}} 之类，按普通文档处理
            _ => return Ok(None),
        },
        "$timestamp" => {
            let JsonValue::Object(fields) = inner else {
                return Err(invalid(path, "$timestamp must be an object"));
            };
            BsonValue::Timestamp(Timestamp {
                time: field_u32(fields, "t", path)?,
                increment: field_u32(fields, "i", path)?,
            })
        }
        "$code" => BsonValue::JavaScriptCode(CompactString::new(expect_str(inner, path, key)?)),
        "$symbol" => BsonValue::Symbol(CompactString::new(expect_str(inner, path, key)?)),
        "$minKey" => {
            expect_one(inner, path, key)?;
            BsonValue::MinKey
        }
        "$maxKey" => {
            expect_one(inner, path, key)?;
            BsonValue::MaxKey
        }
        "$undefined" => {
            if inner != &JsonValue::Bool(true) {
                return Err(invalid(path, "$undefined must be true"));
            }
            BsonValue::Undefined
        }
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn date(inner: &JsonValue, path: &KeyPath<'_>) -> ConvertResult<DateTime<Utc>> {
    let millis = match inner {
        JsonValue::Number(n) => n
            .as_i64()
            .ok_or_else(|| invalid(path, "$date must be an integer number of milliseconds"))?,
        JsonValue::Object(fields) if fields.len() == 1 => match fields.get("$numberLong") {
            Some(long) => number_long(long, path)?,
            None => return Err(invalid(path, "$date object must be {\"$numberLong\": ...}")),
        },
        JsonValue::String(s) => {
            return DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| invalid(path, format!("'{}' is not an ISO-8601 date: {}", s, e)));
        }
        _ => return Err(invalid(path, "$date must be a number, string or $numberLong")),
    };
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| invalid(path, format!("{} milliseconds is out of range", millis)))
}

fn number_long(inner: &JsonValue, path: &KeyPath<'_>) -> ConvertResult<i64> {
    let s = expect_str(inner, path, "$numberLong")?;
    s.parse::<i64>()
        .map_err(|_| invalid(path, format!("'{}' is not a valid int64", s)))
}

fn binary(data: &str, subtype: &str, path: &KeyPath<'_>) -> ConvertResult<BsonValue> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| invalid(path, format!("invalid base64: {}", e)))?;
    let subtype = u8::from_str_radix(subtype, 16)
        .map_err(|_| invalid(path, format!("'{}' is not a hex binary subtype", subtype)))?;
    Ok(BsonValue::Binary(Binary::new(BinarySubtype::from(subtype), bytes)))
}

fn expect_str<'v>(value: &'v JsonValue, path: &KeyPath<'_>, what: &str) -> ConvertResult<&'v str> {
    value
        .as_str()
        .ok_or_else(|| invalid(path, format!("{} must be a string", what)))
}

fn expect_one(value: &JsonValue, path: &KeyPath<'_>, what: &str) -> ConvertResult<()> {
    if value.as_i64() == Some(1) {
        Ok(())
    } else {
        Err(invalid(path, format!("{} must be 1", what)))
    }
}

fn field_str<'v>(
    fields: &'v Map<String, JsonValue>,
    name: &str,
    path: &KeyPath<'_>,
) -> ConvertResult<&'v str> {
    match fields.get(name) {
        Some(value) => expect_str(value, path, name),
        None => Err(invalid(path, format!("missing field '{}'", name))),
    }
}

fn field_u32(fields: &Map<String, JsonValue>, name: &str, path: &KeyPath<'_>) -> ConvertResult<u32> {
    fields
        .get(name)
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(path, format!("field '{}' must be a uint32", name)))
}

fn invalid(path: &KeyPath<'_>, reason: impl Into<String>) -> ConvertError {
    ConvertError::InvalidExtendedJson {
        path: path.render(),
        reason: reason.into(),
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "extended JSON value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn convert_json(value: JsonValue) -> BsonValue {
        from_json(&value).unwrap()
    }

    #[test]
    fn test_plain_values() {
        let doc = document_from_json(&json!({
            "z": null,
            "b": true,
            "s": "text",
            "arr": [1, "two"],
        }))
        .unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["z", "b", "s", "arr"]);
        assert_eq!(doc.get("z"), Some(&BsonValue::Null));
        assert_eq!(doc.get_bool("b"), Some(true));
        assert_eq!(doc.get_str("s"), Some("text"));
        assert_eq!(doc.get_array("arr").map(|a| a.len()), Some(2));
    }

    #[test]
    fn test_number_narrowing() {
        assert_eq!(convert_json(json!(7)), BsonValue::Int32(7));
        assert_eq!(convert_json(json!(-2147483648i64)), BsonValue::Int32(i32::MIN));
        assert_eq!(convert_json(json!(2147483648i64)), BsonValue::Int64(2_147_483_648));
        assert_eq!(convert_json(json!(u64::MAX)), BsonValue::Double(u64::MAX as f64));
        assert_eq!(convert_json(json!(1.25)), BsonValue::Double(1.25));
    }

    #[test]
    fn test_canonical_numbers() {
        assert_eq!(convert_json(json!({"$numberInt": "42"})), BsonValue::Int32(42));
        assert_eq!(convert_json(json!({"$numberLong": "42"})), BsonValue::Int64(42));
        assert_eq!(
            convert_json(json!({"$numberDouble": "-Infinity"})),
            BsonValue::Double(f64::NEG_INFINITY)
        );
        match convert_json(json!({"$numberDouble": "NaN"})) {
            BsonValue::Double(n) => assert!(n.is_nan()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_object_id() {
        let value = convert_json(json!({"$oid": "507f1f77bcf86cd799439011"}));
        assert_eq!(
            value,
            BsonValue::ObjectId(ObjectId::from_hex("507f1f77bcf86cd799439011").unwrap())
        );
    }

    #[test]
    fn test_invalid_object_id_reports_path() {
        let err = from_json(&json!({"a": [{"$oid": "zz"}]})).unwrap_err();
        match err {
            ConvertError::InvalidExtendedJson { path, .. } => assert_eq!(path, "a[0]"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_dates() {
        let expected = Utc.timestamp_millis_opt(1_356_351_330_501).single().unwrap();
        assert_eq!(
            convert_json(json!({"$date": 1_356_351_330_501i64})),
            BsonValue::DateTime(expected)
        );
        assert_eq!(
            convert_json(json!({"$date": {"$numberLong": "1356351330501"}})),
            BsonValue::DateTime(expected)
        );
        assert_eq!(
            convert_json(json!({"$date": "2012-12-24T12:15:30.501Z"})),
            BsonValue::DateTime(expected)
        );
    }

    #[test]
    fn test_binary_forms() {
        let canonical = convert_json(json!({"$binary": {"base64": "AQID", "subType": "80"}}));
        assert_eq!(
            canonical,
            BsonValue::Binary(Binary::new(BinarySubtype::UserDefined(0x80), vec![1, 2, 3]))
        );

        let legacy = convert_json(json!({"$binary": "AQID", "$type": "02"}));
        assert_eq!(
            legacy,
            BsonValue::Binary(Binary::new(BinarySubtype::BinaryOld, vec![1, 2, 3]))
        );

        assert!(from_json(&json!({"$binary": {"base64": "!!", "subType": "00"}})).is_err());
    }

    #[test]
    fn test_regex_forms() {
        let canonical =
            convert_json(json!({"$regularExpression": {"pattern": "^a", "options": "xi"}}));
        assert_eq!(canonical, BsonValue::Regex(Regex::new("^a", "ix")));

        let legacy = convert_json(json!({"$regex": "^a", "$options": "mi"}));
        assert_eq!(legacy, BsonValue::Regex(Regex::new("^a", "im")));

        // 查询操作符形式不是正则字面量
        let query = convert_json(json!({"$regex": {"$eq": 1}}));
        assert!(query.as_document().is_some());
    }

    #[test]
    fn test_timestamp_and_code() {
        assert_eq!(
            convert_json(json!({"$timestamp": {"t": 10, "i": 2}})),
            BsonValue::Timestamp(Timestamp { time: 10, increment: 2 })
        );
        assert_eq!(
            convert_json(json!({"$code": "f()"})),
            BsonValue::JavaScriptCode("f()".into())
        );
        match convert_json(json!({"$code": "x", "$scope": {"x": 1}})) {
            BsonValue::JavaScriptCodeWithScope(js) => {
                assert_eq!(js.code, "x");
                assert_eq!(js.scope.get_i32("x"), Some(1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_keys_and_deprecated() {
        assert_eq!(convert_json(json!({"$minKey": 1})), BsonValue::MinKey);
        assert_eq!(convert_json(json!({"$maxKey": 1})), BsonValue::MaxKey);
        assert_eq!(convert_json(json!({"$undefined": true})), BsonValue::Undefined);
        assert_eq!(
            convert_json(json!({"$symbol": "s"})),
            BsonValue::Symbol("s".into())
        );
        assert!(from_json(&json!({"$minKey": 2})).is_err());
    }

    #[test]
    fn test_unknown_dollar_key_is_document() {
        let value = convert_json(json!({"$set": {"a": 1}}));
        let doc = value.as_document().unwrap();
        assert!(doc.contains_key("$set"));
    }

    #[test]
    fn test_str_and_slice_entry_points() {
        let doc = document_from_json_str(r#"{"b": 1, "a": {"$numberLong": "5"}}"#).unwrap();
        assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(doc.get_i64("a"), Some(5));

        let value = from_json_slice(br#"[1, 2]"#).unwrap();
        assert_eq!(value.as_array().map(|a| a.len()), Some(2));

        assert!(matches!(from_json_str("{"), Err(ConvertError::Parse(_))));
        assert_eq!(
            document_from_json_str("[1]"),
            Err(ConvertError::NotAnObject("array"))
        );
    }
}
