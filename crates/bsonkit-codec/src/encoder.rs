//! BSON 编码模块
//!
//! 单遍递归编码: 每个文档先写入 4 字节长度占位，写完所有元素与结尾 NUL
//! 后回填真实长度。深度与体积在每一层都检查，任何错误都会丢弃已写出的
//! 部分输出。

use crate::document::Document;
use crate::options::EncodeOptions;
use crate::path::KeyPath;
use crate::spec::{BinarySubtype, ElementType};
use crate::value::{Binary, BsonValue};
use crate::{EncodingError, EncodingResult, KeyViolation};
use bsonkit_common::ObjectId;
use bytes::{BufMut, Bytes, BytesMut};
use tracing::{debug, trace};

const ID_KEY: &str = "_id";
const INITIAL_CAPACITY: usize = 256;

/// 编码文档
///
/// # Brief
/// 将文档序列化为 BSON 字节
///
/// # Arguments
/// * `doc` - 要编码的文档（只读借用）
/// * `options` - 编码选项
///
/// # Returns
/// 成功返回新分配的字节缓冲, 失败返回错误（不返回部分输出）
pub fn encode(doc: &Document, options: &EncodeOptions) -> EncodingResult<Bytes> {
    encode_with_id(doc, options).map(|(bytes, _)| bytes)
}

/// 编码文档到 Vec<u8>
pub fn encode_to_vec(doc: &Document, options: &EncodeOptions) -> EncodingResult<Vec<u8>> {
    let mut buf = BytesMut::with_capacity(INITIAL_CAPACITY);
    encode_into(doc, options, &mut buf)?;
    Ok(buf.to_vec())
}

/// 编码文档并追加到已有缓冲区
///
/// # Brief
/// 在 `buf` 末尾追加一个完整的 BSON 文档。失败时 `buf` 被截断回调用前的
/// 长度。
///
/// # Arguments
/// * `doc` - 要编码的文档
/// * `options` - 编码选项
/// * `buf` - 目标缓冲区
pub fn encode_into(doc: &Document, options: &EncodeOptions, buf: &mut BytesMut) -> EncodingResult<()> {
    encode_root_into(doc, options, buf).map(|_| ())
}

/// 编码文档并返回生成的 `_id`
///
/// # Brief
/// 与 [`encode`] 相同；当 `options.generate_id` 开启且根文档没有 `_id`
/// 字段时，在根文档末尾追加一个新的 ObjectId，并将其一并返回。
///
/// # Returns
/// `(字节, Some(生成的 id))`，未生成时第二项为 `None`
pub fn encode_with_id(
    doc: &Document,
    options: &EncodeOptions,
) -> EncodingResult<(Bytes, Option<ObjectId>)> {
    let mut buf = BytesMut::with_capacity(INITIAL_CAPACITY);
    let id = encode_root_into(doc, options, &mut buf)?;
    Ok((buf.freeze(), id))
}

/// 编码任意顶层值
///
/// # Brief
/// 顶层只能是文档或数组。数组按文档编码，键为 "0", "1", ...；其他类型
/// 返回 `UnsupportedType`。
pub fn encode_value(value: &BsonValue, options: &EncodeOptions) -> EncodingResult<Bytes> {
    let mut buf = BytesMut::with_capacity(INITIAL_CAPACITY);
    match value {
        BsonValue::Document(doc) => {
            encode_root_into(doc, options, &mut buf)?;
        }
        BsonValue::Array(items) => {
            Encoder::new(&mut buf, options)
                .encode_array(items, 0)
                .map_err(rejected)?;
            trace!(size = buf.len(), items = items.len(), "encoded top-level array");
        }
        other => {
            return Err(rejected(EncodingError::UnsupportedType {
                kind: other.type_name(),
                path: String::new(),
            }));
        }
    }
    Ok(buf.freeze())
}

fn encode_root_into(
    doc: &Document,
    options: &EncodeOptions,
    buf: &mut BytesMut,
) -> EncodingResult<Option<ObjectId>> {
    let original_len = buf.len();
    let generated = (options.generate_id && !doc.contains_key(ID_KEY)).then(ObjectId::new);

    let result = Encoder::new(buf, options).encode_document(doc, 0, generated.as_ref());
    if let Err(e) = result {
        buf.truncate(original_len);
        return Err(rejected(e));
    }

    if let Some(id) = &generated {
        debug!(%id, "appended generated _id to root document");
    }
    Ok(generated)
}

fn rejected(e: EncodingError) -> EncodingError {
    debug!(error = %e, "BSON encode rejected");
    e
}

/// BSON 编码器
///
/// 内部结构，持有输出缓冲与当前键路径。
struct Encoder<'a> {
    buf: &'a mut BytesMut,
    options: &'a EncodeOptions,
    max_size: usize,
    path: KeyPath<'a>,
}

impl<'a> Encoder<'a> {
    fn new(buf: &'a mut BytesMut, options: &'a EncodeOptions) -> Self {
        Self {
            buf,
            options,
            max_size: options.effective_max_size(),
            path: KeyPath::new(),
        }
    }

    fn encode_document(
        &mut self,
        doc: &'a Document,
        depth: usize,
        extra_id: Option<&ObjectId>,
    ) -> EncodingResult<()> {
        let start = self.reserve_length();

        for (key, value) in doc.iter() {
            self.path.push_key(key);
            self.encode_element(key, value, depth)?;
            self.path.pop();
            self.check_partial(start)?;
        }

        if let Some(id) = extra_id {
            self.path.push_key(ID_KEY);
            self.buf.put_u8(ElementType::ObjectId as u8);
            self.write_key(ID_KEY)?;
            self.buf.put_slice(id.as_bytes());
            self.path.pop();
            self.check_partial(start)?;
        }

        self.buf.put_u8(0);
        self.finish_length(start)?;
        trace!(depth, fields = doc.len(), size = self.buf.len() - start, "encoded document level");
        Ok(())
    }

    fn encode_array(&mut self, items: &'a [BsonValue], depth: usize) -> EncodingResult<()> {
        let start = self.reserve_length();
        let mut scratch = [0u8; 20];

        for (index, value) in items.iter().enumerate() {
            self.path.push_index(index);
            self.check_supported(value)?;
            self.buf.put_u8(value.element_type() as u8);
            self.buf.put_slice(format_index(index, &mut scratch));
            self.buf.put_u8(0);
            self.write_payload(value, depth)?;
            self.path.pop();
            self.check_partial(start)?;
        }

        self.buf.put_u8(0);
        self.finish_length(start)
    }

    fn encode_element(&mut self, key: &str, value: &'a BsonValue, depth: usize) -> EncodingResult<()> {
        self.check_supported(value)?;
        self.buf.put_u8(value.element_type() as u8);
        self.write_key(key)?;
        self.write_payload(value, depth)
    }

    fn write_payload(&mut self, value: &'a BsonValue, depth: usize) -> EncodingResult<()> {
        match value {
            BsonValue::Double(n) => self.buf.put_f64_le(*n),
            BsonValue::String(s) => self.write_string(s.as_bytes())?,
            BsonValue::RawString(bytes) => {
                if self.options.validate_utf8 && std::str::from_utf8(bytes).is_err() {
                    return Err(EncodingError::InvalidUtf8 {
                        path: self.path.render(),
                    });
                }
                self.write_string(bytes)?;
            }
            BsonValue::Document(doc) => {
                let child = self.enter(depth)?;
                self.encode_document(doc, child, None)?;
            }
            BsonValue::Array(items) => {
                let child = self.enter(depth)?;
                self.encode_array(items, child)?;
            }
            BsonValue::Binary(binary) => self.write_binary(binary)?,
            BsonValue::ObjectId(id) => self.buf.put_slice(id.as_bytes()),
            BsonValue::Boolean(b) => self.buf.put_u8(*b as u8),
            BsonValue::DateTime(dt) => self.buf.put_i64_le(dt.timestamp_millis()),
            BsonValue::Null | BsonValue::MinKey | BsonValue::MaxKey => {}
            BsonValue::Regex(regex) => {
                self.write_cstring(&regex.pattern, "regex pattern")?;
                self.write_cstring(&regex.options, "regex options")?;
            }
            BsonValue::JavaScriptCode(code) => self.write_string(code.as_bytes())?,
            BsonValue::JavaScriptCodeWithScope(js) => {
                let child = self.enter(depth)?;
                let start = self.reserve_length();
                self.write_string(js.code.as_bytes())?;
                self.encode_document(&js.scope, child, None)?;
                self.finish_length(start)?;
            }
            BsonValue::Int32(n) => self.buf.put_i32_le(*n),
            BsonValue::Timestamp(ts) => {
                // 先 increment 后 time
                self.buf.put_u32_le(ts.increment);
                self.buf.put_u32_le(ts.time);
            }
            BsonValue::Int64(n) => self.buf.put_i64_le(*n),
            BsonValue::Undefined | BsonValue::Symbol(_) => return Err(self.unsupported(value)),
        }
        Ok(())
    }

    fn check_supported(&self, value: &BsonValue) -> EncodingResult<()> {
        if value.element_type().is_deprecated() {
            return Err(self.unsupported(value));
        }
        Ok(())
    }

    fn unsupported(&self, value: &BsonValue) -> EncodingError {
        EncodingError::UnsupportedType {
            kind: value.type_name(),
            path: self.path.render(),
        }
    }

    fn enter(&self, depth: usize) -> EncodingResult<usize> {
        let child = depth + 1;
        if child > self.options.max_depth {
            return Err(EncodingError::DepthExceeded {
                path: self.path.render(),
                max: self.options.max_depth,
            });
        }
        Ok(child)
    }

    fn write_key(&mut self, key: &str) -> EncodingResult<()> {
        let violation = if key.contains('\0') {
            Some(KeyViolation::EmbeddedNul)
        } else if key.starts_with('$') && !self.options.allow_dollar_keys {
            Some(KeyViolation::DollarPrefix)
        } else if key.contains('.') && !self.options.allow_dotted_keys {
            Some(KeyViolation::Dotted)
        } else {
            None
        };
        if let Some(reason) = violation {
            return Err(EncodingError::InvalidKey {
                path: self.path.render(),
                reason,
            });
        }
        self.buf.put_slice(key.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    fn write_cstring(&mut self, s: &str, what: &str) -> EncodingResult<()> {
        if s.contains('\0') {
            return Err(EncodingError::InvalidValue {
                path: self.path.render(),
                reason: format!("{} contains a NUL byte", what),
            });
        }
        self.check_length(s.len() + 1)?;
        self.buf.put_slice(s.as_bytes());
        self.buf.put_u8(0);
        Ok(())
    }

    fn write_string(&mut self, bytes: &[u8]) -> EncodingResult<()> {
        let len = self.check_length(bytes.len() + 1)?;
        self.buf.put_i32_le(len);
        self.buf.put_slice(bytes);
        self.buf.put_u8(0);
        Ok(())
    }

    fn write_binary(&mut self, binary: &Binary) -> EncodingResult<()> {
        let len = binary.bytes.len();
        if binary.subtype == BinarySubtype::BinaryOld {
            let total = self.check_length(len + 4)?;
            self.buf.put_i32_le(total);
            self.buf.put_u8(binary.subtype.into());
            self.buf.put_i32_le(total - 4);
        } else {
            let len = self.check_length(len)?;
            self.buf.put_i32_le(len);
            self.buf.put_u8(binary.subtype.into());
        }
        self.buf.put_slice(&binary.bytes);
        Ok(())
    }

    /// 单个长度字段超过文档上限时，整个文档必然超限，提前失败
    fn check_length(&self, len: usize) -> EncodingResult<i32> {
        if len > self.max_size {
            return Err(EncodingError::SizeExceeded {
                path: self.path.render(),
                size: len,
                max: self.max_size,
            });
        }
        Ok(len as i32)
    }

    fn reserve_length(&mut self) -> usize {
        let start = self.buf.len();
        self.buf.put_i32_le(0);
        start
    }

    /// 已写部分加上结尾 NUL 已超限时提前失败
    fn check_partial(&self, start: usize) -> EncodingResult<()> {
        let size = self.buf.len() - start + 1;
        if size > self.max_size {
            return Err(EncodingError::SizeExceeded {
                path: self.path.render(),
                size,
                max: self.max_size,
            });
        }
        Ok(())
    }

    fn finish_length(&mut self, start: usize) -> EncodingResult<()> {
        let size = self.buf.len() - start;
        if size > self.max_size {
            return Err(EncodingError::SizeExceeded {
                path: self.path.render(),
                size,
                max: self.max_size,
            });
        }
        self.buf[start..start + 4].copy_from_slice(&(size as i32).to_le_bytes());
        Ok(())
    }
}

fn format_index(mut index: usize, scratch: &mut [u8; 20]) -> &[u8] {
    let mut pos = scratch.len();
    loop {
        pos -= 1;
        scratch[pos] = b'0' + (index % 10) as u8;
        index /= 10;
        if index == 0 {
            break;
        }
    }
    &scratch[pos..]
}
