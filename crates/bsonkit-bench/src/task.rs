//! 基准任务模块
//!
//! [`Task`] 描述一个可重复计时的基准任务；[`FullBsonEncoding`] 加载 JSON
//! 样本，转换为文档后在每轮任务中重复编码。

use crate::{BenchError, BenchResult};
use bsonkit_codec::json::document_from_json_slice;
use bsonkit_codec::{encode, Document, EncodeOptions};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// 基准任务生命周期
///
/// 只有 `do_task` 被计时。
pub trait Task: Sized {
    /// 构造任务所需的参数
    type Options;

    /// 任务名称，用于报告
    const NAME: &'static str;

    /// 计时开始前执行一次
    fn setup(options: Self::Options) -> BenchResult<Self>;

    /// 每轮开始前执行
    fn before_task(&mut self) -> BenchResult<()> {
        Ok(())
    }

    fn do_task(&mut self) -> BenchResult<()>;

    /// 每轮结束后执行
    fn after_task(&mut self) -> BenchResult<()> {
        Ok(())
    }

    /// 计时结束后执行一次
    fn teardown(&mut self) -> BenchResult<()> {
        Ok(())
    }

    /// 单轮任务处理的数据量 (MB)
    fn task_size_mb(&self) -> f64;
}

#[derive(Debug, Clone)]
pub struct FullBsonOptions {
    pub fixture: PathBuf,
    pub iterations: usize,
    pub encode: EncodeOptions,
}

/// 完整 BSON 编码任务
#[derive(Debug)]
pub struct FullBsonEncoding {
    doc: Document,
    options: EncodeOptions,
    iterations: usize,
    encoded_size: usize,
    bytes_written: usize,
}

impl FullBsonEncoding {
    /// 样本单次编码后的字节数
    pub fn encoded_size(&self) -> usize {
        self.encoded_size
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }
}

impl Task for FullBsonEncoding {
    type Options = FullBsonOptions;

    const NAME: &'static str = "Full BSON Encoding";

    fn setup(options: Self::Options) -> BenchResult<Self> {
        let raw = fs::read(&options.fixture).map_err(|source| BenchError::FixtureRead {
            path: options.fixture.clone(),
            source,
        })?;
        let doc = document_from_json_slice(&raw).map_err(|source| BenchError::FixtureParse {
            path: options.fixture.clone(),
            source,
        })?;

        // 先编码一次，样本不合法时在计时前失败
        let encoded_size = encode(&doc, &options.encode)?.len();
        info!(
            fixture = ?options.fixture,
            fields = doc.len(),
            encoded_size,
            iterations = options.iterations,
            "Loaded fixture"
        );

        Ok(Self {
            doc,
            options: options.encode,
            iterations: options.iterations,
            encoded_size,
            bytes_written: 0,
        })
    }

    fn before_task(&mut self) -> BenchResult<()> {
        self.bytes_written = 0;
        Ok(())
    }

    fn do_task(&mut self) -> BenchResult<()> {
        for _ in 0..self.iterations {
            let bytes = encode(&self.doc, &self.options)?;
            self.bytes_written += bytes.len();
        }
        Ok(())
    }

    fn after_task(&mut self) -> BenchResult<()> {
        debug!(bytes_written = self.bytes_written, "Task finished");
        Ok(())
    }

    fn task_size_mb(&self) -> f64 {
        (self.encoded_size * self.iterations) as f64 / 1_000_000.0
    }
}
