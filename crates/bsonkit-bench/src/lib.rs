//! # bsonkit-bench
//!
//! BSON 编码基准测试框架:
//! - 任务生命周期 (setup / before_task / do_task / after_task / teardown)
//! - 完整 BSON 编码任务，加载 JSON 样本后重复编码
//! - 多轮计时与得分统计（中位耗时、MB/s）
//! - TOML 配置与命令行参数

pub mod config;
pub mod runner;
pub mod score;
pub mod task;

pub use config::BenchConfig;
pub use runner::run_task;
pub use score::{score_task, TaskScore};
pub use task::{FullBsonEncoding, FullBsonOptions, Task};

use bsonkit_codec::json::ConvertError;
use bsonkit_codec::EncodingError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BenchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Failed to read fixture {path:?}: {source}")]
    FixtureRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid fixture {path:?}: {source}")]
    FixtureParse {
        path: PathBuf,
        source: ConvertError,
    },

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),
}

pub type BenchResult<T> = Result<T, BenchError>;

/// 初始化日志
///
/// # Brief
/// 安装全局 tracing 订阅器。`RUST_LOG` 环境变量优先于配置的级别。
///
/// # Arguments
/// * `level` - 默认日志级别过滤表达式，如 "info" 或 "bsonkit_codec=debug"
/// * `json` - 是否输出 JSON 格式日志
pub fn init_logging(level: &str, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_writer(std::io::stderr))
            .init();
    }
}
