//! 基准测试配置模块
//!
//! 配置分为三节:
//! - `[bench]` 样本文件、每轮编码次数、轮数
//! - `[encode]` 编码选项，字段与 `EncodeOptions` 一致
//! - `[log]` 日志级别与格式
//!
//! 支持从 TOML 文件加载，缺省字段取默认值。

use crate::{BenchError, BenchResult};
use bsonkit_codec::EncodeOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 基准测试主配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub bench: BenchSection,

    #[serde(default)]
    pub encode: EncodeOptions,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchSection {
    /// JSON 样本文件路径 (默认: fixtures/full_bson.json)
    #[serde(default = "default_fixture")]
    pub fixture: PathBuf,

    /// 每轮任务内的编码次数 (默认: 10000)
    #[serde(default = "default_iterations")]
    pub iterations: usize,

    /// 计时轮数 (默认: 10)
    #[serde(default = "default_runs")]
    pub runs: usize,
}

fn default_fixture() -> PathBuf { PathBuf::from("fixtures/full_bson.json") }
fn default_iterations() -> usize { 10_000 }
fn default_runs() -> usize { 10 }

impl Default for BenchSection {
    fn default() -> Self {
        Self {
            fixture: default_fixture(),
            iterations: default_iterations(),
            runs: default_runs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl BenchConfig {
    /// # Brief
    /// 从 TOML 文件加载配置
    ///
    /// # Arguments
    /// * `path` - 配置文件路径
    ///
    /// # Returns
    /// 解析并校验后的配置
    pub fn from_file(path: &Path) -> BenchResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| BenchError::Config(format!("Failed to read config {:?}: {}", path, e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| BenchError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> BenchResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| BenchError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// 检查取值范围
    pub fn validate(&self) -> BenchResult<()> {
        if self.bench.iterations == 0 {
            return Err(BenchError::Config("bench.iterations must be at least 1".to_string()));
        }
        if self.bench.runs == 0 {
            return Err(BenchError::Config("bench.runs must be at least 1".to_string()));
        }
        if self.encode.max_document_size < bsonkit_codec::spec::MIN_DOCUMENT_SIZE {
            return Err(BenchError::Config(format!(
                "encode.max_document_size must be at least {} bytes",
                bsonkit_codec::spec::MIN_DOCUMENT_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BenchConfig::default();
        assert_eq!(config.bench.iterations, 10_000);
        assert_eq!(config.bench.runs, 10);
        assert_eq!(config.encode, EncodeOptions::default());
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[bench]
iterations = 50

[encode]
allow_dollar_keys = true
max_depth = 8
"#
        )
        .unwrap();

        let config = BenchConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bench.iterations, 50);
        assert_eq!(config.bench.runs, 10);
        assert!(config.encode.allow_dollar_keys);
        assert_eq!(config.encode.max_depth, 8);
        assert_eq!(config.encode.max_document_size, 16 * 1024 * 1024);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_from_file_rejects_zero_runs() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bench]\nruns = 0").unwrap();
        let err = BenchConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, BenchError::Config(_)));
    }

    #[test]
    fn test_from_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = BenchConfig::from_file(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = BenchConfig::default();
        config.bench.runs = 3;
        config.encode.validate_utf8 = true;
        let text = config.to_toml().unwrap();
        let parsed: BenchConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
