//! 得分统计
//!
//! 得分为单轮数据量除以中位耗时 (MB/s)。

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 单个任务的得分
#[derive(Debug, Clone, Serialize)]
pub struct TaskScore {
    pub name: &'static str,
    pub runs: usize,
    pub median_seconds: f64,
    pub p10_seconds: f64,
    pub p90_seconds: f64,
    /// MB/s
    pub score: f64,
}

impl fmt::Display for TaskScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TEST: {} -- Score: {:.3} MB/s, Median Iteration Time: {:.6}s ({} runs)",
            self.name, self.score, self.median_seconds, self.runs
        )
    }
}

/// 取第 n 百分位耗时，`durations` 须已升序排列且非空
pub fn percentile(durations: &[Duration], n: f64) -> Duration {
    let index = (durations.len() as f64 * (n / 100.0)) as usize;
    durations[index.max(1).min(durations.len()) - 1]
}

/// 计算任务得分
///
/// # Arguments
/// * `durations` - 升序排列的每轮耗时，非空
/// * `name` - 任务名称
/// * `task_size_mb` - 单轮数据量 (MB)
pub fn score_task(durations: &[Duration], name: &'static str, task_size_mb: f64) -> TaskScore {
    let median = percentile(durations, 50.0);
    let median_seconds = median.as_secs_f64();
    let score = if median_seconds > 0.0 {
        task_size_mb / median_seconds
    } else {
        f64::INFINITY
    };

    TaskScore {
        name,
        runs: durations.len(),
        median_seconds,
        p10_seconds: percentile(durations, 10.0).as_secs_f64(),
        p90_seconds: percentile(durations, 90.0).as_secs_f64(),
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn millis(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&ms| Duration::from_millis(ms)).collect()
    }

    #[test]
    fn test_percentile() {
        let durations = millis(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        assert_eq!(percentile(&durations, 50.0), Duration::from_millis(5));
        assert_eq!(percentile(&durations, 10.0), Duration::from_millis(1));
        assert_eq!(percentile(&durations, 90.0), Duration::from_millis(9));
        assert_eq!(percentile(&durations, 100.0), Duration::from_millis(10));

        let single = millis(&[7]);
        assert_eq!(percentile(&single, 50.0), Duration::from_millis(7));
    }

    #[test]
    fn test_score() {
        let durations = millis(&[250, 500, 1000]);
        let score = score_task(&durations, "encode", 10.0);
        assert_eq!(score.runs, 3);
        assert_eq!(score.median_seconds, 0.25);
        assert_eq!(score.score, 40.0);
        assert!(score.to_string().starts_with("TEST: encode -- Score: 40.000 MB/s"));
    }
}
