//! 任务计时执行

use crate::task::Task;
use crate::BenchResult;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// 执行基准任务
///
/// # Brief
/// 执行 `runs` 轮 before_task / do_task / after_task，只对 `do_task` 计时，
/// 最后调用 `teardown`。
///
/// # Arguments
/// * `task` - 已完成 setup 的任务
/// * `runs` - 计时轮数
///
/// # Returns
/// 升序排列的每轮耗时
pub fn run_task<T: Task>(task: &mut T, runs: usize) -> BenchResult<Vec<Duration>> {
    let mut durations = Vec::with_capacity(runs);

    for run in 0..runs {
        task.before_task()?;
        let timer = Instant::now();
        task.do_task()?;
        let elapsed = timer.elapsed();
        durations.push(elapsed);
        task.after_task()?;
        debug!(run, elapsed_ms = elapsed.as_secs_f64() * 1000.0, "Run complete");
    }

    task.teardown()?;
    durations.sort();
    info!(task = T::NAME, runs, "Benchmark finished");
    Ok(durations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<&'static str>,
    }

    impl Task for Recorder {
        type Options = ();
        const NAME: &'static str = "recorder";

        fn setup(_options: ()) -> BenchResult<Self> {
            Ok(Self::default())
        }

        fn before_task(&mut self) -> BenchResult<()> {
            self.events.push("before");
            Ok(())
        }

        fn do_task(&mut self) -> BenchResult<()> {
            self.events.push("do");
            Ok(())
        }

        fn after_task(&mut self) -> BenchResult<()> {
            self.events.push("after");
            Ok(())
        }

        fn teardown(&mut self) -> BenchResult<()> {
            self.events.push("teardown");
            Ok(())
        }

        fn task_size_mb(&self) -> f64 {
            0.0
        }
    }

    #[test]
    fn test_lifecycle_order() {
        let mut task = Recorder::setup(()).unwrap();
        let durations = run_task(&mut task, 2).unwrap();

        assert_eq!(durations.len(), 2);
        assert!(durations[0] <= durations[1]);
        assert_eq!(
            task.events,
            vec!["before", "do", "after", "before", "do", "after", "teardown"]
        );
    }
}
