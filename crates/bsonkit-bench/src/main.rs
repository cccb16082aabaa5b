use anyhow::Context;
use bsonkit_bench::{run_task, score_task, BenchConfig, FullBsonEncoding, FullBsonOptions, Task};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "bsonkit-bench")]
#[command(author = "bsonkit developers")]
#[command(version)]
#[command(about = "Measure full-document BSON encoding throughput")]
struct Args {
    /// JSON fixture to encode
    #[arg(short, long)]
    fixture: Option<PathBuf>,

    /// Encodes per timed run
    #[arg(short, long)]
    iterations: Option<usize>,

    /// Number of timed runs
    #[arg(short, long)]
    runs: Option<usize>,

    #[arg(short, long, env = "BSONKIT_BENCH_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    #[arg(long)]
    allow_dollar_keys: bool,

    #[arg(long)]
    allow_dotted_keys: bool,

    #[arg(long)]
    validate_utf8: bool,

    /// Write the score as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> anyhow::Result<(BenchConfig, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => BenchConfig::from_file(path)?,
            None => BenchConfig::default(),
        };

        if let Some(fixture) = self.fixture {
            config.bench.fixture = fixture;
        }
        if let Some(iterations) = self.iterations {
            config.bench.iterations = iterations;
        }
        if let Some(runs) = self.runs {
            config.bench.runs = runs;
        }
        if let Some(level) = self.log_level {
            config.log.level = level;
        }
        config.encode.allow_dollar_keys |= self.allow_dollar_keys;
        config.encode.allow_dotted_keys |= self.allow_dotted_keys;
        config.encode.validate_utf8 |= self.validate_utf8;

        config.validate()?;
        Ok((config, self.output))
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config_path = args.config.clone();
    let (config, output) = args.into_config()?;

    bsonkit_bench::init_logging(&config.log.level, config.log.json);
    if let Some(path) = &config_path {
        info!("Loaded config from {:?}", path);
    }

    let mut task = FullBsonEncoding::setup(FullBsonOptions {
        fixture: config.bench.fixture.clone(),
        iterations: config.bench.iterations,
        encode: config.encode.clone(),
    })?;

    let durations = run_task(&mut task, config.bench.runs)?;
    let score = score_task(&durations, FullBsonEncoding::NAME, task.task_size_mb());
    println!("{}", score);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&score)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write results to {:?}", path))?;
        info!("Wrote results to {:?}", path);
    }

    Ok(())
}
