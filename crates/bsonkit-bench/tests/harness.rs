use bsonkit_bench::{
    run_task, score_task, BenchConfig, BenchError, FullBsonEncoding, FullBsonOptions, Task,
};
use std::fs;
use std::path::PathBuf;

fn shipped_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../fixtures/full_bson.json")
}

#[test]
fn shipped_fixture_runs_end_to_end() {
    let mut task = FullBsonEncoding::setup(FullBsonOptions {
        fixture: shipped_fixture(),
        iterations: 20,
        encode: Default::default(),
    })
    .unwrap();
    assert!(task.encoded_size() > 5);

    let durations = run_task(&mut task, 3).unwrap();
    let score = score_task(&durations, FullBsonEncoding::NAME, task.task_size_mb());
    assert_eq!(score.runs, 3);
    assert!(score.score > 0.0);

    let json = serde_json::to_value(&score).unwrap();
    assert_eq!(json["name"], "Full BSON Encoding");
}

#[test]
fn config_file_drives_task() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("fixture.json");
    fs::write(&fixture, r#"{"a.b": 1, "$c": [1, 2]}"#).unwrap();

    let config_path = dir.path().join("bench.toml");
    fs::write(
        &config_path,
        format!(
            "[bench]\nfixture = {:?}\niterations = 2\nruns = 1\n\n[encode]\nallow_dollar_keys = true\nallow_dotted_keys = true\n",
            fixture.display().to_string()
        ),
    )
    .unwrap();

    let config = BenchConfig::from_file(&config_path).unwrap();
    assert_eq!(config.bench.fixture, fixture);

    let mut task = FullBsonEncoding::setup(FullBsonOptions {
        fixture: config.bench.fixture.clone(),
        iterations: config.bench.iterations,
        encode: config.encode.clone(),
    })
    .unwrap();
    let durations = run_task(&mut task, config.bench.runs).unwrap();
    assert_eq!(durations.len(), 1);
}

#[test]
fn strict_keys_reject_fixture() {
    let dir = tempfile::tempdir().unwrap();
    let fixture = dir.path().join("fixture.json");
    fs::write(&fixture, r#"{"a.b": 1}"#).unwrap();

    let err = FullBsonEncoding::setup(FullBsonOptions {
        fixture,
        iterations: 1,
        encode: Default::default(),
    })
    .unwrap_err();
    assert!(matches!(err, BenchError::Encoding(_)));
    assert!(err.to_string().contains("Invalid key at a.b"));
}
