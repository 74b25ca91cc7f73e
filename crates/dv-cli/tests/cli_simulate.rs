use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dagviolations"))
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("dagviolations_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn read_table(path: &PathBuf) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn simulate_backdoor_with_experiment_file() {
    let config = tmp_path("experiment.json");
    std::fs::write(
        &config,
        r#"{
            "times": 3,
            "num_samples": 1000,
            "methods": ["backdoor.linear_regression", "backdoor.propensity_score_matching"]
        }"#,
    )
    .unwrap();
    let out = tmp_path("backdoor.tsv");

    let output = run(&[
        "simulate",
        "--family",
        "backdoor",
        "--config",
        config.to_str().unwrap(),
        "--seed",
        "7",
        "--output",
        out.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["rows"].as_u64(), Some(24));
    assert_eq!(summary["family"].as_str(), Some("backdoor"));

    let table = read_table(&out);
    assert_eq!(table[0], vec!["", "value", "method", "affected"]);
    // 4 scenarios x 3 iterations x 2 methods
    assert_eq!(table.len(), 1 + 24);
    assert_eq!(table[1][0], "0");
    assert_eq!(table[7][0], "0", "index restarts at each scenario block");
    assert_eq!(table[1][3], "outcome");
    assert_eq!(table[24][3], "treatment_and_common_cause");
    for row in &table[1..] {
        let v: f64 = row[1].parse().unwrap();
        assert!(v.is_finite());
    }

    let _ = std::fs::remove_file(&config);
    let _ = std::fs::remove_file(&out);
}

#[test]
fn simulate_iv_with_flags_is_reproducible() {
    let a = tmp_path("iv_a.tsv");
    let b = tmp_path("iv_b.tsv");
    let args = |path: &PathBuf, threads: &'static str| {
        vec![
            "simulate".to_string(),
            "--family".into(),
            "iv".into(),
            "--times".into(),
            "2".into(),
            "--samples".into(),
            "2000".into(),
            "--beta".into(),
            "4".into(),
            "--threads".into(),
            threads.into(),
            "--output".into(),
            path.to_str().unwrap().to_string(),
        ]
    };
    for (path, threads) in [(&a, "1"), (&b, "2")] {
        let argv = args(path, threads);
        let argv: Vec<&str> = argv.iter().map(String::as_str).collect();
        let output = run(&argv);
        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    }

    let ta = read_table(&a);
    assert_eq!(ta.len(), 1 + 4 * 2);
    assert!(ta[1..].iter().all(|r| r[2] == "iv.instrumental_variable"));
    assert_eq!(ta, read_table(&b));

    let _ = std::fs::remove_file(&a);
    let _ = std::fs::remove_file(&b);
}

#[test]
fn simulate_rejects_bad_input() {
    let out = tmp_path("bad.tsv");
    let output = run(&["simulate", "--family", "frontdoor", "--output", out.to_str().unwrap()]);
    assert!(!output.status.success());

    let config = tmp_path("bad.yaml");
    std::fs::write(&config, "times: 2\nunknown_key: 1\n").unwrap();
    let output = run(&["simulate", "--config", config.to_str().unwrap(), "--output", out.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!out.exists(), "no partial results on failure");

    let _ = std::fs::remove_file(&config);
}
