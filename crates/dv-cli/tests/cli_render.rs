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

fn write_results(path: &PathBuf) {
    let mut text = String::from("\tvalue\tmethod\taffected\n");
    for (affected, shift) in [("outcome", 0.0), ("outcome_and_treatment", 3.0)] {
        for i in 0..10 {
            let v = 10.0 + shift + i as f64 * 0.1;
            text.push_str(&format!("{i}\t{v}\tbackdoor.linear_regression\t{affected}\n"));
            text.push_str(&format!("{i}\t{}\tbackdoor.propensity_score_matching\t{affected}\n", v - 0.5));
        }
    }
    std::fs::write(path, text).unwrap();
}

#[test]
fn render_writes_box_plot() {
    let input = tmp_path("results.tsv");
    let out = tmp_path("plot.svg");
    write_results(&input);

    let output = run(&[
        "render",
        "--input",
        input.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--reference",
        "10",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches(r#"<g class="box">"#).count(), 4);
    assert_eq!(svg.matches(r#"<g class="reference">"#).count(), 1);
    assert!(svg.contains("propensity_score_matching"));
    assert!(!svg.contains("backdoor."));
    assert!(svg.contains("outcome and treatment"));

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&out);
}

#[test]
fn render_with_theme_and_config() {
    let input = tmp_path("themed.tsv");
    let config = tmp_path("viz.yaml");
    let out = tmp_path("themed.svg");
    write_results(&input);
    std::fs::write(&config, "figure:\n  width: 400\n  height: 300\nlegend:\n  show: false\n").unwrap();

    let output = run(&[
        "render",
        "--input",
        input.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
        "--theme",
        "paper",
        "--config",
        config.to_str().unwrap(),
        "--no-reference",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let svg = std::fs::read_to_string(&out).unwrap();
    assert!(svg.contains(r#"width="400" height="300""#));
    assert!(!svg.contains(r#"<g class="legend">"#));
    assert!(!svg.contains(r#"<g class="reference">"#));

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&config);
    let _ = std::fs::remove_file(&out);
}

#[test]
fn render_reference_defaults_to_ten() {
    let input = tmp_path("default_ref.tsv");
    let implicit = tmp_path("implicit.svg");
    let explicit = tmp_path("explicit.svg");
    write_results(&input);

    let output = run(&["render", "--input", input.to_str().unwrap(), "--output", implicit.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let output = run(&[
        "render",
        "--input",
        input.to_str().unwrap(),
        "--output",
        explicit.to_str().unwrap(),
        "--reference",
        "10",
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let svg = std::fs::read_to_string(&implicit).unwrap();
    assert_eq!(svg.matches(r#"<g class="reference">"#).count(), 1);
    assert_eq!(svg, std::fs::read_to_string(&explicit).unwrap());

    let output = run(&[
        "render",
        "--input",
        input.to_str().unwrap(),
        "--output",
        implicit.to_str().unwrap(),
        "--reference",
        "10",
        "--no-reference",
    ]);
    assert!(!output.status.success());

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&implicit);
    let _ = std::fs::remove_file(&explicit);
}

#[test]
fn render_rejects_bad_input() {
    let input = tmp_path("broken.tsv");
    std::fs::write(&input, "value\tmethod\n1\tx\n").unwrap();
    let out = tmp_path("broken.svg");
    let output = run(&["render", "--input", input.to_str().unwrap(), "--output", out.to_str().unwrap()]);
    assert!(!output.status.success());

    write_results(&input);
    let png = tmp_path("plot.png");
    let output = run(&["render", "--input", input.to_str().unwrap(), "--output", png.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(!png.exists());

    let _ = std::fs::remove_file(&input);
}
