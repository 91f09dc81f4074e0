use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_uf"))
}

fn repo_root() -> PathBuf {
    // crates/uf-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_path(filename: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("uf_cli_{}_{}_{}", std::process::id(), nanos, filename));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn assert_snapshot_contract(v: &serde_json::Value, bins: usize) {
    let solution = v.get("solution").and_then(|x| x.as_array()).expect("solution array");
    assert_eq!(solution.len(), bins, "solution length must equal bin count");
    assert!(solution.iter().all(|x| x.as_f64().is_some_and(f64::is_finite)));

    let migration = v.get("migration").and_then(|x| x.as_array()).expect("migration array");
    assert_eq!(migration.len(), bins * bins, "migration must be n x n row-major");

    let hist = v
        .get("measured_histogram")
        .and_then(|x| x.as_array())
        .expect("measured_histogram array");
    let total: f64 = hist.iter().map(|x| x.as_f64().unwrap()).sum();
    assert_eq!(total, 120.0, "histogram must count every fixture row");

    let bin_list = v.get("bins").and_then(|x| x.as_array()).expect("bins array");
    assert_eq!(bin_list.len(), bins);
}

#[test]
fn test_unfold_writes_snapshot_to_stdout() {
    let fixture = fixture_path("calibration_1d.csv");
    let out = run(&[
        "unfold",
        "--input",
        fixture.to_str().unwrap(),
        "--bins",
        "4",
        "--dims",
        "1",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).expect("stdout is JSON");
    assert_snapshot_contract(&v, 4);
}

#[test]
fn test_unfold_writes_snapshot_to_file() {
    let fixture = fixture_path("calibration_1d.csv");
    let out_path = tmp_path("snapshot.json");
    let out = run(&[
        "unfold",
        "--input",
        fixture.to_str().unwrap(),
        "--bins",
        "5",
        "--binning",
        "hybrid",
        "--center",
        "median",
        "--regularization",
        "mass-center",
        "--alpha",
        "0.01",
        "--output",
        out_path.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let text = std::fs::read_to_string(&out_path).expect("output file written");
    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_snapshot_contract(&v, 5);
    let _ = std::fs::remove_file(&out_path);
}

#[test]
fn test_unfold_rejects_bin_count_below_minimum() {
    let fixture = fixture_path("calibration_1d.csv");
    let out = run(&["unfold", "--input", fixture.to_str().unwrap(), "--bins", "1"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Configuration"), "stderr: {stderr}");
}

#[test]
fn test_unfold_rejects_missing_file() {
    let out = run(&["unfold", "--input", "/nonexistent/data.csv"]);
    assert!(!out.status.success());
}

#[test]
fn test_unfold_rejects_unknown_policy() {
    let fixture = fixture_path("calibration_1d.csv");
    let out =
        run(&["unfold", "--input", fixture.to_str().unwrap(), "--binning", "bogus"]);
    assert!(!out.status.success());
}
