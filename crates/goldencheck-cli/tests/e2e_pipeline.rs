//! End-to-end runs with shell scripts standing in for reference computations.
//!
//! Scripts are launched as `sh <script> --input <path> --format json`, so the
//! numeric cross-check and the batch health-check run against real processes.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const SUITE: &str = r#"{
  "suite": "e2e",
  "version": 3,
  "templates": {},
  "cases": [
    {
      "id": "N01",
      "prompt": "How long does the boss take to kill?",
      "required_keywords": ["TTK"],
      "required_references": [],
      "preferred_script": "ttk.sh",
      "script_validation": {
        "input": "inputs/boss.json",
        "extract": [
          {"name": "ttk", "path": "result.ttk"},
          {"name": "dps", "json_path": "result.dps[1]", "atol": 0.5}
        ]
      }
    },
    {
      "id": "N02",
      "prompt": "Run the broken calculator.",
      "required_keywords": [],
      "required_references": [],
      "preferred_script": "broken.sh",
      "script_validation": {
        "input": "inputs/boss.json",
        "extract": [{"path": "value"}]
      }
    }
  ]
}
"#;

const TTK_SCRIPT: &str = r#"echo '{"result": {"ttk": 12.5, "dps": [80, 100]}}'
"#;

const BROKEN_SCRIPT: &str = "echo boom >&2\nexit 3\n";

struct Fixture {
    dir: TempDir,
    suite: PathBuf,
    scripts: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let golden = dir.path().join("golden");
    let scripts = dir.path().join("scripts");
    std::fs::create_dir_all(golden.join("inputs")).unwrap();
    std::fs::create_dir_all(&scripts).unwrap();

    let suite = golden.join("suite.json");
    std::fs::write(&suite, SUITE).unwrap();
    std::fs::write(golden.join("inputs/boss.json"), r#"{"hp": 1000}"#).unwrap();
    std::fs::write(scripts.join("ttk.sh"), TTK_SCRIPT).unwrap();
    std::fs::write(scripts.join("broken.sh"), BROKEN_SCRIPT).unwrap();

    Fixture {
        dir,
        suite,
        scripts,
    }
}

fn write_responses(dir: &Path, n01: &str) -> PathBuf {
    let payload = serde_json::json!({
        "cases": [
            {"id": "N01", "response": n01},
            {"id": "N02", "response": "Nothing numeric here."}
        ]
    });
    let path = dir.join("responses.json");
    std::fs::write(&path, payload.to_string()).unwrap();
    path
}

fn run(fixture: &Fixture, responses: &Path, extra: &[&str]) -> (Option<i32>, Value) {
    #[allow(deprecated)]
    let output = Command::cargo_bin("goldencheck")
        .unwrap()
        .current_dir(fixture.dir.path())
        .env("HOME", fixture.dir.path())
        .arg("run")
        .arg("--suite")
        .arg(&fixture.suite)
        .arg("--responses")
        .arg(responses)
        .arg("--scripts-dir")
        .arg(&fixture.scripts)
        .arg("--interpreter")
        .arg("sh")
        .arg("--format")
        .arg("json")
        .args(extra)
        .output()
        .unwrap();
    let report = serde_json::from_slice(&output.stdout).unwrap();
    (output.status.code(), report)
}

fn check<'a>(report: &'a Value, case: usize, name: &str) -> &'a Value {
    report["cases"][case]["checks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == name)
        .unwrap()
}

#[test]
fn e2e_numeric_cross_check_matches_script_output() {
    let fixture = fixture();
    let responses = write_responses(
        fixture.dir.path(),
        "TTK is about 12.4 seconds at 100.3 DPS.",
    );

    let (code, report) = run(&fixture, &responses, &["--case-ids", "N01"]);

    assert_eq!(code, Some(0));
    let numeric = check(&report, 0, "preferred_script_numeric");
    assert_eq!(numeric["passed"], true);
    assert_eq!(numeric["score"], 1.0);
    assert_eq!(numeric["details"], "matched 2/2 (min 2)");
    assert_eq!(report["summary"]["overall_passed"], true);
}

#[test]
fn e2e_numeric_mismatch_is_a_hard_fail() {
    let fixture = fixture();
    let responses = write_responses(fixture.dir.path(), "TTK is 20 seconds at 100 DPS.");

    let (code, report) = run(&fixture, &responses, &["--case-ids", "N01"]);

    assert_eq!(code, Some(1));
    let numeric = check(&report, 0, "preferred_script_numeric");
    assert_eq!(numeric["passed"], false);
    assert_eq!(numeric["score"], 0.5);
    assert_eq!(numeric["details"], "matched 1/2 (min 2); missing: ttk≈12.5±0.25");
    assert_eq!(
        report["cases"][0]["hard_fail_reasons"],
        serde_json::json!(["preferred_script_numeric_mismatch"])
    );
}

#[test]
fn e2e_script_failure_is_contained_to_its_case() {
    let fixture = fixture();
    let responses = write_responses(fixture.dir.path(), "TTK is 12.5 seconds at 100 DPS.");

    let (code, report) = run(&fixture, &responses, &[]);

    assert_eq!(code, Some(1));
    assert_eq!(report["cases"][0]["passed"], true);
    assert_eq!(report["cases"][1]["passed"], false);
    let numeric = check(&report, 1, "preferred_script_numeric");
    assert_eq!(numeric["details"], "script_exit_3: boom");
    assert_eq!(report["summary"]["cases_evaluated"], 2);
    assert_eq!(report["summary"]["cases_passed"], 1);
}

#[test]
fn e2e_health_check_runs_each_script_once() {
    let fixture = fixture();
    let responses = write_responses(fixture.dir.path(), "TTK is 12.5 seconds at 100 DPS.");

    let (code, report) = run(
        &fixture,
        &responses,
        &["--case-ids", "N01", "--check-scripts"],
    );

    // broken.sh is still health-checked even though N02 was not selected.
    assert_eq!(code, Some(1));
    let checks = &report["script_checks"];
    assert_eq!(checks["enabled"], true);
    assert_eq!(checks["total"], 2);
    assert_eq!(checks["passed_count"], 1);
    assert_eq!(checks["passed"], false);

    let results = checks["results"].as_array().unwrap();
    let broken = results.iter().find(|r| r["script"] == "broken.sh").unwrap();
    assert_eq!(broken["details"], "exit=3: boom");
    let ttk = results.iter().find(|r| r["script"] == "ttk.sh").unwrap();
    assert_eq!(ttk["details"], "ok");
}
