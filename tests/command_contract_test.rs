use std::io::Write;
use std::process::{Command, Stdio};

fn get_binary() -> String {
    env!("CARGO_BIN_EXE_multireport").to_string()
}

const PASSING_LOG: &str = r#"{"event":"start","total":3}
{"event":"suite","title":"math","depth":1}
{"event":"pass","title":"adds","full_title":"math adds"}
{"event":"pass","title":"subtracts","full_title":"math subtracts"}
{"event":"pass","title":"multiplies","full_title":"math multiplies"}
{"event":"suite end","title":"math","depth":1}
{"event":"end"}
"#;

#[test]
fn test_invalid_setup_exits_with_one_and_creates_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("run.jsonl");
    std::fs::write(&log, PASSING_LOG).unwrap();

    let output = Command::new(get_binary())
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env_remove("multi")
        .args(["-R", "bogus!!!", log.to_str().unwrap()])
        .output()
        .expect("Failed to execute multireport");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("ERROR: 'bogus!!!' is an invalid definition"));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_unknown_reporter_exits_with_one() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("run.jsonl");
    std::fs::write(&log, PASSING_LOG).unwrap();

    let output = Command::new(get_binary())
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("multi", "json=out.json doesnotexist=-")
        .arg(log.to_str().unwrap())
        .output()
        .expect("Failed to execute multireport");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr.contains("ERROR: Unable to find 'doesnotexist' reporter"));
    assert!(!dir.path().join("out.json").exists());
}

#[test]
fn test_run_from_stdin_writes_each_destination() {
    let dir = tempfile::tempdir().unwrap();

    let mut child = Command::new(get_binary())
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["run", "-R", "spec=- summary=reports/summary.txt"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn multireport");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(PASSING_LOG.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    let stdout = String::from_utf8_lossy(&output.stdout);
    let summary = std::fs::read_to_string(dir.path().join("reports/summary.txt")).unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout.contains("3 passing"));
    assert!(!stdout.contains("Test summary"));
    assert!(summary.contains("result:   PASSED"));
}

#[test]
fn test_exit_code_is_failure_count() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("run.jsonl");
    std::fs::write(
        &log,
        "{\"event\":\"fail\",\"title\":\"a\"}\n{\"event\":\"fail\",\"title\":\"b\"}\n{\"event\":\"end\"}\n",
    )
    .unwrap();

    let output = Command::new(get_binary())
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .args(["-R", "tap=tap.txt", log.to_str().unwrap()])
        .output()
        .expect("Failed to execute multireport");

    let tap = std::fs::read_to_string(dir.path().join("tap.txt")).unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(tap.contains("not ok 1 "));
    assert!(tap.contains("# fail 2"));
}

#[test]
fn test_list_json_output() {
    let output = Command::new(get_binary())
        .args(["list", "--format", "json"])
        .output()
        .expect("Failed to execute list command");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON output");

    let names: Vec<&str> = json["reporters"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"spec"));
    assert!(names.contains(&"json-stream"));
    assert_eq!(json["reporters"][0]["origin"], "builtin");
}
