use std::process::{Command, Output};

fn mapchurn_logged(
  args: &[&str],
  filter: &str,
) -> Output {
  Command::new(env!("CARGO_BIN_EXE_mapchurn"))
    .args(args)
    .env("RUST_LOG", filter)
    .env("NO_COLOR", "1")
    .output()
    .expect("failed to launch mapchurn")
}

fn mapchurn(args: &[&str]) -> Output {
  mapchurn_logged(args, "warn")
}

#[test]
fn test_mmap_mode_runs_to_completion() {
  let output = mapchurn(&["1"]);

  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  assert_eq!(String::from_utf8_lossy(&output.stdout), "Method 1: mmap strategy\n");
}

#[test]
fn test_heap_mode_runs_to_completion() {
  let output = mapchurn(&["2"]);

  assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
  assert_eq!(String::from_utf8_lossy(&output.stdout), "Method 2: malloc strategy\n");
}

#[test]
fn test_runs_serial_touched_pass_then_concurrent_pass() {
  for mode in ["1", "2"] {
    let output = mapchurn_logged(&[mode], "mapchurn=info");
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(output.status.success(), "stderr: {stderr}");

    let passes: Vec<&str> = stderr.lines().filter(|line| line.contains("pass done")).collect();
    assert_eq!(passes.len(), 2, "stderr: {stderr}");
    assert!(passes[0].contains("workers=1"), "stderr: {stderr}");
    assert!(passes[0].contains("touch=true"), "stderr: {stderr}");
    assert!(passes[0].contains("completed=1"), "stderr: {stderr}");
    assert!(passes[1].contains("workers=4"), "stderr: {stderr}");
    assert!(passes[1].contains("touch=false"), "stderr: {stderr}");
    assert!(passes[1].contains("completed=400"), "stderr: {stderr}");
  }
}

#[test]
fn test_unknown_mode_is_a_usage_error() {
  let output = mapchurn(&["3"]);
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(!output.status.success());
  assert!(output.stdout.is_empty());
  assert!(stderr.contains("Usage: mapchurn"), "stderr: {stderr}");
}

#[test]
fn test_missing_mode_is_a_usage_error() {
  let output = mapchurn(&[]);
  let stderr = String::from_utf8_lossy(&output.stderr);

  assert!(!output.status.success());
  assert!(stderr.contains("Usage: mapchurn"), "stderr: {stderr}");
  assert!(stderr.contains("<MODE>"), "stderr: {stderr}");
}
