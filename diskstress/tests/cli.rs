use std::process::{Command, Output, Stdio};
use std::time::Duration;

use diskstress_test::workspace::TestDir;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;

const DISKSTRESS_EXE: &str = env!("CARGO_BIN_EXE_diskstress");

fn write_config(dir: &TestDir) -> std::path::PathBuf {
    let path = dir.parent().join("diskstress.yml");
    let yaml = format!(
        r#"
work_dir: {}
grace_period: 1s
workers:
  writers: 2
  readers: 1
  random_io: 1
writer:
  file_size: 1 MiB
"#,
        dir.work_dir().display()
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn run_with_args(args: &[&str]) -> Output {
    Command::new(DISKSTRESS_EXE)
        .args(args)
        .output()
        .expect("Failed to run diskstress")
}

#[test]
fn test_missing_duration_fails() {
    let output = run_with_args(&[]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_invalid_duration_fails() {
    for arg in ["abc", "-5", "1.5"] {
        let output = run_with_args(&[arg]);
        assert!(!output.status.success(), "accepted {arg:?}");
    }
}

#[test]
fn test_zero_duration_fails() {
    let output = run_with_args(&["0"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: diskstress"));
    assert!(stderr.contains("positive"));
}

#[test]
fn test_interrupt_shuts_down_cleanly() {
    let dir = TestDir::new();
    let config = write_config(&dir);

    let child = Command::new(DISKSTRESS_EXE)
        .arg("600")
        .arg("-c")
        .arg(&config)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to spawn subprocess");

    std::thread::sleep(Duration::from_secs(1));
    let pid = Pid::from_raw(child.id() as i32);
    signal::kill(pid, Signal::SIGINT).expect("Failed to send SIGINT");

    let output = child.wait_with_output().expect("Failed to wait on child");
    assert!(
        output.status.success(),
        "Process exited with non-zero status: {:?}",
        output.status.code()
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Files created"));
    assert!(stdout.contains("interrupt"));
    assert!(!dir.work_dir().exists());
}

#[test]
fn test_terminate_shuts_down_cleanly() {
    let dir = TestDir::new();
    let config = write_config(&dir);

    let child = Command::new(DISKSTRESS_EXE)
        .arg("600")
        .arg("-c")
        .arg(&config)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to spawn subprocess");

    std::thread::sleep(Duration::from_secs(1));
    let pid = Pid::from_raw(child.id() as i32);
    signal::kill(pid, Signal::SIGTERM).expect("Failed to send SIGTERM");

    let output = child.wait_with_output().expect("Failed to wait on child");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("terminate"));
    assert!(!dir.work_dir().exists());
}
