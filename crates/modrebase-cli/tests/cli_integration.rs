//! CLI subprocess integration tests.
//!
//! These tests invoke the `modrebase` binary as a subprocess and verify
//! exit codes, written files, and JSON output.

use modrebase_server::{LogStore, TestServer};
use std::path::{Path, PathBuf};
use std::process::Command;

fn modrebase_bin() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_modrebase"));
    cmd.env_remove("MODREBASE_LOG");
    // Keep a developer's ~/.config/modrebase/sumdb.json out of the tests.
    cmd.env("HOME", std::env::temp_dir().join("modrebase-cli-test-home"));
    cmd
}

const UPSTREAM: &str = "\
module example.com/up

go 1.21

require (
\texample.com/a v1.2.0
\texample.com/b v2.0.0 // indirect
)

exclude example.com/bad v0.0.1
";

const DOWNSTREAM: &str = "\
module example.com/fork

go 1.22

require (
\texample.com/a v1.3.0
\texample.com/c v1.0.0
)
";

const SUM: &str = "\
example.com/a v1.3.0 h1:aaa=
example.com/a v1.3.0/go.mod h1:amod=
";

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn cli_version_exits_zero() {
    let output = modrebase_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("modrebase"));
}

#[test]
fn cli_help_lists_commands() {
    let output = modrebase_bin().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for cmd in ["rebase", "checksums", "probe", "completions"] {
        assert!(stdout.contains(cmd), "help must list '{cmd}'");
    }
}

#[test]
fn cli_rebase_writes_default_output() {
    let dir = tempfile::tempdir().unwrap();
    let up = write(dir.path(), "go.mod", UPSTREAM);
    let down = write(dir.path(), "fork.mod", DOWNSTREAM);

    let output = modrebase_bin()
        .args(["rebase", "--upstream"])
        .arg(&up)
        .arg("--downstream")
        .arg(&down)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let merged = std::fs::read_to_string(dir.path().join("go.mod.local")).unwrap();
    assert_eq!(
        merged,
        "module example.com/up\n\ngo 1.21\n\nrequire example.com/a v1.3.0\n\nexclude example.com/bad v0.0.1\n"
    );
}

#[test]
fn cli_rebase_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let up = write(dir.path(), "go.mod", UPSTREAM);
    let down = write(dir.path(), "fork.mod", DOWNSTREAM);
    let out = dir.path().join("merged.mod");

    let output = modrebase_bin()
        .args(["--json", "rebase", "--upstream"])
        .arg(&up)
        .arg("--downstream")
        .arg(&down)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(out.exists());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kept"], 1);
    assert_eq!(json["upgraded"][0]["path"], "example.com/a");
    assert_eq!(json["upgraded"][0]["downstream"], "v1.3.0");
    assert_eq!(json["dropped_upstream_only"][0], "example.com/b");
    assert_eq!(json["dropped_downstream_only"][0], "example.com/c");
}

#[test]
fn cli_rebase_parse_error_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let up = write(dir.path(), "go.mod", UPSTREAM);
    let down = write(dir.path(), "fork.mod", "module x\nfrobnicate\n");

    let output = modrebase_bin()
        .args(["rebase", "--upstream"])
        .arg(&up)
        .arg("--downstream")
        .arg(&down)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fork.mod:2"), "stderr: {stderr}");
    assert!(!dir.path().join("go.mod.local").exists());
}

#[test]
fn cli_checksums_against_local_server() {
    let server = TestServer::start(LogStore::from_sum_lines("sum.test", SUM).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let lock = write(
        dir.path(),
        "go.mod.local",
        "module example.com/up\n\ngo 1.21\n\nrequire example.com/a v1.3.0\n",
    );
    let out = dir.path().join("go.sum.local");

    let output = modrebase_bin()
        .args(["--json", "checksums", "--lockfile"])
        .arg(&lock)
        .arg("--output")
        .arg(&out)
        .args(["--log-key", &server.key, "--log-url", &server.url])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    assert_eq!(std::fs::read_to_string(&out).unwrap(), SUM);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["database"], "sum.test");
    assert_eq!(json["verification"], "trust-server");
    assert_eq!(json["lines"], 2);
}

#[test]
fn cli_checksums_lookup_failure_exits_3() {
    let server = TestServer::start(LogStore::from_sum_lines("sum.test", SUM).unwrap());
    let dir = tempfile::tempdir().unwrap();
    let lock = write(
        dir.path(),
        "go.mod.local",
        "module example.com/up\n\ngo 1.21\n\nrequire (\n\texample.com/a v1.3.0\n\texample.com/unknown v0.1.0\n)\n",
    );
    let out = write(dir.path(), "go.sum.local", "old\n");

    let output = modrebase_bin()
        .args(["checksums", "--lockfile"])
        .arg(&lock)
        .arg("--output")
        .arg(&out)
        .args(["--log-key", &server.key, "--log-url", &server.url])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("example.com/unknown@v0.1.0"), "stderr: {stderr}");
    assert!(stderr.contains("404"), "stderr: {stderr}");
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "old\n");
}

#[test]
fn cli_probe_detects_go() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", UPSTREAM);

    let output = modrebase_bin()
        .args(["--json", "probe"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["strategy"], "go");
    assert_eq!(json["lock_file"], "go.mod");
}

#[test]
fn cli_probe_empty_dir_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let output = modrebase_bin().arg("probe").arg(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn cli_completions_bash() {
    let output = modrebase_bin().args(["completions", "bash"]).output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("modrebase"));
}
