#![allow(clippy::unwrap_used, clippy::expect_used)] // Integration tests use unwrap for brevity

//! Drives the built `hydra` binary against throwaway repositories and checks
//! its JSON log stream and exit status.

use std::path::Path;
use std::process::{Command, Output};

use serde_json::Value;
use tempfile::TempDir;

/// Create a fake repository with one directory per submodule.
fn repo_with(submodules: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let mut gitmodules = String::new();
    for name in submodules {
        gitmodules.push_str(&format!(
            "[submodule \"{name}\"]\n\tpath = {name}\n\turl = https://example.com/{name}.git\n"
        ));
        std::fs::create_dir_all(dir.path().join(name)).unwrap();
    }
    std::fs::write(dir.path().join(".gitmodules"), gitmodules).unwrap();
    dir
}

fn hydra(cwd: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hydra"))
        .args(args)
        .arg("--log-json")
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("HYDRA_WORKERS")
        .env_remove("HYDRA_QUEUE_CAPACITY")
        .output()
        .expect("failed to launch hydra")
}

/// Parsed log lines whose message equals `message`.
fn events(output: &Output, message: &str) -> Vec<Value> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .filter(|v| v["fields"]["message"] == message)
        .collect()
}

fn position(output: &Output, message: &str) -> Vec<usize> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .filter_map(|line| serde_json::from_str::<Value>(line).ok())
        .enumerate()
        .filter(|(_, v)| v["fields"]["message"] == message)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn scenario_a_all_succeed() {
    let repo = repo_with(&["alpha", "beta", "gamma"]);
    let output = hydra(repo.path(), &["true"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let started = events(&output, "Task started");
    assert_eq!(started.len(), 3);
    for event in &started {
        assert!(event["fields"]["worker_id"].as_u64().unwrap() < 3);
    }
    let mut items: Vec<_> = started
        .iter()
        .map(|e| e["fields"]["item"].as_str().unwrap().to_string())
        .collect();
    items.sort();
    assert_eq!(items, vec!["alpha", "beta", "gamma"]);

    assert_eq!(events(&output, "Task succeeded").len(), 3);
    assert_eq!(events(&output, "All work complete").len(), 1);
}

#[test]
fn scenario_b_failures_do_not_abort() {
    let repo = repo_with(&["s1", "s2", "s3", "s4", "s5"]);
    let output = hydra(repo.path(), &["false", "--workers", "2"]);
    assert!(output.status.success(), "per-task failures must not fail the run");

    assert_eq!(events(&output, "Task started").len(), 5);
    let failed = events(&output, "Task failed");
    assert_eq!(failed.len(), 5);
    for event in &failed {
        assert!(!event["fields"]["cause"].as_str().unwrap().is_empty());
        assert!(event["fields"]["worker_id"].as_u64().unwrap() < 2);
    }

    let complete = position(&output, "All work complete");
    assert_eq!(complete.len(), 1);
    assert!(position(&output, "Task failed").iter().all(|i| *i < complete[0]));
}

#[test]
fn scenario_c_no_submodules_is_fatal() {
    let repo = TempDir::new().unwrap();
    std::fs::write(repo.path().join(".gitmodules"), "[core]\n\tbare = false\n").unwrap();
    let output = hydra(repo.path(), &["true"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(events(&output, "Task started").is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No submodules declared"));
}

#[test]
fn missing_gitmodules_is_fatal() {
    let repo = TempDir::new().unwrap();
    let output = hydra(repo.path(), &["true"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(events(&output, "Task started").is_empty());
}

#[test]
fn zero_workers_is_fatal() {
    let repo = repo_with(&["a"]);
    let output = hydra(repo.path(), &["true", "--workers", "0"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(events(&output, "Task started").is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("worker count"));
}

#[test]
fn oversized_counts_are_config_errors() {
    let repo = repo_with(&["a"]);
    let max = usize::MAX.to_string();
    for flag in ["--queue-capacity", "--workers"] {
        let output = hydra(repo.path(), &["true", flag, &max]);
        assert_eq!(
            output.status.code(),
            Some(2),
            "{flag} {max}: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert!(events(&output, "Task started").is_empty());
        assert_eq!(events(&output, "Configuration error").len(), 1);
    }
}

#[test]
fn warning_log_level_accepted() {
    let repo = repo_with(&["a"]);
    let output = hydra(repo.path(), &["true", "--log-level", "warning"]);
    assert!(output.status.success());
    assert!(events(&output, "Task started").is_empty());
}

#[test]
fn scenario_d_capacity_one() {
    let names: Vec<String> = (0..10).map(|i| format!("m{i}")).collect();
    let refs: Vec<&str> = names.iter().map(String::as_str).collect();
    let repo = repo_with(&refs);
    let output = hydra(
        repo.path(),
        &["true", "--workers", "1", "--queue-capacity", "1", "--summary-json"],
    );
    assert!(output.status.success());

    let summary: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["total"], 10);
    assert_eq!(summary["succeeded"], 10);
    assert_eq!(summary["workers"], 1);
}

#[test]
fn fail_on_error_sets_exit_status() {
    let repo = repo_with(&["ok", "broken"]);
    let command = "[ \"$(basename \"$(pwd -P)\")\" != broken ]";

    let lenient = hydra(repo.path(), &[command]);
    assert!(lenient.status.success());
    assert_eq!(events(&lenient, "Task failed").len(), 1);
    assert_eq!(events(&lenient, "Task succeeded").len(), 1);

    let strict = hydra(repo.path(), &[command, "--fail-on-error"]);
    assert_eq!(strict.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&strict.stderr).contains("1 of 2 submodules failed"));
}

#[test]
fn commands_run_inside_submodule_directory() {
    let repo = repo_with(&["one", "two"]);
    let output = hydra(repo.path(), &["touch ran-here"]);
    assert!(output.status.success());
    assert!(repo.path().join("one").join("ran-here").exists());
    assert!(repo.path().join("two").join("ran-here").exists());
    assert!(!repo.path().join("ran-here").exists());
}

#[test]
fn use_path_selects_declared_paths() {
    let repo = TempDir::new().unwrap();
    std::fs::write(
        repo.path().join(".gitmodules"),
        "[submodule \"lib\"]\n\tpath = vendor/lib\n",
    )
    .unwrap();
    std::fs::create_dir_all(repo.path().join("vendor/lib")).unwrap();

    let output = hydra(repo.path(), &["touch marker", "--use-path"]);
    assert!(output.status.success());
    assert!(repo.path().join("vendor/lib/marker").exists());

    // By name, the "lib" directory does not exist and the task fails.
    let by_name = hydra(repo.path(), &["true"]);
    assert!(by_name.status.success());
    assert_eq!(events(&by_name, "Task failed").len(), 1);
}
