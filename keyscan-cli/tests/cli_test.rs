use anyhow::Result;
use assert_cmd::Command;
use keyscan::scan::process::WORKER_SUBCOMMAND;
use keyscan::{
    collect_files, Coordinator, EncodingMode, KeywordSet, ProcessStrategy, ScanConfig, ScanError,
    ThreadStrategy,
};
use predicates::prelude::*;
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        fs::write(dir.path().join(name), content)?;
    }
    Ok(())
}

fn keyscan() -> Result<Command> {
    let mut cmd = Command::cargo_bin("keyscan")?;
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    Ok(cmd)
}

fn worker_strategy() -> ProcessStrategy {
    ProcessStrategy::new(env!("CARGO_BIN_EXE_keyscan")).arg(WORKER_SUBCOMMAND)
}

fn keywords() -> Result<KeywordSet> {
    Ok(KeywordSet::new(vec![
        "error".to_string(),
        "warning".to_string(),
        "critical".to_string(),
    ])?)
}

fn files_in(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let config = ScanConfig {
        root_path: dir.to_path_buf(),
        ..ScanConfig::default()
    };
    Ok(collect_files(&config)?)
}

#[test]
fn test_scan_prints_both_reports() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("a.txt", "error here"),
            ("b.txt", "all clear"),
            ("c.txt", "warning: critical"),
        ],
    )?;

    keyscan()?
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting threads version..."))
        .stdout(predicate::str::contains("Starting processes version..."))
        .stdout(predicate::str::contains("Results (threads):"))
        .stdout(predicate::str::contains("Results (processes):"))
        .stdout(predicate::str::contains("a.txt"))
        .stdout(predicate::str::contains("c.txt"))
        .stdout(predicate::str::contains("b.txt").not())
        .stdout(predicate::str::contains("with 3 workers"))
        .stdout(predicate::str::is_match(r"Execution time: \d+\.\d{2} seconds")?)
        .stdout(predicate::str::contains("All strategies found the same matches"));
    Ok(())
}

#[test]
fn test_scan_single_strategy() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("a.txt", "critical")])?;

    keyscan()?
        .args(["scan", dir.path().to_str().unwrap(), "-s", "processes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Results (processes):"))
        .stdout(predicate::str::contains("Results (threads):").not())
        .stdout(predicate::str::contains("critical"));
    Ok(())
}

#[test]
fn test_scan_empty_directory_succeeds() -> Result<()> {
    let dir = tempdir()?;

    keyscan()?
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("no keywords found"))
        .stdout(predicate::str::contains("with 0 workers"));
    Ok(())
}

#[test]
fn test_scan_missing_directory_fails() -> Result<()> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing");

    keyscan()?
        .args(["scan", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Directory not found"));
    Ok(())
}

#[test]
fn test_scan_unreadable_file_still_succeeds() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            ("1.txt", "error"),
            ("2.txt", "warning"),
            ("3.txt", "critical"),
            ("4.txt", "nothing"),
        ],
    )?;
    fs::write(dir.path().join("5.txt"), b"error \xff\xfe")?;

    keyscan()?
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Scanned 5 files (1 unreadable)"))
        .stderr(predicate::str::contains("5.txt"));
    Ok(())
}

#[test]
fn test_scan_uses_config_file() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("app.log", "panic: out of memory"), ("a.txt", "error")])?;
    let config_path = dir.path().join("keyscan.yaml");
    fs::write(
        &config_path,
        format!(
            "keywords: [\"panic\"]\nfile_extensions: [\"log\"]\nroot_path: \"{}\"\nstrategies: [\"threads\"]\npool_size: 2\n",
            dir.path().display()
        ),
    )?;

    keyscan()?
        .args(["scan", "--config", config_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("panic"))
        .stdout(predicate::str::contains("app.log"))
        .stdout(predicate::str::contains("a.txt").not())
        .stdout(predicate::str::contains("with 1 workers"));
    Ok(())
}

#[test]
fn test_scan_invalid_config_fails() -> Result<()> {
    let dir = tempdir()?;
    let config_path = dir.path().join("keyscan.yaml");
    fs::write(&config_path, "pool_size: 0
")?;

    keyscan()?
        .args(["scan", "--config", config_path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
    Ok(())
}

#[test]
fn test_strategies_agree_on_pairs() -> Result<()> {
    let dir = tempdir()?;
    for i in 0..17 {
        let body = match i % 5 {
            0 => "error",
            1 => "warning: critical",
            2 => "critical error",
            3 => "warning",
            _ => "fine",
        };
        fs::write(dir.path().join(format!("log_{:02}.txt", i)), body)?;
    }

    let files = files_in(dir.path())?;
    let keywords = keywords()?;
    let coordinator = Coordinator::new(NonZeroUsize::new(4).unwrap(), EncodingMode::FailFast);

    let threads = coordinator.run(&ThreadStrategy::new(), &files, &keywords)?;
    let processes = coordinator.run(&worker_strategy(), &files, &keywords)?;

    assert_eq!(threads.matches.pairs(), processes.matches.pairs());
    assert_eq!(
        threads.matches.total_entries(),
        processes.matches.total_entries()
    );
    assert_eq!(threads.stats, processes.stats);
    assert_eq!(processes.workers, 4);
    Ok(())
}

#[test]
fn test_process_worker_crash_is_run_failure() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("a.txt", "error"), ("b.txt", "warning")])?;

    let files = files_in(dir.path())?;
    // An unknown subcommand makes the child exit with a usage error before answering
    let broken = ProcessStrategy::new(env!("CARGO_BIN_EXE_keyscan")).arg("no-such-command");
    let coordinator = Coordinator::new(NonZeroUsize::new(2).unwrap(), EncodingMode::FailFast);

    let result = coordinator.run(&broken, &files, &keywords()?);
    assert!(matches!(result, Err(ScanError::WorkerFailed { .. })));
    Ok(())
}

#[test]
fn test_worker_subcommand_serves_request() -> Result<()> {
    let dir = tempdir()?;
    create_test_files(&dir, &[("a.txt", "warning")])?;
    let path = dir.path().join("a.txt");
    let request = serde_json_request(&path);

    keyscan()?
        .arg(WORKER_SUBCOMMAND)
        .write_stdin(request)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"worker_id\":3"))
        .stdout(predicate::str::contains("\"warning\""));
    Ok(())
}

fn serde_json_request(path: &Path) -> String {
    let escaped = path.display().to_string().replace('\\', "\\\\");
    format!(
        r#"{{"worker_id":3,"paths":["{}"],"keywords":["warning","error"],"encoding_mode":"failfast"}}"#,
        escaped
    )
}
