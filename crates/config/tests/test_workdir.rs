//! Tests for sandbox root resolution

use fsagent_config::{resolve_workdir, ConfigError, WORKDIR_ENV};
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[test]
#[serial]
fn test_flag_wins_over_env() {
    let flag_dir = TempDir::new().unwrap();
    let env_dir = TempDir::new().unwrap();
    std::env::set_var(WORKDIR_ENV, env_dir.path());

    let resolved = resolve_workdir(flag_dir.path().to_str()).unwrap();

    std::env::remove_var(WORKDIR_ENV);
    assert_eq!(resolved, flag_dir.path().canonicalize().unwrap());
}

#[test]
#[serial]
fn test_env_used_when_no_flag() {
    let env_dir = TempDir::new().unwrap();
    std::env::set_var(WORKDIR_ENV, env_dir.path());

    let resolved = resolve_workdir(None).unwrap();

    std::env::remove_var(WORKDIR_ENV);
    assert_eq!(resolved, env_dir.path().canonicalize().unwrap());
}

#[test]
#[serial]
fn test_falls_back_to_current_dir() {
    std::env::remove_var(WORKDIR_ENV);

    let resolved = resolve_workdir(None).unwrap();

    assert_eq!(resolved, std::env::current_dir().unwrap().canonicalize().unwrap());
}

#[test]
#[serial]
fn test_missing_directory_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("does-not-exist");

    let err = resolve_workdir(missing.to_str()).unwrap_err();

    assert!(matches!(err, ConfigError::WorkdirNotFound(_)));
    assert!(err.to_string().contains("does-not-exist"));
}

#[test]
#[serial]
fn test_file_rejected_as_workdir() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    let err = resolve_workdir(file.to_str()).unwrap_err();

    assert!(matches!(err, ConfigError::NotADirectory(_)));
}

#[test]
#[serial]
fn test_result_is_canonical() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    let dotted = temp_dir.path().join("a").join("..").join("a").join("b");

    let resolved = resolve_workdir(dotted.to_str()).unwrap();

    assert_eq!(resolved, nested.canonicalize().unwrap());
    assert!(resolved.is_absolute());
}
