#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("combo").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IMAGE"))
        .stdout(predicate::str::contains("--push"))
        .stdout(predicate::str::contains("--override-env"))
        .stdout(predicate::str::contains("--override-from"))
        .stdout(predicate::str::contains("--copy-strategy"))
        .stdout(predicate::str::contains("--force"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("combo").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("combo"));
}

/// イメージ1個だけでは起動できないことを確認
#[test]
fn test_cli_requires_at_least_two_images() {
    let mut cmd = Command::cargo_bin("combo").unwrap();
    cmd.arg("python:3.9-slim").assert().failure();
}

/// 不正なイメージ参照が引数検証で弾かれることを確認
#[test]
fn test_cli_rejects_invalid_reference() {
    let mut cmd = Command::cargo_bin("combo").unwrap();
    cmd.arg("python")
        .arg("node:18-slim")
        .assert()
        .failure()
        .stderr(predicate::str::contains("不正なイメージ参照"));
}

/// タグが2個ある参照も弾かれることを確認
#[test]
fn test_cli_rejects_double_tag_separator() {
    let mut cmd = Command::cargo_bin("combo").unwrap();
    cmd.arg("python:3.9:slim").arg("node:18").assert().failure();
}
