// tests/cli_dispatch_test.rs

use assert_cmd::Command;
use predicates::prelude::*;

// 辅助函数，避免重复
fn main_command() -> Command {
    Command::cargo_bin(env!("CARGO_PKG_NAME")).unwrap()
}

#[test]
fn test_help_flag() {
    let mut cmd = main_command();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("显示此帮助信息并退出"))
        .stdout(predicate::str::contains("--man_login_url"));
}

#[test]
fn test_version_flag() {
    let mut cmd = main_command();
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_mode_exits_with_one() {
    let mut cmd = main_command();
    cmd.arg("--email").arg("me@example.com").arg("--password").arg("pw");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("--url <URL>"));
}

#[test]
fn test_url_and_file_are_exclusive() {
    let mut cmd = main_command();
    cmd.args(["--url", "https://school.example.com/p/c", "--file", "courses.txt"]);
    cmd.assert().code(1).stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_missing_auth_strategy_exits_with_one() {
    let mut cmd = main_command();
    cmd.arg("--url").arg("https://school.example.com/p/c");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("--man_login_url"));
}

#[test]
fn test_login_url_alone_is_not_enough() {
    let mut cmd = main_command();
    cmd.args(["--file", "courses.txt", "--login_url", "https://school.example.com/sign_in"]);
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("必须提供登录方式"));
}

#[test]
fn test_unknown_flag_exits_with_one() {
    let mut cmd = main_command();
    cmd.args(["--url", "https://school.example.com/p/c", "--no-such-flag"]);
    cmd.assert().code(1).stderr(predicate::str::contains("--no-such-flag"));
}

#[test]
fn test_manual_login_with_credentials_exits_with_one() {
    let mut cmd = main_command();
    cmd.args([
        "--url",
        "https://school.example.com/p/c",
        "--man_login_url",
        "https://school.example.com/courses/enrolled",
        "--email",
        "me@example.com",
        "--password",
        "pw",
    ]);
    cmd.assert().code(1).stderr(predicate::str::contains("cannot be used with"));
}
