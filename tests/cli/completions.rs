//! Tests for `lockbox completions` and top-level help.

use crate::support::*;
use predicates::prelude::*;

#[test]
fn test_completions_for_each_shell() {
    let t = Test::new();
    for shell in ["bash", "zsh", "fish", "power-shell"] {
        t.cmd()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("lockbox"));
    }
}

#[test]
fn test_help_lists_commands() {
    let t = Test::new();
    t.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("put")
                .and(predicate::str::contains("get"))
                .and(predicate::str::contains("recipients"))
                .and(predicate::str::contains("decrypt")),
        );
}

#[test]
fn test_unknown_shell_rejected() {
    let t = Test::new();
    t.cmd()
        .args(["completions", "tcsh"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}
