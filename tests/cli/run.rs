//! Tests for `lockbox run`.

use crate::support::*;

#[cfg(unix)]
#[test]
fn test_run_injects_env_vars() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["INJECTED_VAR=injected_value"]));

    let output = t.run("secrets.yaml", "key.txt", &["sh", "-c", "echo $INJECTED_VAR"]);
    assert_success(&output);
    assert_stdout_contains(&output, "injected_value");
}

#[cfg(unix)]
#[test]
fn test_run_exit_code_passthrough() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t.run("secrets.yaml", "key.txt", &["sh", "-c", "exit 42"]);
    assert_eq!(output.status.code(), Some(42));
}

#[test]
fn test_run_missing_store() {
    let t = Test::new();
    t.keygen("key.txt");

    let output = t.run("absent.yaml", "key.txt", &["echo", "hi"]);
    assert_failure(&output);
    assert_stderr_contains(&output, "file not found");
}
