//! Error reporting and exit codes.

use crate::support::*;

#[test]
fn test_new_store_without_recipients() {
    let t = Test::new();
    let output = t.cmd().args(["put", "secrets.yaml", "A=1"]).output().unwrap();
    assert_failure(&output);
    assert_eq!(output.status.code(), Some(1));
    assert_stderr_contains(&output, "no recipients");
    assert_stderr_contains(&output, "--recipient");
}

#[test]
fn test_update_without_identity() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t.cmd().args(["put", "secrets.yaml", "B=2"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "identity is required");
}

#[test]
fn test_recipient_mismatch() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t
        .cmd()
        .args(["put", "secrets.yaml", "-i", "key.txt", "-r", BOB_PUBLIC_KEY, "B=2"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "recipients do not match");
}

#[test]
fn test_wrong_identity() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    t.keygen("other.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t.get("secrets.yaml", "other.txt", &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "authentication failed");
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_malformed_store() {
    let t = Test::new();
    t.keygen("key.txt");
    std::fs::write(t.path("secrets.yaml"), "just: yaml\n").unwrap();

    let output = t.get("secrets.yaml", "key.txt", &[]);
    assert_failure(&output);
    assert_stderr_contains(&output, "malformed envelope");
}

#[test]
fn test_invalid_pair() {
    let t = Test::new();
    let output = t
        .cmd()
        .args(["put", "secrets.yaml", "-r", BOB_PUBLIC_KEY, "NOVALUE"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "expected NAME=VALUE");
}

#[test]
fn test_bad_config_file() {
    let t = Test::new();
    let config = t.path("config.toml");
    std::fs::write(&config, "[backend]\nkind = \"enigma\"\n").unwrap();

    let output = t
        .cmd()
        .env("LOCKBOX_CONFIG", &config)
        .args(["recipients", "secrets.yaml"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "failed to parse config file");
}
