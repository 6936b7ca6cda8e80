//! Tests for `lockbox put`, `get` and `recipients`.

use crate::support::*;

#[test]
fn test_put_then_get() {
    let t = Test::new();
    let public = t.keygen("key.txt");

    let output = t.put_new("secrets.yaml", &public, &["API_KEY=sk-123", "DB=postgres://x"]);
    assert_success(&output);
    assert_stderr_contains(&output, "stored 2 secrets");

    let output = t.get("secrets.yaml", "key.txt", &[]);
    assert_success(&output);
    assert_eq!(stdout(&output), "API_KEY=sk-123\nDB=postgres://x\n");
}

#[test]
fn test_update_merges() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));
    assert_success(&t.put("secrets.yaml", "key.txt", &["A=2", "B=3"]));

    let output = t.get("secrets.yaml", "key.txt", &[]);
    assert_success(&output);
    assert_eq!(stdout(&output), "A=2\nB=3\n");
}

#[test]
fn test_get_subset_warns_on_missing() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1", "B=2"]));

    let output = t.get("secrets.yaml", "key.txt", &["B", "NOPE"]);
    assert_success(&output);
    assert_eq!(stdout(&output), "B=2\n");
    assert_stderr_contains(&output, "secret 'NOPE' not found");
}

#[test]
fn test_get_json() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t
        .cmd()
        .args(["get", "secrets.yaml", "--identity", "key.txt", "--json"])
        .output()
        .unwrap();
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["A"], "1");
}

#[test]
fn test_identity_from_env() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t
        .cmd()
        .env("LOCKBOX_IDENTITY", t.path("key.txt"))
        .args(["get", "secrets.yaml"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "A=1\n");
}

#[test]
fn test_recipients_command() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["A=1"]));

    let output = t
        .cmd()
        .args(["recipients", "secrets.yaml", "--json"])
        .output()
        .unwrap();
    assert_success(&output);
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["format"], "custom");
    assert_eq!(parsed["recipients"][0], public.as_str());
}

#[test]
fn test_store_file_holds_no_plaintext() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert_success(&t.put_new("secrets.yaml", &public, &["TOKEN=very-secret-token"]));

    assert_file_excludes(&t.path("secrets.yaml"), "very-secret-token");
    let contents = std::fs::read_to_string(t.path("secrets.yaml")).unwrap();
    assert!(contents.contains("TOKEN:"));
    assert!(contents.contains("lockbox_version"));
}
