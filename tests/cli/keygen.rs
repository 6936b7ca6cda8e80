//! Tests for `lockbox keygen`.

use crate::support::*;

#[test]
fn test_keygen_to_file() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    assert!(public.starts_with("age1"));

    let contents = std::fs::read_to_string(t.path("key.txt")).unwrap();
    assert!(contents.contains("AGE-SECRET-KEY-"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(t.path("key.txt")).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }
}

#[test]
fn test_keygen_refuses_overwrite() {
    let t = Test::new();
    t.keygen("key.txt");
    let before = std::fs::read(t.path("key.txt")).unwrap();

    let output = t.cmd().args(["keygen", "-o", "key.txt"]).output().unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "refusing to overwrite");
    assert_eq!(std::fs::read(t.path("key.txt")).unwrap(), before);
}

#[test]
fn test_keygen_to_stdout() {
    let t = Test::new();
    let output = t.cmd().arg("keygen").output().unwrap();
    assert_success(&output);
    assert_stdout_contains(&output, "# public key: age1");
    assert_stdout_contains(&output, "AGE-SECRET-KEY-");
}
