//! Tests for `lockbox encrypt` and `decrypt`.

use crate::support::*;

#[test]
fn test_encrypt_decrypt_with_identity() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    std::fs::write(t.path("notes.txt"), "meeting at noon\n").unwrap();

    let output = t
        .cmd()
        .args(["encrypt", "notes.txt", "-o", "notes.age", "-r", &public, "--armor"])
        .output()
        .unwrap();
    assert_success(&output);
    let sealed = std::fs::read_to_string(t.path("notes.age")).unwrap();
    assert!(sealed.starts_with("-----BEGIN AGE ENCRYPTED FILE-----"));

    let output = t
        .cmd()
        .args(["decrypt", "notes.age", "-i", "key.txt"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "meeting at noon\n");
}

#[test]
fn test_encrypt_decrypt_with_passphrase() {
    let t = Test::new();
    std::fs::write(t.path("data.bin"), [1u8, 2, 3]).unwrap();

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "correct horse battery staple")
        .args(["encrypt", "data.bin", "-o", "data.age", "--passphrase"])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "correct horse battery staple")
        .args(["decrypt", "data.age", "-o", "data.out", "--passphrase"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(std::fs::read(t.path("data.out")).unwrap(), [1u8, 2, 3]);

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "wrong")
        .args(["decrypt", "data.age", "--passphrase"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert_stderr_contains(&output, "authentication failed");
}

#[test]
fn test_encrypt_requires_recipient_or_passphrase() {
    let t = Test::new();
    std::fs::write(t.path("notes.txt"), "x").unwrap();

    let output = t
        .cmd()
        .args(["encrypt", "notes.txt", "-o", "notes.age"])
        .output()
        .unwrap();
    assert_failure(&output);
    assert!(!t.path("notes.age").exists());
}

#[test]
fn test_decrypt_passphrase_overrides_identity_env() {
    let t = Test::new();
    std::fs::write(t.path("p.txt"), "pw-protected\n").unwrap();

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "pw")
        .args(["encrypt", "p.txt", "-o", "p.age", "--passphrase"])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t
        .cmd()
        .env("LOCKBOX_IDENTITY", "/nonexistent")
        .env("LOCKBOX_PASSPHRASE", "pw")
        .args(["decrypt", "p.age", "-p"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "pw-protected\n");
}

#[test]
fn test_decrypt_with_passphrase_protected_identity() {
    let t = Test::new();
    let public = t.keygen("key.txt");
    std::fs::write(t.path("notes.txt"), "meeting at noon\n").unwrap();

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "key-pass")
        .args(["encrypt", "key.txt", "-o", "key.age", "--passphrase"])
        .output()
        .unwrap();
    assert_success(&output);
    let output = t
        .cmd()
        .args(["encrypt", "notes.txt", "-o", "notes.age", "-r", &public])
        .output()
        .unwrap();
    assert_success(&output);

    let output = t
        .cmd()
        .args(["decrypt", "notes.age", "-i", "key.age"])
        .output()
        .unwrap();
    assert_failure(&output);

    let output = t
        .cmd()
        .env("LOCKBOX_PASSPHRASE", "key-pass")
        .args(["decrypt", "notes.age", "-i", "key.age", "--identity-passphrase"])
        .output()
        .unwrap();
    assert_success(&output);
    assert_eq!(stdout(&output), "meeting at noon\n");
}

#[test]
fn test_identity_passphrase_conflicts_with_passphrase() {
    let t = Test::new();
    let output = t
        .cmd()
        .args(["decrypt", "x.age", "--passphrase", "--identity-passphrase"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}
