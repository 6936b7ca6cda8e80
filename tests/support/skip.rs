/// Skip a test if the `age` binaries are not installed.
#[macro_export]
macro_rules! skip_without_age {
    () => {
        if which::which("age").is_err() || which::which("age-keygen").is_err() {
            eprintln!("SKIPPED: age CLI not installed");
            return;
        }
    };
}

/// Skip a test if the `sops` binary is not installed.
#[macro_export]
macro_rules! skip_without_sops {
    () => {
        if which::which("sops").is_err() {
            eprintln!("SKIPPED: sops not installed");
            return;
        }
    };
}
