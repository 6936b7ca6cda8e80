//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a lockbox command with an isolated environment.
    ///
    /// Returns a Command configured with:
    /// - HOME and XDG_CONFIG_HOME pointing at the temporary home (no config file)
    /// - no inherited LOCKBOX_* variables
    /// - the in-process age backend
    /// - the test directory as working directory
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("lockbox").expect("failed to find lockbox binary");
        cmd.env("HOME", self.home.path());
        cmd.env("USERPROFILE", self.home.path());
        cmd.env("XDG_CONFIG_HOME", self.home.path());
        cmd.env("NO_COLOR", "1");
        for var in [
            "LOCKBOX_CONFIG",
            "LOCKBOX_IDENTITY",
            "LOCKBOX_PASSPHRASE",
            "LOCKBOX_LOG",
        ] {
            cmd.env_remove(var);
        }
        cmd.current_dir(self.dir.path());
        cmd.args(["--backend", "native"]);
        cmd
    }

    /// Shortcut for `lockbox keygen -o <name>`; returns the public key.
    pub fn keygen(&self, name: &str) -> String {
        let output = self
            .cmd()
            .args(["keygen", "-o", name])
            .output()
            .expect("failed to run lockbox keygen");
        super::assert_success(&output);

        let text = std::fs::read_to_string(self.path(name)).expect("key file missing");
        text.lines()
            .find_map(|line| line.strip_prefix("# public key: "))
            .expect("key file has no public key")
            .to_string()
    }

    /// Shortcut for `lockbox put` creating a store.
    pub fn put_new(&self, store: &str, recipient: &str, pairs: &[&str]) -> Output {
        self.cmd()
            .args(["put", store, "--recipient", recipient])
            .args(pairs)
            .output()
            .expect("failed to run lockbox put")
    }

    /// Shortcut for `lockbox put` updating a store.
    pub fn put(&self, store: &str, identity: &str, pairs: &[&str]) -> Output {
        self.cmd()
            .args(["put", store, "--identity", identity])
            .args(pairs)
            .output()
            .expect("failed to run lockbox put")
    }

    /// Shortcut for `lockbox get`.
    pub fn get(&self, store: &str, identity: &str, names: &[&str]) -> Output {
        self.cmd()
            .args(["get", store, "--identity", identity])
            .args(names)
            .output()
            .expect("failed to run lockbox get")
    }

    /// Shortcut for `lockbox run <store> -- <command>`.
    pub fn run(&self, store: &str, identity: &str, command: &[&str]) -> Output {
        self.cmd()
            .args(["run", store, "--identity", identity, "--"])
            .args(command)
            .output()
            .expect("failed to run lockbox run")
    }
}
