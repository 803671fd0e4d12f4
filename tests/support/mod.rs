#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Fresh data dir with `ana` registered and logged in.
    pub fn registered() -> Self {
        let env = Self::new();
        env.cmd()
            .args(["register", "ana", "--password", "secret"])
            .assert()
            .success();
        env
    }

    pub fn data_dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("agenda").expect("binary");
        cmd.env("AGENDA_DIR", self.dir.path())
            .env_remove("AGENDA_PASSWORD")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run with `--json` and parse the envelope from stdout.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd().arg("--json").args(args).output().expect("run");
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    /// Add a Monday/Wednesday 07:00-08:00 task and return its id.
    pub fn add_task(&self, title: &str) -> String {
        let value = self.json(&[
            "task",
            "add",
            title,
            "--days",
            "monday,wednesday",
            "--start",
            "07:00",
            "--end",
            "08:00",
        ]);
        assert_eq!(value["status"], "success", "{value}");
        value["data"]["task"]["id"]
            .as_str()
            .expect("task id")
            .to_string()
    }

    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn read_key(&self, name: &str) -> Option<Value> {
        let path = self.dir.path().join(name);
        let raw = fs::read_to_string(path).ok()?;
        Some(serde_json::from_str(&raw).expect("stored json"))
    }
}
