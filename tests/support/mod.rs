#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// An isolated home for one test: its own config dir, data dir and document.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn data_file(&self) -> PathBuf {
        self.dir.path().join("checklistData.json")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_document(&self) -> Value {
        let text = fs::read_to_string(self.data_file()).expect("read document");
        serde_json::from_str(&text).expect("document is json")
    }

    /// `cl` pointed at this home's document, with no ambient config.
    pub fn cl(&self) -> Command {
        let mut cmd = cl_cmd();
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env("CL_DATA", self.data_file());
        cmd
    }

    /// Run `cl --json <args>`, assert success and return the `data` payload.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .cl()
            .arg("--json")
            .args(args)
            .output()
            .expect("run cl");
        assert!(
            output.status.success(),
            "cl {args:?} failed: {}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }
}

pub fn cl_cmd() -> Command {
    let mut cmd = Command::cargo_bin("cl").expect("binary");
    cmd.env_remove("CL_DATA")
        .env_remove("CL_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id").to_string()
}
