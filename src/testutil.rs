#![cfg(test)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::frontend::{CellHandling, Frontend};
use crate::logsink::LogSink;

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a minimal well-formed notebook at `name`, creating parents.
    pub fn write_notebook(&self, name: &str) -> PathBuf {
        let nb = serde_json::json!({
            "cells": [{
                "cell_type": "code",
                "execution_count": null,
                "metadata": {},
                "outputs": [],
                "source": ["print(\"hello\")"]
            }],
            "metadata": {
                "kernelspec": {
                    "display_name": "Python 3",
                    "language": "python",
                    "name": "python3"
                }
            },
            "nbformat": 4,
            "nbformat_minor": 5
        });
        let pretty = serde_json::to_string_pretty(&nb).unwrap();
        self.write_file(name, pretty.as_bytes())
    }

    pub fn write_file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Executable `#!/bin/sh` script standing in for the engine.
    #[cfg(unix)]
    pub fn stub_engine(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let dir = self.dir.path().join("bin");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("log").join("export.log")
    }

    pub fn log_sink(&self) -> LogSink {
        LogSink::begin(&self.log_path()).expect("failed to open test log sink")
    }

    pub fn read_log(&self) -> String {
        std::fs::read_to_string(self.log_path()).expect("failed to read test log")
    }
}

/// Frontend with canned answers that records what was asked of it.
#[derive(Default)]
pub struct ScriptedFrontend {
    pub active: Option<PathBuf>,
    pub picked_notebook: Option<PathBuf>,
    pub picked_dir: Option<PathBuf>,
    pub execution_answer: Option<CellHandling>,
    pub prompts: Cell<usize>,
    pub revealed: RefCell<Vec<PathBuf>>,
}

impl Frontend for ScriptedFrontend {
    fn active_document(&self) -> Option<PathBuf> {
        self.active.clone()
    }

    fn pick_notebook(&self) -> Option<PathBuf> {
        self.picked_notebook.clone()
    }

    fn pick_output_dir(&self, _start: &Path) -> Option<PathBuf> {
        self.picked_dir.clone()
    }

    fn confirm_execution(&self) -> Option<CellHandling> {
        self.prompts.set(self.prompts.get() + 1);
        self.execution_answer
    }

    fn reveal(&self, path: &Path) {
        self.revealed.borrow_mut().push(path.to_path_buf());
    }
}

/// Restores the working directory on drop. Pair with #[serial]: the
/// working directory is process-global.
pub struct CwdGuard {
    saved: PathBuf,
}

impl CwdGuard {
    pub fn set(dir: impl AsRef<Path>) -> Self {
        let saved = std::env::current_dir().expect("failed to read current dir");
        std::env::set_current_dir(dir.as_ref()).expect("failed to change current dir");
        Self { saved }
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.saved);
    }
}

/// Restores one environment variable on drop. Pair with #[serial]: the
/// environment is process-global.
pub struct XdgEnvGuard {
    var: &'static str,
    saved: Option<String>,
}

impl XdgEnvGuard {
    pub fn set(var: &'static str, value: impl AsRef<Path>) -> Self {
        let saved = std::env::var(var).ok();
        std::env::set_var(var, value.as_ref());
        Self { var, saved }
    }
}

impl Drop for XdgEnvGuard {
    fn drop(&mut self) {
        match &self.saved {
            Some(v) => std::env::set_var(self.var, v),
            None => std::env::remove_var(self.var),
        }
    }
}
