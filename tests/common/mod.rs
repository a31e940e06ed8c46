#![cfg(unix)]

use anyhow::Result;
use std::env;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch environment for installer tests: temp directories plus a guard
/// that restores the original `PATH` when the test finishes.
pub struct TestEnvironment {
    temp_dir: TempDir,
    original_path: Option<String>,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
            original_path: env::var("PATH").ok(),
        })
    }

    /// Create a fresh subdirectory to serve as an install dir or PATH entry.
    pub fn mkdir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Replace `PATH` with exactly the given directories.
    pub fn set_search_path(&self, dirs: &[&Path]) {
        let joined = dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(&chromedriver_fetch::path_separator().to_string());
        unsafe { env::set_var("PATH", joined) };
    }

    pub fn clear_search_path(&self) {
        unsafe { env::remove_var("PATH") };
    }

    /// Write a fake chromedriver script that reports the given version and
    /// mark it executable.
    pub fn write_fake_driver(&self, dir: &Path, version: &str) -> Result<PathBuf> {
        use std::os::unix::fs::PermissionsExt;

        let bin = dir.join(chromedriver_fetch::driver_filename());
        std::fs::write(
            &bin,
            format!("#!/bin/sh\necho \"ChromeDriver {version} (0123456789abcdef)\"\n"),
        )?;
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755))?;
        Ok(bin)
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        match &self.original_path {
            Some(original) => unsafe { env::set_var("PATH", original) },
            None => unsafe { env::remove_var("PATH") },
        }
    }
}
