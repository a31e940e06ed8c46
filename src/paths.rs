use crate::platform;
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Name of the per-user directory the driver binary is installed into.
pub const INSTALL_DIR_NAME: &str = "chromedriver-fetch";

/// Default install directory, created on demand under the user data dir.
pub fn install_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Unable to determine user data directory")?
        .join(INSTALL_DIR_NAME);

    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating install directory at {}", dir.display()))?;

    Ok(dir)
}

/// Full path of the driver binary inside an install directory.
pub fn driver_path(dir: &Path) -> PathBuf {
    dir.join(platform::driver_filename())
}

/// Register `dir` on the process's `PATH` so downstream tooling resolves the
/// bare driver name. Appends at most once; a directory already present is
/// left alone. Process-wide mutation, meant to be called once during startup.
pub fn add_to_path(dir: &Path) {
    let dir = dir.to_string_lossy();
    match env::var("PATH") {
        Err(_) => unsafe { env::set_var("PATH", dir.as_ref()) },
        Ok(current) if !current.contains(dir.as_ref()) => {
            let updated = format!("{current}{}{dir}", platform::path_separator());
            unsafe { env::set_var("PATH", updated) }
        }
        Ok(_) => {}
    }
}

/// Publish the default install directory on `PATH` and return the driver
/// binary path for programmatic consumers.
pub fn add_chromedriver_to_path() -> Result<PathBuf> {
    let dir = install_dir()?;
    add_to_path(&dir);
    Ok(driver_path(&dir))
}
