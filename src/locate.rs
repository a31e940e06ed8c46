use crate::platform;
use regex::Regex;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\d.]+").expect("version pattern"));

/// Search the `PATH` environment variable for an executable named `filename`.
/// Returns the absolute path of the first match in search order, or `None`
/// when `PATH` is unset or holds no matching executable.
pub fn find_binary_in_path(filename: &str) -> Option<PathBuf> {
    find_in_search_path(env::var("PATH").ok().as_deref(), filename)
}

fn find_in_search_path(search_path: Option<&str>, filename: &str) -> Option<PathBuf> {
    for directory in search_path?.split(platform::path_separator()) {
        if directory.is_empty() {
            continue;
        }
        let candidate = Path::new(directory).join(filename);
        if is_executable_file(&candidate) {
            return Some(std::path::absolute(&candidate).unwrap_or(candidate));
        }
    }
    None
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.is_file()
        && std::fs::metadata(path)
            .map(|m| m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Run `binary --version` and compare the first dotted-number run of its
/// output against `required_version`. Every failure mode (missing binary,
/// non-zero exit, unparsable output) reads as a mismatch rather than an
/// error; callers only use this to decide whether a binary can be reused.
pub fn check_version(binary: &Path, required_version: &str) -> bool {
    let Ok(output) = Command::new(binary).arg("--version").output() else {
        return false;
    };
    if !output.status.success() {
        return false;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    VERSION_RE
        .find(&stdout)
        .is_some_and(|m| m.as_str() == required_version)
}
