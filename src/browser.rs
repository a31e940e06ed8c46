use regex::Regex;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

// Matches a browser version like "128.0.6582.0" and captures the major part.
static BROWSER_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:\.\d+){2,3}").expect("browser version pattern"));

const BROWSER_EXECUTABLES: &[&str] = &[
    "google-chrome",
    "chrome",
    "chrome-browser",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
];

#[cfg(target_os = "macos")]
const MAC_APP_BUNDLE_BINARY: &str =
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome";

fn browser_candidates() -> Vec<&'static str> {
    let mut candidates = Vec::new();
    #[cfg(target_os = "macos")]
    candidates.push(MAC_APP_BUNDLE_BINARY);
    candidates.extend_from_slice(BROWSER_EXECUTABLES);
    candidates
}

/// Detect the major version of the installed Chrome or Chromium browser by
/// probing the usual executable names with `--version`. Candidates that are
/// missing or misbehave are skipped; `None` means no browser was found.
pub fn chrome_major_version() -> Option<String> {
    for candidate in browser_candidates() {
        let path = if candidate.contains(std::path::MAIN_SEPARATOR) {
            PathBuf::from(candidate)
        } else {
            match which::which(candidate) {
                Ok(path) => path,
                Err(_) => continue,
            }
        };
        let Ok(output) = Command::new(&path).arg("--version").output() else {
            continue;
        };
        if !output.status.success() {
            continue;
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(captures) = BROWSER_VERSION_RE.captures(&stdout) {
            return Some(captures[1].to_string());
        }
    }
    None
}
