use anyhow::{Result, anyhow};
use std::env;
use std::fmt;

/// A platform chromedriver is published for, named the way the Chrome for
/// Testing download manifests name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// 64-bit Linux (no 32-bit Linux builds exist)
    Linux64,
    /// Intel macOS
    MacX64,
    /// Apple Silicon macOS
    MacArm64,
    /// 32-bit Windows
    Win32,
    /// 64-bit Windows
    Win64,
}

impl Platform {
    /// Detect the platform of the running host.
    pub fn detect() -> Result<Self> {
        Self::from_host(
            env::consts::OS,
            env::consts::ARCH,
            cfg!(target_pointer_width = "64"),
        )
    }

    fn from_host(os: &str, arch: &str, is_64bit: bool) -> Result<Self> {
        match (os, arch) {
            ("linux", _) if is_64bit => Ok(Self::Linux64),
            ("macos", "aarch64") => Ok(Self::MacArm64),
            ("macos", _) => Ok(Self::MacX64),
            ("windows", _) if is_64bit => Ok(Self::Win64),
            ("windows", _) => Ok(Self::Win32),
            (os, arch) => Err(anyhow!(
                "Could not determine chromedriver platform: {os}/{arch} is not supported"
            )),
        }
    }

    /// Platform tag used by the Chrome for Testing download manifests.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Linux64 => "linux64",
            Self::MacX64 => "mac-x64",
            Self::MacArm64 => "mac-arm64",
            Self::Win32 => "win32",
            Self::Win64 => "win64",
        }
    }

    /// Archive name suffix used by the legacy fixed-path download scheme
    /// (versions below 115). Apple Silicon archives were published under the
    /// `mac64_m1` name before 107, and Windows archives only ever existed as
    /// `win32`.
    pub fn legacy_archive_suffix(self, major: u32) -> &'static str {
        match self {
            Self::Linux64 => "linux64",
            Self::MacX64 => "mac64",
            Self::MacArm64 if major < 107 => "mac64_m1",
            Self::MacArm64 => "mac_arm64",
            Self::Win32 | Self::Win64 => "win32",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Filename of the chromedriver binary on the current OS.
pub fn driver_filename() -> &'static str {
    if cfg!(windows) {
        "chromedriver.exe"
    } else {
        "chromedriver"
    }
}

/// Separator between entries of the `PATH` environment variable.
pub fn path_separator() -> char {
    if cfg!(windows) { ';' } else { ':' }
}
