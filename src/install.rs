use crate::platform::{self, Platform};
use crate::ui::prelude::*;
use crate::{locate, release};
use anyhow::{Context, Result, bail};
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

/// Which branch of the install pass ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A matching binary was found on `PATH` and copied into the install
    /// directory; carries the path it was copied from.
    CopiedExisting(PathBuf),
    /// The install directory already held a binary reporting the requested
    /// version; nothing was fetched.
    AlreadyInstalled,
    /// The archive was downloaded and extracted; carries the archive URL.
    Downloaded(String),
}

/// Install chromedriver `version` into `dir`. Single pass, no retries:
/// reuse a matching binary from `PATH` if one exists, otherwise download the
/// archive for the current platform and extract it. Re-running against an
/// already-correct install directory performs no network I/O.
pub fn install(version: &str, dir: &Path) -> Result<Outcome> {
    install_with(&release::Endpoints::default(), version, dir)
}

fn install_with(endpoints: &release::Endpoints, version: &str, dir: &Path) -> Result<Outcome> {
    let filename = platform::driver_filename();
    let target = dir.join(filename);

    if let Some(existing) = locate::find_binary_in_path(filename) {
        if !is_same_file(&existing, &target) && locate::check_version(&existing, version) {
            emit(
                Level::Info,
                "install.reuse",
                &format!("Chromedriver already installed at {}", existing.display()),
                None,
            );
            fs::create_dir_all(dir)
                .with_context(|| format!("creating install directory at {}", dir.display()))?;
            fs::copy(&existing, &target).with_context(|| {
                format!("copying {} to {}", existing.display(), target.display())
            })?;
            ensure_executable(&target)?;
            return Ok(Outcome::CopiedExisting(existing));
        }
    }

    if target.is_file() && locate::check_version(&target, version) {
        emit(
            Level::Info,
            "install.present",
            &format!("Chromedriver already installed at {}", target.display()),
            None,
        );
        return Ok(Outcome::AlreadyInstalled);
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("creating install directory at {}", dir.display()))?;
    let platform = Platform::detect()?;
    let url = release::download_url_with(endpoints, version, platform)?;
    emit(
        Level::Info,
        "install.download",
        &format!("Downloading chromedriver {version} for {platform}..."),
        None,
    );
    let archive = fetch_archive(&url)?;
    extract_archive(&archive, dir)?;
    ensure_executable(&target)?;
    emit(
        Level::Success,
        "install.done",
        &format!("Installed chromedriver {version} at {}", target.display()),
        None,
    );
    Ok(Outcome::Downloaded(url))
}

/// A `PATH` hit can be the install target itself under another spelling
/// (symlink alias, relative install dir). Copying that onto the target would
/// truncate the binary, so compare inodes via canonicalized paths and fall
/// back to the lexical comparison when either side cannot be resolved.
fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn fetch_archive(url: &str) -> Result<Vec<u8>> {
    let response = release::client()?
        .get(url)
        .send()
        .with_context(|| format!("Failed to download chromedriver archive: {url}"))?;
    if !response.status().is_success() {
        bail!("Failed to download chromedriver archive: {url}");
    }
    let bytes = response
        .bytes()
        .with_context(|| format!("Failed to download chromedriver archive: {url}"))?;
    Ok(bytes.to_vec())
}

/// Extract every file of an in-memory zip archive into `dir`, flattening any
/// folder structure the archive carries down to bare filenames.
fn extract_archive(bytes: &[u8], dir: &Path) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to open chromedriver archive")?;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("Failed to read archive entry {index}"))?;
        if entry.is_dir() {
            continue;
        }
        let Some(basename) = entry
            .enclosed_name()
            .and_then(|name| name.file_name().map(PathBuf::from))
        else {
            continue;
        };
        let outpath = dir.join(basename);
        let mut out = fs::File::create(&outpath)
            .with_context(|| format!("Failed to create {}", outpath.display()))?;
        io::copy(&mut entry, &mut out)
            .with_context(|| format!("Failed to extract {}", outpath.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}

#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to stat installed binary at {}", path.display()))?;
    let mut perms = metadata.permissions();
    if perms.mode() & 0o111 == 0 {
        perms.set_mode(0o744);
        fs::set_permissions(path, perms)
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn ensure_executable(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("Installed binary missing at {}", path.display());
    }
    Ok(())
}
