use crate::platform::Platform;
use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// Chrome switched to publishing chromedriver through the Chrome for Testing
/// JSON manifests at milestone 115; per-milestone version metadata starts at
/// 113. Older pinned versions still resolve through the legacy storage bucket.
const MILESTONE_CUTOFF: u32 = 113;
const MANIFEST_CUTOFF: u32 = 115;

const LAST_KNOWN_GOOD_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/last-known-good-versions.json";
const PER_MILESTONE_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/latest-versions-per-milestone.json";
const PER_BUILD_URL: &str =
    "https://googlechromelabs.github.io/chrome-for-testing/latest-patch-versions-per-build-with-downloads.json";
const LEGACY_LATEST_URL: &str = "https://chromedriver.storage.googleapis.com/LATEST_RELEASE";
const LEGACY_ARCHIVE_BASE: &str = "https://chromedriver.storage.googleapis.com/";

/// Metadata endpoint locations, swappable so tests can point them at a local
/// HTTP server.
pub(crate) struct Endpoints {
    pub(crate) last_known_good: String,
    pub(crate) per_milestone: String,
    pub(crate) per_build: String,
    pub(crate) legacy_latest: String,
    pub(crate) legacy_archive_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            last_known_good: LAST_KNOWN_GOOD_URL.to_string(),
            per_milestone: PER_MILESTONE_URL.to_string(),
            per_build: PER_BUILD_URL.to_string(),
            legacy_latest: LEGACY_LATEST_URL.to_string(),
            legacy_archive_base: LEGACY_ARCHIVE_BASE.to_string(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct LastKnownGoodVersions {
    channels: HashMap<String, Channel>,
}

#[derive(Deserialize, Debug)]
struct Channel {
    version: String,
}

#[derive(Deserialize, Debug)]
struct MilestoneVersions {
    milestones: HashMap<String, Milestone>,
}

#[derive(Deserialize, Debug)]
struct Milestone {
    version: String,
}

#[derive(Deserialize, Debug)]
struct BuildVersions {
    builds: HashMap<String, Build>,
}

#[derive(Deserialize, Debug)]
struct Build {
    downloads: Downloads,
}

#[derive(Deserialize, Debug, Default)]
struct Downloads {
    #[serde(default)]
    chromedriver: Vec<DownloadEntry>,
}

#[derive(Deserialize, Debug)]
struct DownloadEntry {
    platform: String,
    url: String,
}

/// First dotted component of a version string, parsed as a milestone number.
pub fn major_version(version: &str) -> Result<u32> {
    version
        .split('.')
        .next()
        .and_then(|part| part.parse().ok())
        .ok_or_else(|| anyhow!("Invalid chromedriver version: {version}"))
}

/// Truncate a fully-qualified version to its build prefix (major.minor.build),
/// the key format of the per-build download manifest.
fn build_prefix(version: &str) -> String {
    version.split('.').take(3).collect::<Vec<_>>().join(".")
}

/// Resolve an optional major-version hint to a fully-qualified chromedriver
/// version. No hint returns the current Stable channel release.
pub fn resolve_version(hint: Option<&str>) -> Result<String> {
    resolve_version_with(&Endpoints::default(), hint)
}

fn resolve_version_with(endpoints: &Endpoints, hint: Option<&str>) -> Result<String> {
    resolve_version_inner(endpoints, hint).with_context(|| {
        format!(
            "Failed to find release information for {}",
            hint.unwrap_or("latest")
        )
    })
}

fn resolve_version_inner(endpoints: &Endpoints, hint: Option<&str>) -> Result<String> {
    let Some(hint) = hint else {
        let known_good: LastKnownGoodVersions = get_json(&endpoints.last_known_good)?;
        return known_good
            .channels
            .get("Stable")
            .map(|channel| channel.version.clone())
            .ok_or_else(|| anyhow!("No Stable channel in {}", endpoints.last_known_good));
    };

    let major = major_version(hint)?;
    if major >= MILESTONE_CUTOFF {
        let milestones: MilestoneVersions = get_json(&endpoints.per_milestone)?;
        milestones
            .milestones
            .get(&major.to_string())
            .map(|milestone| milestone.version.clone())
            .ok_or_else(|| anyhow!("No release listed for milestone {major}"))
    } else {
        // Pre-113 releases only exist in the legacy storage bucket, which
        // serves the latest release as a plain text body.
        get_text(&format!("{}_{major}", endpoints.legacy_latest))
    }
}

/// Resolve the archive download URL for a version on a platform. Versions from
/// 115 on are looked up in the per-build download manifest; older versions use
/// the fixed-path convention of the legacy storage bucket.
pub fn download_url(version: &str, platform: Platform) -> Result<String> {
    download_url_with(&Endpoints::default(), version, platform)
}

pub(crate) fn download_url_with(
    endpoints: &Endpoints,
    version: &str,
    platform: Platform,
) -> Result<String> {
    let major = major_version(version)?;
    if major < MANIFEST_CUTOFF {
        return Ok(format!(
            "{}{version}/chromedriver_{}.zip",
            endpoints.legacy_archive_base,
            platform.legacy_archive_suffix(major)
        ));
    }

    let prefix = build_prefix(version);
    let builds: BuildVersions = get_json(&endpoints.per_build)?;
    builds
        .builds
        .get(&prefix)
        .and_then(|build| {
            build
                .downloads
                .chromedriver
                .iter()
                .find(|entry| entry.platform == platform.tag())
        })
        .map(|entry| entry.url.clone())
        .ok_or_else(|| {
            anyhow!("Could not determine chromedriver download URL for {version} on {platform}")
        })
}

pub(crate) fn client() -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .user_agent(format!(
            "{}/{}",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("Failed to create HTTP client")
}

fn get_json<T: DeserializeOwned>(url: &str) -> Result<T> {
    let response = client()?
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {url}"))?;
    if !response.status().is_success() {
        bail!("{url} returned status {}", response.status());
    }
    response
        .json::<T>()
        .with_context(|| format!("Failed to parse {url}"))
}

fn get_text(url: &str) -> Result<String> {
    let response = client()?
        .get(url)
        .send()
        .with_context(|| format!("Failed to fetch {url}"))?;
    if !response.status().is_success() {
        bail!("{url} returned status {}", response.status());
    }
    let body = response
        .text()
        .with_context(|| format!("Failed to read {url}"))?;
    Ok(body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints_for(server: &mockito::Server) -> Endpoints {
        let base = server.url();
        Endpoints {
            last_known_good: format!("{base}/last-known-good-versions.json"),
            per_milestone: format!("{base}/latest-versions-per-milestone.json"),
            per_build: format!("{base}/latest-patch-versions-per-build-with-downloads.json"),
            legacy_latest: format!("{base}/LATEST_RELEASE"),
            legacy_archive_base: format!("{base}/"),
        }
    }

    #[test]
    fn major_version_takes_the_first_component() {
        assert_eq!(major_version("128.0.6582.0").unwrap(), 128);
        assert_eq!(major_version("113").unwrap(), 113);
        assert!(major_version("").is_err());
        assert!(major_version("stable").is_err());
    }

    #[test]
    fn build_prefix_truncates_to_three_components() {
        assert_eq!(build_prefix("128.0.6582.0"), "128.0.6582");
        assert_eq!(build_prefix("115.0.5790"), "115.0.5790");
    }

    #[test]
    fn no_hint_resolves_the_stable_channel() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/last-known-good-versions.json")
            .with_body(
                r#"{"channels": {"Stable": {"version": "128.0.6582.0"},
                                 "Beta": {"version": "129.0.6655.2"}}}"#,
            )
            .create();

        let version = resolve_version_with(&endpoints_for(&server), None).unwrap();
        assert_eq!(version, "128.0.6582.0");
        mock.assert();
    }

    #[test]
    fn milestone_hint_resolves_through_the_milestone_document() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/latest-versions-per-milestone.json")
            .with_body(r#"{"milestones": {"113": {"version": "113.0.5672.63"}}}"#)
            .create();

        // 113 is the first milestone covered by the new metadata service
        let version = resolve_version_with(&endpoints_for(&server), Some("113")).unwrap();
        assert_eq!(version, "113.0.5672.63");
        mock.assert();
    }

    #[test]
    fn old_hint_resolves_through_the_legacy_release_endpoint() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/LATEST_RELEASE_112")
            .with_body("112.0.5615.49\n")
            .create();

        let version = resolve_version_with(&endpoints_for(&server), Some("112")).unwrap();
        assert_eq!(version, "112.0.5615.49");
        mock.assert();
    }

    #[test]
    fn missing_milestone_reports_the_hint() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/latest-versions-per-milestone.json")
            .with_body(r#"{"milestones": {}}"#)
            .create();

        let err = resolve_version_with(&endpoints_for(&server), Some("120")).unwrap_err();
        assert!(err.to_string().contains("120"));
    }

    #[test]
    fn metadata_fetch_failure_names_the_hint() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/last-known-good-versions.json")
            .with_status(500)
            .create();

        let err = resolve_version_with(&endpoints_for(&server), None).unwrap_err();
        assert!(
            err.to_string()
                .contains("Failed to find release information for latest")
        );
    }

    #[test]
    fn manifest_scheme_starts_exactly_at_115() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/latest-patch-versions-per-build-with-downloads.json")
            .with_body(
                r#"{"builds": {"115.0.5790": {"downloads": {"chromedriver": [
                     {"platform": "linux64",
                      "url": "https://example.invalid/115/linux64.zip"}]}}}}"#,
            )
            .create();

        let url =
            download_url_with(&endpoints_for(&server), "115.0.5790.170", Platform::Linux64).unwrap();
        assert_eq!(url, "https://example.invalid/115/linux64.zip");
    }

    #[test]
    fn versions_below_115_use_the_fixed_path_scheme() {
        let server = mockito::Server::new();
        let endpoints = endpoints_for(&server);

        let url = download_url_with(&endpoints, "114.0.5735.90", Platform::Linux64).unwrap();
        assert_eq!(
            url,
            format!(
                "{}/114.0.5735.90/chromedriver_linux64.zip",
                server.url()
            )
        );

        // Apple Silicon archives were renamed at 107
        let url = download_url_with(&endpoints, "106.0.5249.61", Platform::MacArm64).unwrap();
        assert!(url.ends_with("/106.0.5249.61/chromedriver_mac64_m1.zip"));
        let url = download_url_with(&endpoints, "107.0.5304.62", Platform::MacArm64).unwrap();
        assert!(url.ends_with("/107.0.5304.62/chromedriver_mac_arm64.zip"));
    }

    #[test]
    fn missing_platform_entry_is_an_error() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/latest-patch-versions-per-build-with-downloads.json")
            .with_body(
                r#"{"builds": {"128.0.6582": {"downloads": {"chromedriver": [
                     {"platform": "linux64", "url": "https://example.invalid/l.zip"}]}}}}"#,
            )
            .create();

        let err = download_url_with(&endpoints_for(&server), "128.0.6582.0", Platform::Win64)
            .unwrap_err();
        assert!(
            err.to_string()
                .contains("Could not determine chromedriver download URL")
        );
    }

    #[test]
    fn builds_without_a_chromedriver_section_still_parse() {
        let mut server = mockito::Server::new();
        server
            .mock("GET", "/latest-patch-versions-per-build-with-downloads.json")
            .with_body(r#"{"builds": {"128.0.6582": {"downloads": {}}}}"#)
            .create();

        assert!(
            download_url_with(&endpoints_for(&server), "128.0.6582.0", Platform::Linux64).is_err()
        );
    }
}
