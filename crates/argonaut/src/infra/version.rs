//! Version discovery and self-upgrade helpers.

use semver::Version;
use serde::Deserialize;

const RELEASES_LATEST_URL: &str =
    "https://api.github.com/repos/argonaut-tui/argonaut/releases/latest";

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: String,
    body: Option<String>,
}

/// Returns the latest release tag (`vX.Y.Z`), if reachable.
pub async fn latest_release_tag() -> Option<String> {
    fetch_latest_release().await.map(|release| release.0)
}

/// Returns the latest release tag and its changelog body.
pub async fn fetch_latest_release() -> Option<(String, String)> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("argonaut/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .ok()?;
    let release: ReleaseResponse = client
        .get(RELEASES_LATEST_URL)
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;

    Some((release.tag_name, release.body.unwrap_or_default()))
}

/// Returns `true` when `candidate_version` is newer than `current_version`.
pub fn is_newer_than_current_version(current_version: &str, candidate_version: &str) -> bool {
    let Some(current_version) = parse_version(current_version) else {
        return false;
    };
    let Some(candidate_version) = parse_version(candidate_version) else {
        return false;
    };

    candidate_version > current_version
}

fn parse_version(raw: &str) -> Option<Version> {
    Version::parse(raw.trim().trim_start_matches('v')).ok()
}

/// Runs the platform upgrade command and returns the release changelog.
///
/// # Errors
/// Returns the command output when the upgrade fails.
pub async fn run_upgrade() -> Result<String, String> {
    let output = tokio::process::Command::new("brew")
        .args(["upgrade", "argonaut"])
        .output()
        .await
        .map_err(|e| format!("brew not available ({e}); upgrade argonaut manually"))?;
    if !output.status.success() {
        return Err(String::from_utf8_lossy(&output.stderr).trim().to_string());
    }

    let changelog = fetch_latest_release()
        .await
        .map(|(_, body)| body)
        .unwrap_or_default();

    Ok(changelog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_newer_handles_v_prefix() {
        // Assert
        assert!(is_newer_than_current_version("0.9.2", "v0.10.0"));
        assert!(!is_newer_than_current_version("v1.2.0", "1.2.0"));
        assert!(!is_newer_than_current_version("1.2.0", "v1.1.9"));
    }

    #[test]
    fn test_is_newer_rejects_garbage_versions() {
        // Assert
        assert!(!is_newer_than_current_version("not-a-version", "1.0.0"));
        assert!(!is_newer_than_current_version("1.0.0", "latest"));
    }
}
