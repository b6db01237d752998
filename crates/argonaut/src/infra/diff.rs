//! Desired-vs-live diff formatting.
//!
//! The built-in formatter renders a unified diff; `ARGONAUT_DIFF_FORMATTER`
//! swaps in an external program that receives the two manifest files as
//! arguments, and `ARGONAUT_DIFF_VIEWER` (with `{left}`/`{right}`
//! placeholders) replaces the inline viewer entirely.

use std::path::PathBuf;

use similar::TextDiff;

/// Environment variable naming an external diff formatter.
pub const DIFF_FORMATTER_ENV: &str = "ARGONAUT_DIFF_FORMATTER";

/// Environment variable naming an external diff viewer.
pub const DIFF_VIEWER_ENV: &str = "ARGONAUT_DIFF_VIEWER";

/// Renders a unified diff of live vs desired manifests.
///
/// Returns an empty vector when there is no drift.
pub fn unified_diff(live: &str, desired: &str) -> Vec<String> {
    if live == desired {
        return Vec::new();
    }
    let diff = TextDiff::from_lines(live, desired);
    let formatted = diff
        .unified_diff()
        .context_radius(3)
        .header("live", "desired")
        .to_string();

    formatted.lines().map(str::to_string).collect()
}

/// Runs the configured external formatter over the two manifest files.
///
/// # Errors
/// Returns the spawn/wait error text when the formatter cannot run.
pub async fn external_diff(
    formatter: &str,
    left: &std::path::Path,
    right: &std::path::Path,
) -> Result<Vec<String>, String> {
    let output = tokio::process::Command::new(formatter)
        .arg(left)
        .arg(right)
        .output()
        .await
        .map_err(|e| format!("spawn {formatter}: {e}"))?;
    // Diff tools conventionally exit 1 when differences exist.
    let code = output.status.code().unwrap_or(-1);
    if code > 1 {
        return Err(format!(
            "{formatter} exited with {code}: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Writes both manifests to temp files for external tooling.
///
/// The caller removes the files after the child exits.
pub fn write_manifest_files(live: &str, desired: &str) -> std::io::Result<(PathBuf, PathBuf)> {
    let dir = std::env::temp_dir();
    let stamp = std::process::id();
    let left = dir.join(format!("argonaut-live-{stamp}.yaml"));
    let right = dir.join(format!("argonaut-desired-{stamp}.yaml"));
    std::fs::write(&left, live)?;
    std::fs::write(&right, desired)?;

    Ok((left, right))
}

/// Expands `{left}`/`{right}` placeholders in a viewer command line.
///
/// A command without placeholders gets both paths appended.
pub fn expand_viewer_command(template: &str, left: &str, right: &str) -> String {
    if template.contains("{left}") || template.contains("{right}") {
        return template.replace("{left}", left).replace("{right}", right);
    }

    format!("{template} {left} {right}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_empty_for_identical_input() {
        // Assert
        assert!(unified_diff("a: 1\n", "a: 1\n").is_empty());
    }

    #[test]
    fn test_unified_diff_marks_changed_lines() {
        // Act
        let lines = unified_diff("replicas: 2\n", "replicas: 3\n");

        // Assert
        assert!(lines.iter().any(|l| l.starts_with("-replicas: 2")));
        assert!(lines.iter().any(|l| l.starts_with("+replicas: 3")));
        assert!(lines.iter().any(|l| l.contains("live")));
    }

    #[test]
    fn test_expand_viewer_command_replaces_placeholders() {
        // Act
        let expanded = expand_viewer_command("delta {left} {right}", "/tmp/a", "/tmp/b");

        // Assert
        assert_eq!(expanded, "delta /tmp/a /tmp/b");
    }

    #[test]
    fn test_expand_viewer_command_appends_when_no_placeholders() {
        // Act
        let expanded = expand_viewer_command("vimdiff", "/tmp/a", "/tmp/b");

        // Assert
        assert_eq!(expanded, "vimdiff /tmp/a /tmp/b");
    }
}
