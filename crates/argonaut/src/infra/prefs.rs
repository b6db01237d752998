//! Persisted UI preferences.
//!
//! A small YAML file under the user config dir carries everything the UI
//! remembers between runs. Reads happen at startup and on context switch;
//! writes happen when a preference changes.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::app::{SortDirection, SortField, SortPreference};

/// On-disk preference file contents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Option<String>,
    /// Version last acknowledged by the "what's new" one-shot.
    pub last_seen_version: Option<String>,
    /// View shown at startup (`clusters`, `namespaces`, `projects`, `apps`).
    pub default_view: Option<String>,
    /// Scope value applied to the default view.
    pub default_scope: Option<String>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    /// Command the clipboard copy pipes through (e.g. `pbcopy`).
    pub clipboard_command: Option<String>,
}

impl Preferences {
    /// Returns the persisted sort preference, defaulting missing parts.
    pub fn sort_preference(&self) -> SortPreference {
        SortPreference {
            field: self
                .sort_field
                .as_deref()
                .and_then(|s| SortField::from_str(s).ok())
                .unwrap_or_default(),
            direction: self
                .sort_direction
                .as_deref()
                .and_then(|s| SortDirection::from_str(s).ok())
                .unwrap_or_default(),
        }
    }

    /// Stores a sort preference in its persisted form.
    pub fn set_sort_preference(&mut self, preference: SortPreference) {
        self.sort_field = Some(preference.field.label().to_string());
        self.sort_direction = Some(preference.direction.label().to_string());
    }
}

/// Returns the preference file location.
pub fn prefs_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("argonaut")
        .join("config.yaml")
}

/// Loads preferences; a missing or unreadable file yields defaults.
pub fn load(path: &Path) -> Preferences {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return Preferences::default();
    };
    match serde_yaml::from_str(&raw) {
        Ok(prefs) => prefs,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed preferences");
            Preferences::default()
        }
    }
}

/// Persists preferences, creating parent directories as needed.
pub fn save(path: &Path, prefs: &Preferences) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw = serde_yaml::to_string(prefs).map_err(std::io::Error::other)?;

    std::fs::write(path, raw)
}
