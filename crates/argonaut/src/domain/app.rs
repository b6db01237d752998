//! Application records and the derived fleet index.

use std::collections::BTreeSet;

/// Sync state reported by the upstream server for one application.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    #[default]
    Unknown,
}

impl SyncStatus {
    /// Returns the wire label used by the upstream API.
    pub fn label(self) -> &'static str {
        match self {
            SyncStatus::Synced => "Synced",
            SyncStatus::OutOfSync => "OutOfSync",
            SyncStatus::Unknown => "Unknown",
        }
    }

    /// Parses the upstream wire label; anything unrecognized maps to
    /// `Unknown` because servers add sync states over time.
    pub fn parse(s: &str) -> Self {
        match s {
            "Synced" => SyncStatus::Synced,
            "OutOfSync" => SyncStatus::OutOfSync,
            _ => SyncStatus::Unknown,
        }
    }

    /// Sort rank: out-of-sync apps surface first under sync ordering.
    fn rank(self) -> u8 {
        match self {
            SyncStatus::OutOfSync => 0,
            SyncStatus::Unknown => 1,
            SyncStatus::Synced => 2,
        }
    }
}

/// Health state reported by the upstream server for one application.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Progressing,
    Missing,
    #[default]
    Unknown,
}

impl HealthStatus {
    /// Returns the wire label used by the upstream API.
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Healthy => "Healthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Progressing => "Progressing",
            HealthStatus::Missing => "Missing",
            HealthStatus::Unknown => "Unknown",
        }
    }

    /// Parses the upstream wire label; unrecognized states map to `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s {
            "Healthy" => HealthStatus::Healthy,
            "Degraded" => HealthStatus::Degraded,
            "Progressing" => HealthStatus::Progressing,
            "Missing" => HealthStatus::Missing,
            _ => HealthStatus::Unknown,
        }
    }

    /// Sort rank: degraded apps surface first under health ordering.
    fn rank(self) -> u8 {
        match self {
            HealthStatus::Degraded => 0,
            HealthStatus::Missing => 1,
            HealthStatus::Progressing => 2,
            HealthStatus::Unknown => 3,
            HealthStatus::Healthy => 4,
        }
    }
}

/// One application snapshot, keyed by `name`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct App {
    pub name: String,
    pub sync: SyncStatus,
    pub health: HealthStatus,
    pub namespace: Option<String>,
    pub app_namespace: Option<String>,
    pub project: Option<String>,
    pub cluster: Option<String>,
    pub application_set: Option<String>,
}

impl App {
    /// Creates an app with the given name and default statuses.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Derived sets of clusters, namespaces, projects, and application sets.
///
/// Rebuilt whenever the app list is replaced wholesale; never mutated
/// incrementally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppIndex {
    pub clusters: BTreeSet<String>,
    pub namespaces: BTreeSet<String>,
    pub projects: BTreeSet<String>,
    pub application_sets: BTreeSet<String>,
}

impl AppIndex {
    /// Aggregates the index from the full app list.
    pub fn build(apps: &[App]) -> Self {
        let mut index = Self::default();
        for app in apps {
            if let Some(cluster) = &app.cluster {
                index.clusters.insert(cluster.clone());
            }
            if let Some(namespace) = &app.namespace {
                index.namespaces.insert(namespace.clone());
            }
            if let Some(project) = &app.project {
                index.projects.insert(project.clone());
            }
            if let Some(application_set) = &app.application_set {
                index.application_sets.insert(application_set.clone());
            }
        }

        index
    }
}

/// Field the app list is ordered by.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SortField {
    #[default]
    Name,
    Sync,
    Health,
}

impl SortField {
    /// Returns the persisted label.
    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Sync => "sync",
            SortField::Health => "health",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "sync" => Ok(SortField::Sync),
            "health" => Ok(SortField::Health),
            _ => Err(format!("Unknown sort field: {s}")),
        }
    }
}

/// Direction the app list is ordered in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Returns the persisted label.
    pub fn label(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(format!("Unknown sort direction: {s}")),
        }
    }
}

/// Sort preference applied to the visible app list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SortPreference {
    pub field: SortField,
    pub direction: SortDirection,
}

/// Orders apps by the given preference; name is always the final tie-break
/// so the ordering is total and stable across refreshes.
pub fn sort_apps(apps: &mut [App], preference: SortPreference) {
    apps.sort_by(|a, b| {
        let ordering = match preference.field {
            SortField::Name => a.name.cmp(&b.name),
            SortField::Sync => a.sync.rank().cmp(&b.sync.rank()).then(a.name.cmp(&b.name)),
            SortField::Health => a
                .health
                .rank()
                .cmp(&b.health.rank())
                .then(a.name.cmp(&b.name)),
        };
        match preference.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}
