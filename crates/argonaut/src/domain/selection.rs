use std::collections::BTreeSet;

use crate::domain::app::App;

/// Progressive scope filters plus the per-app multi-select set.
///
/// Scope filtering is computed, never stored: [`visible_apps`] derives the
/// visible list from the full app slice on every call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selections {
    pub scope_clusters: BTreeSet<String>,
    pub scope_namespaces: BTreeSet<String>,
    pub scope_projects: BTreeSet<String>,
    pub scope_application_sets: BTreeSet<String>,
    pub selected_apps: BTreeSet<String>,
}

impl Selections {
    /// Toggles membership of `value` in the given scope set.
    pub fn toggle_scope(set: &mut BTreeSet<String>, value: &str) {
        if !set.remove(value) {
            set.insert(value.to_string());
        }
    }

    /// Toggles an app in the multi-select set.
    pub fn toggle_app(&mut self, name: &str) {
        Self::toggle_scope(&mut self.selected_apps, name);
    }

    fn matches_scopes(&self, app: &App) -> bool {
        let in_scope = |set: &BTreeSet<String>, value: &Option<String>| {
            set.is_empty() || value.as_deref().is_some_and(|v| set.contains(v))
        };

        in_scope(&self.scope_clusters, &app.cluster)
            && in_scope(&self.scope_namespaces, &app.namespace)
            && in_scope(&self.scope_projects, &app.project)
            && in_scope(&self.scope_application_sets, &app.application_set)
    }
}

/// Computes `filter(apps, scopes) ∩ filter(search_query)`.
///
/// The search query matches case-insensitively against app name, project,
/// and namespace.
pub fn visible_apps<'a>(
    apps: &'a [App],
    selections: &Selections,
    search_query: &str,
) -> Vec<&'a App> {
    let query = search_query.to_lowercase();
    apps.iter()
        .filter(|app| selections.matches_scopes(app))
        .filter(|app| {
            if query.is_empty() {
                return true;
            }
            app.name.to_lowercase().contains(&query)
                || app
                    .project
                    .as_deref()
                    .is_some_and(|p| p.to_lowercase().contains(&query))
                || app
                    .namespace
                    .as_deref()
                    .is_some_and(|n| n.to_lowercase().contains(&query))
        })
        .collect()
}
