//! Command and argument suggestion against the live model.
//!
//! The command table is declarative; argument sources are pure functions
//! over model state. Suggestions are ranked exact, then prefix, then
//! contains, stable within each group.

use crate::app::Model;

/// Whether a command accepts an argument.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgPolicy {
    None,
    Optional,
    Required,
    /// Two mandatory tokens (the `sort` form).
    RequiredPair,
}

/// Where a command's argument values come from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArgSource {
    None,
    Clusters,
    Namespaces,
    Projects,
    ApplicationSets,
    Apps,
    Contexts,
    Themes,
    SortSpecs,
}

/// One entry of the command table.
#[derive(Clone, Copy, Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub takes_arg: ArgPolicy,
    pub arg_source: ArgSource,
    /// Navigation commands require an exact (case-insensitive) argument.
    pub exact_arg: bool,
}

/// The declarative command table.
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "cluster",
        aliases: &["cls", "clusters"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Clusters,
        exact_arg: true,
    },
    CommandSpec {
        name: "namespace",
        aliases: &["ns", "namespaces"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Namespaces,
        exact_arg: true,
    },
    CommandSpec {
        name: "project",
        aliases: &["proj", "projects"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Projects,
        exact_arg: true,
    },
    CommandSpec {
        name: "appset",
        aliases: &["appsets", "applicationset"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::ApplicationSets,
        exact_arg: true,
    },
    CommandSpec {
        name: "app",
        aliases: &["apps"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: true,
    },
    CommandSpec {
        name: "resources",
        aliases: &["res", "r"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: true,
    },
    CommandSpec {
        name: "diff",
        aliases: &["d"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: false,
    },
    CommandSpec {
        name: "sync",
        aliases: &["s"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: false,
    },
    CommandSpec {
        name: "rollback",
        aliases: &[],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: false,
    },
    CommandSpec {
        name: "delete",
        aliases: &["del"],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Apps,
        exact_arg: false,
    },
    CommandSpec {
        name: "context",
        aliases: &["ctx"],
        takes_arg: ArgPolicy::Required,
        arg_source: ArgSource::Contexts,
        exact_arg: true,
    },
    CommandSpec {
        name: "sort",
        aliases: &[],
        takes_arg: ArgPolicy::RequiredPair,
        arg_source: ArgSource::SortSpecs,
        exact_arg: true,
    },
    CommandSpec {
        name: "theme",
        aliases: &[],
        takes_arg: ArgPolicy::Optional,
        arg_source: ArgSource::Themes,
        exact_arg: true,
    },
    CommandSpec {
        name: "k9s",
        aliases: &[],
        takes_arg: ArgPolicy::None,
        arg_source: ArgSource::None,
        exact_arg: false,
    },
    CommandSpec {
        name: "help",
        aliases: &["?"],
        takes_arg: ArgPolicy::None,
        arg_source: ArgSource::None,
        exact_arg: false,
    },
    CommandSpec {
        name: "logs",
        aliases: &[],
        takes_arg: ArgPolicy::None,
        arg_source: ArgSource::None,
        exact_arg: false,
    },
    CommandSpec {
        name: "upgrade",
        aliases: &[],
        takes_arg: ArgPolicy::None,
        arg_source: ArgSource::None,
        exact_arg: false,
    },
    CommandSpec {
        name: "quit",
        aliases: &["q", "exit"],
        takes_arg: ArgPolicy::None,
        arg_source: ArgSource::None,
        exact_arg: false,
    },
];

/// Resolves a typed name or alias to its command spec.
pub fn resolve(word: &str) -> Option<&'static CommandSpec> {
    let lowered = word.to_lowercase();

    COMMANDS
        .iter()
        .find(|spec| spec.name == lowered || spec.aliases.contains(&lowered.as_str()))
}

/// Values offered for one argument source, in display order.
pub fn source_values(source: ArgSource, model: &Model) -> Vec<String> {
    match source {
        ArgSource::None => Vec::new(),
        ArgSource::Clusters => model.index.clusters.iter().cloned().collect(),
        ArgSource::Namespaces => model.index.namespaces.iter().cloned().collect(),
        ArgSource::Projects => model.index.projects.iter().cloned().collect(),
        ArgSource::ApplicationSets => model.index.application_sets.iter().cloned().collect(),
        ArgSource::Apps => model.apps.iter().map(|app| app.name.clone()).collect(),
        ArgSource::Contexts => model.context_names.clone(),
        ArgSource::Themes => crate::ui::theme::THEME_NAMES
            .iter()
            .map(|name| (*name).to_string())
            .collect(),
        ArgSource::SortSpecs => {
            let mut specs = Vec::new();
            for field in ["name", "sync", "health"] {
                for direction in ["asc", "desc"] {
                    specs.push(format!("{field} {direction}"));
                }
            }
            specs
        }
    }
}

/// Ranks candidates against a query: exact, then prefix, then contains,
/// stable within each group.
pub fn rank(candidates: Vec<String>, query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let mut exact = Vec::new();
    let mut prefix = Vec::new();
    let mut contains = Vec::new();
    for candidate in candidates {
        let lowered = candidate.to_lowercase();
        if lowered == query {
            exact.push(candidate);
        } else if lowered.starts_with(&query) {
            prefix.push(candidate);
        } else if lowered.contains(&query) {
            contains.push(candidate);
        }
    }
    exact.extend(prefix);
    exact.extend(contains);

    exact
}

/// Returns full-line suggestions for the command input.
///
/// Before the first space the command names themselves are suggested;
/// after it, arguments from the command's source, prefixed so accepting a
/// suggestion yields a dispatchable line.
pub fn command_autocomplete(query: &str, model: &Model) -> Vec<String> {
    let trimmed = query.trim_start();
    match trimmed.split_once(char::is_whitespace) {
        None => {
            let names = COMMANDS.iter().map(|c| c.name.to_string()).collect();
            rank(names, trimmed)
        }
        Some((word, arg_query)) => {
            let Some(spec) = resolve(word) else {
                return Vec::new();
            };
            rank(source_values(spec.arg_source, model), arg_query.trim())
                .into_iter()
                .map(|arg| format!("{} {arg}", spec.name))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::test_model;
    use crate::domain::app::App;

    #[test]
    fn test_rank_orders_exact_prefix_contains() {
        // Arrange
        let candidates = vec![
            "frontend-ns".to_string(),
            "ns".to_string(),
            "nsx".to_string(),
        ];

        // Act
        let ranked = rank(candidates, "ns");

        // Assert
        assert_eq!(ranked, vec!["ns", "nsx", "frontend-ns"]);
    }

    #[test]
    fn test_rank_is_stable_within_groups() {
        // Arrange
        let candidates = vec![
            "beta-app".to_string(),
            "alpha-app".to_string(),
            "app-one".to_string(),
        ];

        // Act
        let ranked = rank(candidates, "app");

        // Assert: prefix match first, contains keep input order
        assert_eq!(ranked, vec!["app-one", "beta-app", "alpha-app"]);
    }

    #[test]
    fn test_resolve_normalizes_aliases() {
        // Assert
        assert_eq!(resolve("ns").map(|s| s.name), Some("namespace"));
        assert_eq!(resolve("cls").map(|s| s.name), Some("cluster"));
        assert_eq!(resolve("PROJ").map(|s| s.name), Some("project"));
        assert_eq!(resolve("r").map(|s| s.name), Some("resources"));
        assert_eq!(resolve("del").map(|s| s.name), Some("delete"));
        assert!(resolve("bogus").is_none());
    }

    #[test]
    fn test_command_autocomplete_suggests_commands_before_space() {
        // Arrange
        let (model, _rx) = test_model();

        // Act
        let suggestions = command_autocomplete("s", &model);

        // Assert: sync first (prefix), sort next, contains later
        assert_eq!(suggestions[0], "sync");
        assert!(suggestions.contains(&"sort".to_string()));
    }

    #[test]
    fn test_command_autocomplete_suggests_arguments_after_space() {
        // Arrange
        let (mut model, _rx) = test_model();
        let mut app = App::named("web");
        app.cluster = Some("prod".to_string());
        let mut other = App::named("api");
        other.cluster = Some("staging".to_string());
        model.replace_apps(vec![app, other]);

        // Act
        let suggestions = command_autocomplete("cluster pr", &model);

        // Assert
        assert_eq!(suggestions, vec!["cluster prod".to_string()]);
    }

    #[test]
    fn test_sort_specs_require_field_and_direction() {
        // Arrange
        let (model, _rx) = test_model();

        // Act
        let values = source_values(ArgSource::SortSpecs, &model);

        // Assert
        assert!(values.contains(&"name asc".to_string()));
        assert!(values.contains(&"health desc".to_string()));
        assert_eq!(values.len(), 6);
    }
}
