//! Read-only parser for the ArgoCD CLI config file.
//!
//! The file is owned by the ArgoCD CLI; argonaut only resolves contexts
//! from it at startup and on explicit context switch.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::server::{Context, Server};
use crate::errors::AppError;

#[derive(Debug, Default, Deserialize)]
struct WireConfig {
    #[serde(default)]
    contexts: Vec<WireContext>,
    #[serde(rename = "current-context")]
    current_context: Option<String>,
    #[serde(default)]
    servers: Vec<WireServer>,
    #[serde(default)]
    users: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
struct WireContext {
    name: String,
    server: String,
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireServer {
    server: String,
    #[serde(default)]
    insecure: bool,
    #[serde(default)]
    core: bool,
    #[serde(default, rename = "port-forward")]
    port_forward: bool,
}

#[derive(Debug, Deserialize)]
struct WireUser {
    name: String,
    #[serde(rename = "auth-token")]
    auth_token: Option<String>,
}

/// Contexts resolved from one config file.
#[derive(Clone, Debug, Default)]
pub struct ArgoConfig {
    pub current_context: Option<String>,
    pub contexts: Vec<Context>,
}

impl ArgoConfig {
    /// Returns the context with the given name.
    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.iter().find(|context| context.name == name)
    }

    /// Returns all context names in file order.
    pub fn context_names(&self) -> Vec<String> {
        self.contexts.iter().map(|c| c.name.clone()).collect()
    }

    /// Returns the context selected by `current-context`, else the first.
    pub fn default_context(&self) -> Option<&Context> {
        self.current_context
            .as_deref()
            .and_then(|name| self.context(name))
            .or_else(|| self.contexts.first())
    }
}

/// Returns the conventional config location (`~/.config/argocd/config`).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("argocd")
        .join("config")
}

/// Loads and resolves the config file at `path`.
///
/// # Errors
/// Returns [`AppError::Fatal`] when the file cannot be read or parsed.
pub fn load(path: &Path) -> Result<ArgoConfig, AppError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| AppError::Fatal(format!("read {}: {e}", path.display())))?;

    parse(&raw)
}

fn parse(raw: &str) -> Result<ArgoConfig, AppError> {
    let wire: WireConfig =
        serde_yaml::from_str(raw).map_err(|e| AppError::Fatal(format!("parse config: {e}")))?;

    let contexts = wire
        .contexts
        .iter()
        .map(|context| {
            let server_entry = wire.servers.iter().find(|s| s.server == context.server);
            let token = context
                .user
                .as_deref()
                .and_then(|user| wire.users.iter().find(|u| u.name == user))
                .and_then(|user| user.auth_token.clone());

            Context {
                name: context.name.clone(),
                server: Server {
                    base_url: context.server.clone(),
                    token,
                    insecure: server_entry.is_some_and(|s| s.insecure),
                },
                core: server_entry.is_some_and(|s| s.core),
                port_forward: server_entry.is_some_and(|s| s.port_forward),
            }
        })
        .collect();

    Ok(ArgoConfig {
        current_context: wire.current_context,
        contexts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r"
contexts:
- name: prod
  server: argocd.example.com
  user: prod-user
- name: local
  server: localhost:8080
  user: local-user
current-context: prod
servers:
- server: argocd.example.com
  insecure: false
- server: localhost:8080
  insecure: true
  core: true
users:
- name: prod-user
  auth-token: secret-token
- name: local-user
";

    #[test]
    fn test_parse_resolves_context_server_and_token() {
        // Act
        let config = parse(SAMPLE).expect("parse failed");

        // Assert
        let prod = config.context("prod").expect("missing context");
        assert_eq!(prod.server.base_url, "argocd.example.com");
        assert_eq!(prod.server.token.as_deref(), Some("secret-token"));
        assert!(!prod.server.insecure);
        assert!(prod.drivable());
    }

    #[test]
    fn test_parse_flags_core_contexts_as_undrivable() {
        // Act
        let config = parse(SAMPLE).expect("parse failed");

        // Assert
        let local = config.context("local").expect("missing context");
        assert!(local.core);
        assert!(local.server.insecure);
        assert!(local.server.token.is_none());
        assert!(!local.drivable());
    }

    #[test]
    fn test_default_context_follows_current_context() {
        // Act
        let config = parse(SAMPLE).expect("parse failed");

        // Assert
        assert_eq!(
            config.default_context().map(|c| c.name.as_str()),
            Some("prod")
        );
        assert_eq!(config.context_names(), vec!["prod", "local"]);
    }

    #[test]
    fn test_load_missing_file_is_fatal() {
        // Act
        let result = load(Path::new("/nonexistent/argonaut-config"));

        // Assert
        assert!(matches!(result, Err(AppError::Fatal(_))));
    }
}
