use std::fmt;

/// Authoritative address of one upstream control-plane server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Server {
    pub base_url: String,
    pub token: Option<String>,
    pub insecure: bool,
}

impl Server {
    /// Creates a server binding with no credentials attached.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            insecure: false,
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

/// A named server binding loaded from the external CLI config.
///
/// Selecting a context resolves it to a [`Server`]; contexts whose server
/// runs in core or port-forward mode cannot be driven by the UI and are
/// rejected during validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    pub server: Server,
    pub core: bool,
    pub port_forward: bool,
}

impl Context {
    /// Returns `true` when the UI can drive this context.
    pub fn drivable(&self) -> bool {
        !self.core && !self.port_forward
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drivable_rejects_core_contexts() {
        // Arrange
        let context = Context {
            name: "in-cluster".to_string(),
            server: Server::new("kubernetes"),
            core: true,
            port_forward: false,
        };

        // Assert
        assert!(!context.drivable());
    }

    #[test]
    fn test_drivable_accepts_plain_server_contexts() {
        // Arrange
        let context = Context {
            name: "prod".to_string(),
            server: Server::new("argocd.example.com"),
            core: false,
            port_forward: false,
        };

        // Assert
        assert!(context.drivable());
    }
}
