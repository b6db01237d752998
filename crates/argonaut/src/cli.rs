//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::infra::api::TlsOptions;

/// Interactive terminal UI for Argo CD-style GitOps control planes.
#[derive(Debug, Parser)]
#[command(name = "argonaut", version, about)]
pub struct Cli {
    /// Path to the ArgoCD CLI config file.
    #[arg(long = "argocd-config", visible_alias = "config", value_name = "PATH")]
    pub argocd_config: Option<PathBuf>,

    /// PEM file appended to the trusted root certificates.
    #[arg(long = "ca-cert", value_name = "PATH")]
    pub ca_cert: Option<PathBuf>,

    /// Directory of PEM files appended to the trusted roots.
    #[arg(long = "ca-path", value_name = "DIR")]
    pub ca_path: Option<PathBuf>,

    /// Client certificate presented to the server.
    #[arg(long = "client-cert", value_name = "PATH", requires = "client_cert_key")]
    pub client_cert: Option<PathBuf>,

    /// Private key for the client certificate.
    #[arg(long = "client-cert-key", value_name = "PATH", requires = "client_cert")]
    pub client_cert_key: Option<PathBuf>,

    /// Theme applied for this run, overriding the persisted choice.
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,
}

impl Cli {
    /// Resolves the config path, falling back to the conventional location.
    pub fn config_path(&self) -> PathBuf {
        self.argocd_config
            .clone()
            .unwrap_or_else(crate::infra::argocd_config::default_config_path)
    }

    /// Collects the TLS trust material.
    pub fn tls(&self) -> TlsOptions {
        TlsOptions {
            ca_cert: self.ca_cert.clone(),
            ca_path: self.ca_path.clone(),
            client_cert: self.client_cert.clone(),
            client_cert_key: self.client_cert_key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_alias_is_accepted() {
        // Act
        let cli = Cli::try_parse_from(["argonaut", "--config", "/tmp/cfg"]).expect("parse failed");

        // Assert
        assert_eq!(cli.config_path(), PathBuf::from("/tmp/cfg"));
    }

    #[test]
    fn test_client_cert_requires_its_key() {
        // Act
        let result = Cli::try_parse_from(["argonaut", "--client-cert", "/tmp/cert.pem"]);

        // Assert
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_flag_is_a_usage_error() {
        // Act
        let error = Cli::try_parse_from(["argonaut", "--frobnicate"]).expect_err("parsed");

        // Assert: clap usage errors exit with code 2
        assert_eq!(error.exit_code(), 2);
    }
}
