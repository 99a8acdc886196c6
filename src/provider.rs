//! Resolves a caller-supplied server URI — an `acme://` shorthand or a raw
//! `https://` directory URL — to a concrete directory URL.
//!
//! Providers are registered into an ordered list at registry construction;
//! the first one whose `accepts` returns `true` wins, mirroring the
//! plug-in dispatch RFC 8555 implementations typically get from a
//! `ServiceLoader`-style mechanism (see `DESIGN.md`).

use crate::error::{AcmeError, Result};
use crate::json::Json;
use crate::jose::Directory;
use crate::login::Login;
use crate::order::Challenge;
use crate::transport::{self, NetworkSettings, Transport};
use std::sync::Arc;

/// A source of ACME directory URLs for one CA (or CA family).
pub trait Provider: Send + Sync {
    /// Whether this provider handles `server_uri`.
    fn accepts(&self, server_uri: &str) -> bool;

    /// Resolves `server_uri` to a concrete `https://.../directory` URL.
    /// Only called after `accepts` returned `true`.
    fn directory_url(&self, server_uri: &str) -> Result<String>;

    /// Builds the transport a `Session` against `server_uri` should use.
    /// The default builds a plain `Transport` from `network_settings`; a
    /// provider that needs a non-standard client (a fixed proxy, a pinned
    /// root) overrides this instead of asking every caller to configure it.
    fn connect(&self, server_uri: &str, network_settings: &NetworkSettings) -> Result<Transport> {
        let _ = server_uri;
        Transport::new(network_settings, transport::default_user_agent())
    }

    /// A static directory document this provider hands out instead of
    /// fetching one over the network, for CAs this crate talks to without
    /// the CA actually publishing RFC 8555's `GET directory` endpoint
    /// (e.g. a provider pinned against a fixed, offline-known directory).
    /// `None` (the default) means "fetch it normally".
    fn directory(&self, server_uri: &str) -> Option<Directory> {
        let _ = server_uri;
        None
    }

    /// Parses a challenge object the generic `ChallengeType` parser didn't
    /// recognize. Returning `None` means this provider has no opinion on
    /// `json` either, so the caller should skip it; `Some(Err(_))` is a
    /// genuine parse failure the caller should propagate.
    fn create_challenge(&self, login: Arc<Login>, json: &Json) -> Option<Result<Challenge>> {
        let _ = (login, json);
        None
    }
}

/// Falls back to treating any `http`/`https` URI as already being a
/// directory URL, unchanged. Always registered last.
pub struct GenericProvider;

impl Provider for GenericProvider {
    fn accepts(&self, server_uri: &str) -> bool {
        server_uri.starts_with("http://") || server_uri.starts_with("https://")
    }

    fn directory_url(&self, server_uri: &str) -> Result<String> {
        Ok(server_uri.to_string())
    }
}

/// Matches `acme://<host_label>` and `acme://<host_label>/<suffix>`,
/// optionally followed by `/host:port` for providers that support a
/// caller-supplied endpoint override (currently only Pebble).
struct AcmeShorthandProvider {
    host_label: &'static str,
    production: &'static str,
    staging: Option<&'static str>,
    /// If set, `acme://<host_label>/<host>:<port>` overrides the directory
    /// URL entirely instead of selecting staging.
    allow_host_port_override: bool,
}

impl Provider for AcmeShorthandProvider {
    fn accepts(&self, server_uri: &str) -> bool {
        let prefix = format!("acme://{}", self.host_label);
        server_uri == prefix || server_uri.starts_with(&format!("{prefix}/"))
    }

    fn directory_url(&self, server_uri: &str) -> Result<String> {
        let prefix = format!("acme://{}", self.host_label);
        let suffix = server_uri.strip_prefix(&prefix).unwrap_or("");
        let suffix = suffix.strip_prefix('/').unwrap_or(suffix);

        if suffix.is_empty() {
            return Ok(self.production.to_string());
        }
        if suffix == "staging" {
            return self.staging.map(str::to_string).ok_or_else(|| {
                AcmeError::unknown_provider(server_uri)
            });
        }
        if self.allow_host_port_override && suffix.contains(':') {
            return Ok(format!("https://{suffix}/dir"));
        }
        Err(AcmeError::unknown_provider(server_uri))
    }
}

impl AcmeError {
    fn unknown_provider(server_uri: &str) -> Self {
        AcmeError::UnknownProvider(server_uri.to_string())
    }
}

/// Ordered provider list. Built once per application via [`Registry::default`]
/// (or [`Registry::with_providers`] for a caller-curated set) and reused
/// across `Session`s.
pub struct Registry {
    providers: Vec<Arc<dyn Provider>>,
}

impl Registry {
    pub fn with_providers(providers: Vec<Box<dyn Provider>>) -> Self {
        Self {
            providers: providers.into_iter().map(Arc::from).collect(),
        }
    }

    /// Finds the provider that accepts `server_uri`, for a caller (`Session`)
    /// that needs to hold onto it beyond just resolving the directory URL.
    pub fn find(&self, server_uri: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .iter()
            .find(|p| p.accepts(server_uri))
            .cloned()
            .ok_or_else(|| AcmeError::UnknownProvider(server_uri.to_string()))
    }

    /// Resolves `server_uri` against the registered providers in order.
    pub fn resolve(&self, server_uri: &str) -> Result<String> {
        self.find(server_uri)?.directory_url(server_uri)
    }
}

impl Default for Registry {
    /// Let's Encrypt, Pebble (with `host:port` override), SSL.com, then the
    /// generic `http(s)://` passthrough.
    fn default() -> Self {
        Registry::with_providers(vec![
            Box::new(AcmeShorthandProvider {
                host_label: "letsencrypt.org",
                production: "https://acme-v02.api.letsencrypt.org/directory",
                staging: Some("https://acme-staging-v02.api.letsencrypt.org/directory"),
                allow_host_port_override: false,
            }),
            Box::new(AcmeShorthandProvider {
                host_label: "pebble",
                production: "https://localhost:14000/dir",
                staging: None,
                allow_host_port_override: true,
            }),
            Box::new(AcmeShorthandProvider {
                host_label: "ssl.com",
                production: "https://acme.ssl.com/sslcom-dv-rsa",
                staging: Some("https://test-acme.ssl.com/sslcom-dv-rsa"),
                allow_host_port_override: false,
            }),
            Box::new(GenericProvider),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_letsencrypt_production() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve("acme://letsencrypt.org").unwrap(),
            "https://acme-v02.api.letsencrypt.org/directory"
        );
    }

    #[test]
    fn resolves_letsencrypt_staging() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve("acme://letsencrypt.org/staging").unwrap(),
            "https://acme-staging-v02.api.letsencrypt.org/directory"
        );
    }

    #[test]
    fn resolves_pebble_default_and_override() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve("acme://pebble").unwrap(),
            "https://localhost:14000/dir"
        );
        assert_eq!(
            registry.resolve("acme://pebble/pebble.local:14001").unwrap(),
            "https://pebble.local:14001/dir"
        );
    }

    #[test]
    fn passes_through_raw_https_url() {
        let registry = Registry::default();
        assert_eq!(
            registry.resolve("https://ca.example.com/directory").unwrap(),
            "https://ca.example.com/directory"
        );
    }

    #[test]
    fn unknown_scheme_fails_with_unknown_provider() {
        let registry = Registry::default();
        let err = registry.resolve("acme://unknown-ca.example").unwrap_err();
        assert!(matches!(err, AcmeError::UnknownProvider(_)));
    }

    #[test]
    fn find_returns_the_same_provider_resolve_would_use() {
        let registry = Registry::default();
        let provider = registry.find("acme://pebble").unwrap();
        assert_eq!(provider.directory_url("acme://pebble").unwrap(), "https://localhost:14000/dir");
    }

    #[test]
    fn default_connect_builds_a_transport() {
        let registry = Registry::default();
        let provider = registry.find("https://ca.example.com/directory").unwrap();
        assert!(provider
            .connect("https://ca.example.com/directory", &NetworkSettings::default())
            .is_ok());
    }

    #[test]
    fn default_directory_hook_is_a_no_op() {
        let registry = Registry::default();
        let provider = registry.find("https://ca.example.com/directory").unwrap();
        assert!(provider.directory("https://ca.example.com/directory").is_none());
    }
}
