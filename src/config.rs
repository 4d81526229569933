//! Provider registry and hook configuration.
//!
//! The registry is built once at startup and never mutated afterwards. It
//! can come from a TOML file or from the built-in table:
//!
//! ```toml
//! [http]
//! timeout_secs = 10
//!
//! [providers.google-oidc]
//! discovery_url = "https://accounts.google.com/.well-known/openid-configuration"
//! client_id = "my-client-id"
//! client_secret = "my-secret"
//! redirect_uri = "https://vpn.example.com/oidc"
//! ```
//!
//! # Environment Variable Override
//!
//! Client credentials can be kept out of the file:
//!
//! ```bash
//! OIDC_HOOK_GOOGLE_OIDC_CLIENT_ID=my-client-id
//! OIDC_HOOK_GOOGLE_OIDC_CLIENT_SECRET=my-secret
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{AuthError, Result};

/// Prefix for credential override variables.
pub const ENV_PREFIX: &str = "OIDC_HOOK_";

/// Connection parameters for one identity provider.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderConfig {
    /// URL of the provider's `.well-known/openid-configuration`.
    pub discovery_url: String,
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,
    /// Redirect URI registered with the provider.
    pub redirect_uri: String,
    /// Verify the ID token signature against the provider's JWKS.
    #[serde(default)]
    pub verify_signature: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("discovery_url", &self.discovery_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_uri", &self.redirect_uri)
            .field("verify_signature", &self.verify_signature)
            .finish()
    }
}

impl ProviderConfig {
    /// Create a new provider configuration.
    pub fn new(
        discovery_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            discovery_url: discovery_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
            verify_signature: false,
        }
    }

    /// Enable or disable ID token signature verification.
    pub fn with_signature_verification(mut self, enabled: bool) -> Self {
        self.verify_signature = enabled;
        self
    }

    /// Google Identity, using Google's published discovery document.
    pub fn google(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::new(
            "https://accounts.google.com/.well-known/openid-configuration",
            client_id,
            client_secret,
            redirect_uri,
        )
    }

    /// A Keycloak realm.
    pub fn keycloak(
        base_url: &str,
        realm: &str,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self::new(
            format!(
                "{}/auth/realms/{}/.well-known/openid-configuration",
                base_url.trim_end_matches('/'),
                realm
            ),
            client_id,
            client_secret,
            redirect_uri,
        )
    }

    fn validate(&self, id: &str) -> Result<()> {
        Url::parse(&self.discovery_url).map_err(|e| {
            AuthError::Config(format!("provider '{}': invalid discovery_url: {}", id, e))
        })?;
        Url::parse(&self.redirect_uri).map_err(|e| {
            AuthError::Config(format!("provider '{}': invalid redirect_uri: {}", id, e))
        })?;
        if self.client_id.is_empty() {
            return Err(AuthError::Config(format!(
                "provider '{}': client_id must not be empty",
                id
            )));
        }
        Ok(())
    }
}

/// Immutable mapping of provider identifiers to their configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderConfig>,
}

impl ProviderRegistry {
    /// The default deployment table: `google-oidc` and `keycloak-oidc`.
    ///
    /// Credentials are placeholders and are expected to be supplied via
    /// environment overrides or a configuration file.
    pub fn builtin() -> Self {
        let redirect = "https://vpn.example.com/oidc";
        [
            (
                "google-oidc",
                ProviderConfig::google("<google-client-id>", "<google-secret>", redirect),
            ),
            (
                "keycloak-oidc",
                ProviderConfig::keycloak(
                    "https://keycloak.example.com:8443",
                    "DEMOAPP",
                    "<keycloak-client-id>",
                    "<keycloak-secret>",
                    redirect,
                ),
            ),
        ]
        .into_iter()
        .collect()
    }

    /// Look up a provider by identifier.
    pub fn lookup(&self, service: &str) -> Result<&ProviderConfig> {
        self.providers
            .get(service)
            .ok_or_else(|| AuthError::UnknownProvider {
                service: service.to_string(),
            })
    }

    /// Sorted list of configured provider identifiers.
    pub fn ids(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Apply credential overrides from an environment lookup.
    ///
    /// For provider `google-oidc` the consulted keys are
    /// `OIDC_HOOK_GOOGLE_OIDC_CLIENT_ID` and `OIDC_HOOK_GOOGLE_OIDC_CLIENT_SECRET`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (id, provider) in self.providers.iter_mut() {
            let stem = env_stem(id);
            if let Some(client_id) = lookup(&format!("{}_CLIENT_ID", stem)) {
                tracing::debug!(provider = %id, "client_id overridden from environment");
                provider.client_id = client_id;
            }
            if let Some(secret) = lookup(&format!("{}_CLIENT_SECRET", stem)) {
                tracing::debug!(provider = %id, "client_secret overridden from environment");
                provider.client_secret = secret;
            }
        }
        self
    }

    /// Check every entry; an empty registry is rejected.
    pub fn validate(&self) -> Result<()> {
        if self.providers.is_empty() {
            return Err(AuthError::Config("no providers configured".to_string()));
        }
        for (id, provider) in &self.providers {
            provider.validate(id)?;
        }
        Ok(())
    }
}

impl<K: Into<String>> FromIterator<(K, ProviderConfig)> for ProviderRegistry {
    fn from_iter<I: IntoIterator<Item = (K, ProviderConfig)>>(iter: I) -> Self {
        Self {
            providers: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn env_stem(id: &str) -> String {
    let mut stem = String::from(ENV_PREFIX);
    stem.extend(id.chars().map(|c| match c {
        '-' | '.' => '_',
        c => c.to_ascii_uppercase(),
    }));
    stem
}

/// Outbound HTTP settings shared by every call in a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpSettings {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Skip TLS certificate validation. **Development only.**
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            danger_accept_invalid_certs: false,
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A zero timeout would fail every request.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(AuthError::Config(
                "http.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the HTTP client used for discovery, JWKS and token calls.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        self.validate()?;
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout())
            .user_agent(concat!("oidc-hook/", env!("CARGO_PKG_VERSION")));

        if self.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate validation is DISABLED; never use this in production");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| AuthError::Config(format!("failed to create HTTP client: {}", e)))
    }
}

fn default_timeout() -> u64 {
    10
}

/// Contents of a hook configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub http: HttpSettings,

    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl HookConfig {
    /// Built-in providers with default HTTP settings.
    pub fn builtin() -> Self {
        Self {
            http: HttpSettings::default(),
            providers: ProviderRegistry::builtin().providers,
        }
    }

    /// Parse a TOML document.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| AuthError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            AuthError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&source)
    }

    /// Validate and split into the parts the authenticator needs.
    pub fn into_parts(self) -> Result<(ProviderRegistry, HttpSettings)> {
        self.into_parts_with_env(|_| None)
    }

    /// Apply credential overrides from `lookup`, then validate the merged
    /// result and split it.
    pub fn into_parts_with_env<F>(self, lookup: F) -> Result<(ProviderRegistry, HttpSettings)>
    where
        F: Fn(&str) -> Option<String>,
    {
        let registry = ProviderRegistry {
            providers: self.providers,
        }
        .with_env_overrides(lookup);
        registry.validate()?;
        self.http.validate()?;
        Ok((registry, self.http))
    }
}
