//! Error types for the login flow.
//!
//! Every failure in the pipeline is terminal. [`AuthError`] keeps the cause
//! distinguishable for logs and tests even though the hook itself only
//! reports a bare exit status to the gateway.

use std::fmt;

use thiserror::Error;

/// Errors that can occur while authenticating a login artifact.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The artifact is not base64, not JSON, or lacks `service`/`code`.
    #[error("Invalid login artifact: {0}")]
    Decode(String),

    /// The artifact names a provider that is not configured.
    #[error("Unknown identity provider '{service}'")]
    UnknownProvider { service: String },

    /// The discovery document could not be fetched or is incomplete.
    #[error("Discovery failed for '{url}': {message}")]
    DiscoveryFetch { url: String, message: String },

    /// The authorization code could not be exchanged for tokens.
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The ID token is structurally invalid or carries no email claim.
    #[error("Malformed ID token: {0}")]
    MalformedIdToken(String),

    /// The ID token signature or registered claims did not validate.
    #[error("ID token verification failed: {0}")]
    SignatureVerification(String),

    /// Provider configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AuthError {
    pub(crate) fn discovery(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiscoveryFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// The kind tag of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode(_) => ErrorKind::Decode,
            Self::UnknownProvider { .. } => ErrorKind::UnknownProvider,
            Self::DiscoveryFetch { .. } => ErrorKind::DiscoveryFetch,
            Self::TokenExchange(_) => ErrorKind::TokenExchange,
            Self::MalformedIdToken(_) => ErrorKind::MalformedIdToken,
            Self::SignatureVerification(_) => ErrorKind::SignatureVerification,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Flat classification of [`AuthError`] used in structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Decode,
    UnknownProvider,
    DiscoveryFetch,
    TokenExchange,
    MalformedIdToken,
    SignatureVerification,
    Config,
}

impl ErrorKind {
    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decode => "decode_error",
            Self::UnknownProvider => "unknown_provider",
            Self::DiscoveryFetch => "discovery_fetch_error",
            Self::TokenExchange => "token_exchange_error",
            Self::MalformedIdToken => "malformed_id_token",
            Self::SignatureVerification => "signature_verification_error",
            Self::Config => "config_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result type for login operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AuthError::Decode("x".into()).kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            AuthError::UnknownProvider {
                service: "nope".into()
            }
            .kind(),
            ErrorKind::UnknownProvider
        );
        assert_eq!(
            AuthError::discovery("https://idp", "status 500").kind(),
            ErrorKind::DiscoveryFetch
        );
        assert_eq!(
            AuthError::TokenExchange("x".into()).kind(),
            ErrorKind::TokenExchange
        );
        assert_eq!(
            AuthError::MalformedIdToken("x".into()).kind(),
            ErrorKind::MalformedIdToken
        );
    }

    #[test]
    fn test_display_includes_context() {
        let err = AuthError::UnknownProvider {
            service: "github-oidc".into(),
        };
        assert!(err.to_string().contains("github-oidc"));

        let err = AuthError::discovery("https://idp.example.com/.well-known", "status 404");
        let msg = err.to_string();
        assert!(msg.contains("https://idp.example.com/.well-known"));
        assert!(msg.contains("status 404"));
    }

    #[test]
    fn test_kind_names_are_stable() {
        assert_eq!(ErrorKind::DiscoveryFetch.to_string(), "discovery_fetch_error");
        assert_eq!(ErrorKind::MalformedIdToken.as_str(), "malformed_id_token");
        assert_eq!(ErrorKind::Config.as_str(), "config_error");
    }
}
