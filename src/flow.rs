//! The login pipeline.
//!
//! ```text
//! Start → Decoded → ProviderResolved → DiscoveryResolved → TokenExchanged → IdentityExtracted
//!   └──────────┴──────────────┴──────────────────┴──────────────┴──→ Failed(ErrorKind)
//! ```
//!
//! Each stage short-circuits on the first unmet precondition. The provider
//! lookup happens before any network traffic.

use std::fmt;

use crate::artifact::{self, AuthRequest};
use crate::config::{HttpSettings, ProviderRegistry};
use crate::discovery;
use crate::error::Result;
use crate::id_token::IdentityClaims;
use crate::token;

/// Progress of a single login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    Start,
    Decoded,
    ProviderResolved,
    DiscoveryResolved,
    TokenExchanged,
    IdentityExtracted,
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Start => "start",
            Self::Decoded => "decoded",
            Self::ProviderResolved => "provider_resolved",
            Self::DiscoveryResolved => "discovery_resolved",
            Self::TokenExchanged => "token_exchanged",
            Self::IdentityExtracted => "identity_extracted",
        })
    }
}

/// Runs login attempts against a fixed provider registry.
///
/// The registry is read-only, so one `Authenticator` can serve concurrent
/// attempts when shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Authenticator {
    registry: ProviderRegistry,
    http_client: reqwest::Client,
}

impl Authenticator {
    /// Create an authenticator with its own HTTP client.
    pub fn new(registry: ProviderRegistry, http: &HttpSettings) -> Result<Self> {
        Ok(Self::with_client(registry, http.build_client()?))
    }

    /// Create an authenticator from an existing reqwest client.
    pub fn with_client(registry: ProviderRegistry, http_client: reqwest::Client) -> Self {
        Self {
            registry,
            http_client,
        }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Authenticate a raw artifact as handed over by the gateway.
    pub async fn authenticate(&self, raw_artifact: &[u8]) -> Result<IdentityClaims> {
        let request = artifact::decode(raw_artifact).inspect_err(|e| {
            tracing::warn!(
                stage = %AuthStage::Start,
                error_kind = %e.kind(),
                error = %e,
                "Login failed"
            );
        })?;
        tracing::debug!(
            stage = %AuthStage::Decoded,
            provider = %request.service,
            "Artifact decoded"
        );
        self.authenticate_request(&request).await
    }

    /// Authenticate an already decoded request.
    pub async fn authenticate_request(&self, request: &AuthRequest) -> Result<IdentityClaims> {
        let mut stage = AuthStage::Decoded;
        let result = self.run(request, &mut stage).await;
        match &result {
            Ok(claims) => tracing::info!(
                stage = %stage,
                provider = %request.service,
                email = %claims.email,
                "Login succeeded"
            ),
            Err(e) => tracing::warn!(
                stage = %stage,
                provider = %request.service,
                error_kind = %e.kind(),
                error = %e,
                "Login failed"
            ),
        }
        result
    }

    async fn run(&self, request: &AuthRequest, stage: &mut AuthStage) -> Result<IdentityClaims> {
        let provider = self.registry.lookup(&request.service)?;
        *stage = AuthStage::ProviderResolved;

        let document = discovery::resolve(&self.http_client, &provider.discovery_url).await?;
        *stage = AuthStage::DiscoveryResolved;
        tracing::debug!(stage = %stage, provider = %request.service, "Discovery resolved");

        let tokens = token::request_tokens(
            &self.http_client,
            &document.token_endpoint,
            provider,
            &request.code,
        )
        .await?;
        *stage = AuthStage::TokenExchanged;
        tracing::debug!(stage = %stage, provider = %request.service, "Code exchanged");

        let claims =
            token::identity_from_tokens(&self.http_client, &document, provider, &tokens).await?;
        *stage = AuthStage::IdentityExtracted;
        Ok(claims)
    }
}
