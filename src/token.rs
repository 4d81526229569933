//! Authorization code exchange.

use serde::Deserialize;

use crate::artifact::AuthRequest;
use crate::config::ProviderConfig;
use crate::discovery::DiscoveryDocument;
use crate::error::{AuthError, Result};
use crate::id_token::{self, IdentityClaims};

/// Response from the token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,

    /// ID token (OIDC).
    pub id_token: String,

    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,

    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[redacted]")
            .field("id_token", &"[redacted]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// POST the authorization code to the token endpoint.
///
/// Client credentials travel in the form body (`client_secret_post`).
pub async fn request_tokens(
    http_client: &reqwest::Client,
    token_endpoint: &str,
    provider: &ProviderConfig,
    code: &str,
) -> Result<TokenResponse> {
    let form = [
        ("code", code),
        ("client_id", provider.client_id.as_str()),
        ("client_secret", provider.client_secret.as_str()),
        ("redirect_uri", provider.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = http_client
        .post(token_endpoint)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&form)
        .send()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("request failed: {}", e)))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        // The body usually carries an OAuth error code; it never contains tokens.
        let error_text = response.text().await.unwrap_or_default();
        tracing::debug!(status = %status, body = %error_text, "Token endpoint rejected the code");
        return Err(AuthError::TokenExchange(format!(
            "endpoint returned status {}",
            status
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| AuthError::TokenExchange(format!("failed to read body: {}", e)))?;

    serde_json::from_slice(&body)
        .map_err(|e| AuthError::TokenExchange(format!("invalid token response: {}", e)))
}

/// Exchange the code and extract the caller's identity from the ID token.
pub async fn exchange(
    http_client: &reqwest::Client,
    discovery: &DiscoveryDocument,
    provider: &ProviderConfig,
    request: &AuthRequest,
) -> Result<IdentityClaims> {
    let tokens = request_tokens(
        http_client,
        &discovery.token_endpoint,
        provider,
        &request.code,
    )
    .await?;

    identity_from_tokens(http_client, discovery, provider, &tokens).await
}

/// Turn a token response into identity claims.
///
/// The structural check runs first so a malformed token is always reported
/// as such, even when signature verification is enabled.
pub async fn identity_from_tokens(
    http_client: &reqwest::Client,
    discovery: &DiscoveryDocument,
    provider: &ProviderConfig,
    tokens: &TokenResponse,
) -> Result<IdentityClaims> {
    id_token::split_compact(&tokens.id_token)?;

    if provider.verify_signature {
        crate::jwks::verify(http_client, discovery, provider, &tokens.id_token).await?;
    }

    id_token::extract_claims(&tokens.id_token)
}
