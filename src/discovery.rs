//! OIDC discovery document retrieval.

use serde::Deserialize;

use crate::error::{AuthError, Result};

/// The subset of the provider metadata (`.well-known/openid-configuration`)
/// needed for the code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiscoveryDocument {
    /// Token endpoint URL.
    pub token_endpoint: String,

    /// `UserInfo` endpoint URL.
    pub userinfo_endpoint: String,

    /// Issuer identifier.
    #[serde(default)]
    pub issuer: Option<String>,

    /// JWKS URI for signature verification.
    #[serde(default)]
    pub jwks_uri: Option<String>,
}

/// Fetch and validate the discovery document at `discovery_url`.
///
/// Performs exactly one GET. Fails with [`AuthError::DiscoveryFetch`] on
/// transport errors, non-200 status, invalid JSON, or missing endpoints.
pub async fn resolve(
    http_client: &reqwest::Client,
    discovery_url: &str,
) -> Result<DiscoveryDocument> {
    tracing::debug!(url = %discovery_url, "Fetching OIDC discovery");

    let response = http_client
        .get(discovery_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|e| AuthError::discovery(discovery_url, format!("request failed: {}", e)))?;

    if response.status() != reqwest::StatusCode::OK {
        return Err(AuthError::discovery(
            discovery_url,
            format!("endpoint returned status {}", response.status()),
        ));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| AuthError::discovery(discovery_url, format!("failed to read body: {}", e)))?;

    let document: DiscoveryDocument = serde_json::from_slice(&body)
        .map_err(|e| AuthError::discovery(discovery_url, format!("invalid document: {}", e)))?;

    tracing::debug!(
        token_endpoint = %document.token_endpoint,
        userinfo_endpoint = %document.userinfo_endpoint,
        "Resolved OIDC endpoints"
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const PATH: &str = "/.well-known/openid-configuration";

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut server = mockito::Server::new_async().await;
        let body = serde_json::json!({
            "issuer": server.url(),
            "authorization_endpoint": format!("{}/authorize", server.url()),
            "token_endpoint": format!("{}/token", server.url()),
            "userinfo_endpoint": format!("{}/userinfo", server.url()),
            "jwks_uri": format!("{}/jwks", server.url()),
            "scopes_supported": ["openid", "email"]
        });
        let mock = server
            .mock("GET", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(1)
            .create_async()
            .await;

        let document = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap();

        assert_eq!(document.token_endpoint, format!("{}/token", server.url()));
        assert_eq!(document.userinfo_endpoint, format!("{}/userinfo", server.url()));
        assert_eq!(document.issuer.as_deref(), Some(server.url().as_str()));
        assert_eq!(document.jwks_uri, Some(format!("{}/jwks", server.url())));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_resolve_non_200() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PATH)
            .with_status(404)
            .create_async()
            .await;

        let err = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_resolve_other_success_status_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PATH)
            .with_status(203)
            .with_body(r#"{"token_endpoint":"t","userinfo_endpoint":"u"}"#)
            .create_async()
            .await;

        let err = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
    }

    #[tokio::test]
    async fn test_resolve_invalid_json() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PATH)
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let err = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
    }

    #[tokio::test]
    async fn test_resolve_missing_userinfo_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PATH)
            .with_status(200)
            .with_body(r#"{"token_endpoint":"https://idp.example.com/token"}"#)
            .create_async()
            .await;

        let err = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
    }

    #[tokio::test]
    async fn test_resolve_missing_token_endpoint() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", PATH)
            .with_status(200)
            .with_body(r#"{"userinfo_endpoint":"https://idp.example.com/userinfo"}"#)
            .create_async()
            .await;

        let err = resolve(&client(), &format!("{}{}", server.url(), PATH))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
    }

    #[tokio::test]
    async fn test_resolve_connection_refused() {
        let err = resolve(&client(), "http://127.0.0.1:1/.well-known/openid-configuration")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryFetch);
    }
}
