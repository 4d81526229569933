//! Optional ID token signature verification against the provider's JWKS.
//!
//! Enabled per provider with `verify_signature = true`. The key set is
//! fetched from the `jwks_uri` advertised in discovery; nothing is cached
//! since each run performs a single login.
//!
//! # Feature Flag
//!
//! Requires the `jwt-auth` feature (enabled by default).

use crate::config::ProviderConfig;
use crate::discovery::DiscoveryDocument;
use crate::error::{AuthError, Result};

/// Clock skew tolerated on `exp`/`nbf`.
pub const LEEWAY_SECONDS: u64 = 60;

/// JWKS response structure.
#[cfg(feature = "jwt-auth")]
#[derive(Debug, serde::Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[cfg(feature = "jwt-auth")]
#[derive(Debug, serde::Deserialize)]
struct JwkKey {
    kid: Option<String>,
    kty: String,
    n: Option<String>,
    e: Option<String>,
}

/// Verify the ID token signature, expiry, audience and issuer.
#[cfg(feature = "jwt-auth")]
pub async fn verify(
    http_client: &reqwest::Client,
    discovery: &DiscoveryDocument,
    provider: &ProviderConfig,
    id_token: &str,
) -> Result<()> {
    use jsonwebtoken::{decode, decode_header, Algorithm, Validation};

    let jwks_uri = discovery.jwks_uri.as_deref().ok_or_else(|| {
        AuthError::discovery(
            &provider.discovery_url,
            "signature verification enabled but no jwks_uri advertised",
        )
    })?;

    let header = decode_header(id_token)
        .map_err(|e| AuthError::SignatureVerification(format!("invalid token header: {}", e)))?;

    if !matches!(
        header.alg,
        Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512
    ) {
        return Err(AuthError::SignatureVerification(format!(
            "unsupported algorithm {:?}",
            header.alg
        )));
    }

    let jwks = fetch_jwks(http_client, jwks_uri).await?;
    let key = select_key(&jwks, header.kid.as_deref())?;

    let mut validation = Validation::new(header.alg);
    validation.set_audience(&[&provider.client_id]);
    if let Some(issuer) = &discovery.issuer {
        validation.set_issuer(&[issuer]);
    }
    validation.leeway = LEEWAY_SECONDS;

    decode::<serde_json::Value>(id_token, &key, &validation).map_err(|e| {
        let msg = match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => "token expired",
            jsonwebtoken::errors::ErrorKind::InvalidIssuer => "invalid issuer",
            jsonwebtoken::errors::ErrorKind::InvalidAudience => "invalid audience",
            jsonwebtoken::errors::ErrorKind::InvalidSignature => "invalid signature",
            jsonwebtoken::errors::ErrorKind::ImmatureSignature => "token not yet valid",
            jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_) => "missing required claim",
            _ => "token validation failed",
        };
        AuthError::SignatureVerification(msg.to_string())
    })?;

    tracing::debug!(jwks_uri = %jwks_uri, "ID token signature verified");
    Ok(())
}

/// Signature verification stub for builds without `jwt-auth`.
#[cfg(not(feature = "jwt-auth"))]
pub async fn verify(
    _http_client: &reqwest::Client,
    _discovery: &DiscoveryDocument,
    _provider: &ProviderConfig,
    _id_token: &str,
) -> Result<()> {
    Err(AuthError::SignatureVerification(
        "signature verification requires the 'jwt-auth' feature".to_string(),
    ))
}

#[cfg(feature = "jwt-auth")]
async fn fetch_jwks(http_client: &reqwest::Client, jwks_uri: &str) -> Result<JwksResponse> {
    tracing::debug!(jwks_uri = %jwks_uri, "Fetching JWKS");

    let response = http_client
        .get(jwks_uri)
        .send()
        .await
        .map_err(|e| AuthError::SignatureVerification(format!("failed to fetch JWKS: {}", e)))?;

    if !response.status().is_success() {
        return Err(AuthError::SignatureVerification(format!(
            "JWKS endpoint returned status {}",
            response.status()
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AuthError::SignatureVerification(format!("failed to parse JWKS: {}", e)))
}

/// Pick the RSA key matching `kid`; a lone key is used when the token has no `kid`.
#[cfg(feature = "jwt-auth")]
fn select_key(jwks: &JwksResponse, kid: Option<&str>) -> Result<jsonwebtoken::DecodingKey> {
    let rsa_keys: Vec<&JwkKey> = jwks.keys.iter().filter(|k| k.kty == "RSA").collect();

    let key = match kid {
        Some(kid) => rsa_keys
            .iter()
            .find(|k| k.kid.as_deref() == Some(kid))
            .ok_or_else(|| AuthError::SignatureVerification(format!("unknown key ID: {}", kid)))?,
        None => match rsa_keys.as_slice() {
            [only] => only,
            _ => {
                return Err(AuthError::SignatureVerification(
                    "token missing key ID (kid)".to_string(),
                ))
            },
        },
    };

    let (Some(n), Some(e)) = (&key.n, &key.e) else {
        return Err(AuthError::SignatureVerification(
            "JWK lacks RSA components".to_string(),
        ));
    };

    jsonwebtoken::DecodingKey::from_rsa_components(n, e)
        .map_err(|err| AuthError::SignatureVerification(format!("invalid JWK: {}", err)))
}
