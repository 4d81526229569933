//! ID token payload extraction.
//!
//! The token is compact JWS: `header.payload.signature`. Only the payload is
//! read here; signature checks live in [`crate::jwks`].

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// Claims carried by the ID token.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityClaims {
    /// Verified email address of the user.
    pub email: String,

    /// All other claims as returned by the provider.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl IdentityClaims {
    /// Subject identifier, when present.
    pub fn subject(&self) -> Option<&str> {
        self.extra.get("sub").and_then(|v| v.as_str())
    }

    /// Issuer, when present.
    pub fn issuer(&self) -> Option<&str> {
        self.extra.get("iss").and_then(|v| v.as_str())
    }
}

/// Decode one base64url segment, padding with `=` to a multiple of four.
pub fn decode_segment(segment: &str) -> Result<Vec<u8>> {
    let mut padded = String::with_capacity(segment.len() + 3);
    padded.push_str(segment);
    while padded.len() % 4 != 0 {
        padded.push('=');
    }
    URL_SAFE
        .decode(padded.as_bytes())
        .map_err(|e| AuthError::MalformedIdToken(format!("payload is not base64url: {}", e)))
}

/// Split a compact token into exactly three parts.
pub(crate) fn split_compact(token: &str) -> Result<[&str; 3]> {
    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok([header, payload, signature]),
        _ => Err(AuthError::MalformedIdToken(format!(
            "expected 3 dot-separated parts, found {}",
            token.split('.').count()
        ))),
    }
}

/// Extract the identity claims from an ID token without verifying its signature.
pub fn extract_claims(id_token: &str) -> Result<IdentityClaims> {
    let [_, payload, _] = split_compact(id_token)?;
    let bytes = decode_segment(payload)?;

    let claims: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::MalformedIdToken(format!("payload is not JSON: {}", e)))?;

    let serde_json::Value::Object(mut map) = claims else {
        return Err(AuthError::MalformedIdToken(
            "payload is not a JSON object".to_string(),
        ));
    };

    let email = match map.remove("email") {
        Some(serde_json::Value::String(email)) => email,
        Some(_) => {
            return Err(AuthError::MalformedIdToken(
                "'email' claim is not a string".to_string(),
            ))
        },
        None => {
            return Err(AuthError::MalformedIdToken(
                "missing 'email' claim".to_string(),
            ))
        },
    };

    Ok(IdentityClaims { email, extra: map })
}
