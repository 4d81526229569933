//! Decoding of the login artifact handed over by the gateway.
//!
//! The gateway passes a single opaque credential, `base64(JSON)` with
//! `{"service": "<provider id>", "code": "<authorization code>"}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::error::{AuthError, Result};

/// A decoded login request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthRequest {
    /// Provider identifier, looked up in the registry.
    pub service: String,
    /// OAuth authorization code.
    pub code: String,
}

/// Decode a raw artifact into an [`AuthRequest`].
///
/// Surrounding ASCII whitespace is ignored; everything else must be
/// canonical standard-alphabet base64 of a UTF-8 JSON object.
pub fn decode(raw: &[u8]) -> Result<AuthRequest> {
    let bytes = STANDARD
        .decode(raw.trim_ascii())
        .map_err(|e| AuthError::Decode(format!("not valid base64: {}", e)))?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::Decode(format!("not valid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(AuthError::Decode("request is not a JSON object".to_string()));
    }

    let request: AuthRequest = serde_json::from_value(value)
        .map_err(|e| AuthError::Decode(format!("not a valid request object: {}", e)))?;

    if request.service.is_empty() {
        return Err(AuthError::Decode("empty 'service' field".to_string()));
    }
    if request.code.is_empty() {
        return Err(AuthError::Decode("empty 'code' field".to_string()));
    }

    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn encode(json: &str) -> String {
        STANDARD.encode(json)
    }

    #[test]
    fn test_decode_valid_artifact() {
        let raw = encode(r#"{"service":"google-oidc","code":"abc"}"#);
        let request = decode(raw.as_bytes()).unwrap();
        assert_eq!(
            request,
            AuthRequest {
                service: "google-oidc".to_string(),
                code: "abc".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_ignores_extra_fields_and_whitespace() {
        let raw = format!(
            "  {}\n",
            encode(r#"{"service":"keycloak-oidc","code":"4/0Ab","state":"xyz"}"#)
        );
        let request = decode(raw.as_bytes()).unwrap();
        assert_eq!(request.service, "keycloak-oidc");
        assert_eq!(request.code, "4/0Ab");
    }

    #[rstest]
    #[case::not_base64(b"%%%not-base64%%%".to_vec())]
    #[case::not_json(encode("service=google").into_bytes())]
    #[case::not_object(encode(r#"["google-oidc","abc"]"#).into_bytes())]
    #[case::missing_code(encode(r#"{"service":"google-oidc"}"#).into_bytes())]
    #[case::missing_service(encode(r#"{"code":"abc"}"#).into_bytes())]
    #[case::wrong_type(encode(r#"{"service":"google-oidc","code":42}"#).into_bytes())]
    #[case::empty_service(encode(r#"{"service":"","code":"abc"}"#).into_bytes())]
    #[case::empty_code(encode(r#"{"service":"google-oidc","code":""}"#).into_bytes())]
    #[case::empty_input(Vec::new())]
    fn test_decode_rejects(#[case] raw: Vec<u8>) {
        let err = decode(&raw).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[rstest]
    #[case::array(r#"["google-oidc","abc"]"#)]
    #[case::nested_array(r#"[["google-oidc","abc"]]"#)]
    #[case::string(r#""google-oidc""#)]
    #[case::null("null")]
    fn test_decode_rejects_non_object_json(#[case] json: &str) {
        let err = decode(encode(json).as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        let raw = STANDARD.encode([0xff, 0xfe, 0x7b]);
        let err = decode(raw.as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
