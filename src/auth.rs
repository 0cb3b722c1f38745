//! Access-token issuance against the provider's OAuth2 token endpoint.
//!
//! Tokens are short-lived and fetched fresh for every operation; nothing
//! is cached. Callers needing fewer token round trips must rate-limit
//! externally.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result, Violation};
use crate::transport::Transport;
use crate::validation::check_required;

/// Bearer credential returned by the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// Lifetime in seconds. Informational only: every operation fetches a
    /// fresh token regardless.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Basic-auth key for a key/secret pair: standard base64 of `"key:secret"`.
pub fn basic_credentials(key: &str, secret: &str) -> String {
    BASE64.encode(format!("{key}:{secret}"))
}

/// Exchanges a client key/secret for a fresh access token.
///
/// Posts `grant_type=client_credentials` to `{base_endpoint}/token` with
/// HTTP Basic auth. No retry: a failed exchange is returned as-is.
pub async fn fetch_access_token(
    transport: &dyn Transport,
    key: &str,
    secret: &str,
    base_endpoint: &str,
) -> Result<AccessToken> {
    let mut violations = Vec::new();
    check_required(&mut violations, "key", key);
    check_required(&mut violations, "secret", secret);
    check_required(&mut violations, "base_endpoint", base_endpoint);
    if !violations.is_empty() {
        return Err(Error::validation(violations));
    }

    let endpoint = format!("{}/token", base_endpoint.trim_end_matches('/'));
    let headers = vec![
        (
            "Authorization".to_string(),
            format!("Basic {}", basic_credentials(key, secret)),
        ),
        (
            "Content-Type".to_string(),
            "application/x-www-form-urlencoded".to_string(),
        ),
    ];

    debug!(endpoint, "requesting access token");

    let response = transport
        .post(&endpoint, b"grant_type=client_credentials".to_vec(), &headers)
        .await?;

    if !response.is_success() {
        return Err(Error::backend(
            "access token request",
            endpoint,
            response.status,
            response.text(),
        ));
    }

    response.json()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::transport::RawResponse;

    struct CannedTransport {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn post(
            &self,
            _url: &str,
            _body: Vec<u8>,
            _headers: &[(String, String)],
        ) -> Result<RawResponse> {
            Ok(RawResponse {
                status: self.status,
                body: self.body.as_bytes().to_vec(),
            })
        }

        async fn get(&self, _url: &str, _headers: &[(String, String)]) -> Result<RawResponse> {
            unreachable!("token exchange never issues GET")
        }
    }

    #[test]
    fn basic_credentials_is_base64_of_key_colon_secret() {
        assert_eq!(basic_credentials("k", "s"), "azpz");
        assert_eq!(basic_credentials("key", "secret"), "a2V5OnNlY3JldA==");
    }

    #[tokio::test]
    async fn empty_inputs_fail_before_any_request() {
        let transport = CannedTransport {
            status: 200,
            body: "{}",
        };
        let err = fetch_access_token(&transport, "", "secret", "")
            .await
            .unwrap_err();

        let violations = err.violations().expect("validation error");
        let fields: Vec<_> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, ["key", "base_endpoint"]);
    }

    #[tokio::test]
    async fn success_body_is_decoded() {
        let transport = CannedTransport {
            status: 200,
            body: r#"{"access_token":"tok1","scope":"apimanagement","token_type":"Bearer","expires_in":3600}"#,
        };
        let token = fetch_access_token(&transport, "key", "secret", "https://api.example")
            .await
            .unwrap();

        assert_eq!(token.access_token, "tok1");
        assert_eq!(token.expires_in, Some(3600));
    }

    #[tokio::test]
    async fn non_success_status_is_a_backend_error() {
        let transport = CannedTransport {
            status: 401,
            body: "unauthorized",
        };
        let err = fetch_access_token(&transport, "key", "secret", "https://api.example")
            .await
            .unwrap_err();

        match err {
            Error::Backend { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "unauthorized");
            }
            other => panic!("expected backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let transport = CannedTransport {
            status: 200,
            body: "<html>oops</html>",
        };
        let err = fetch_access_token(&transport, "key", "secret", "https://api.example")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
