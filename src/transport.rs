//! HTTP transport abstraction.
//!
//! Clients speak to the provider through the [`Transport`] trait so tests
//! can substitute a double for the real HTTP stack. The only production
//! implementation is [`HttpTransport`], a thin wrapper over a shared
//! [`reqwest::Client`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Raw response as it came off the wire: status code plus body bytes.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// The provider signals success with 200 or 201 only.
    pub fn is_success(&self) -> bool {
        self.status == 200 || self.status == 201
    }

    /// Body decoded as text, lossily where it is not valid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body decoded as JSON into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::decode(e.to_string()))
    }
}

/// Issues requests on behalf of a client.
///
/// Implementations must not retry; every transient failure propagates to
/// the caller as [`Error::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(String, String)],
    ) -> Result<RawResponse>;

    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<RawResponse>;
}

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Deadline applied to every request issued through this transport,
    /// connection setup included.
    pub timeout: Duration,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

/// Production transport backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to create HTTP client");

        Self { client }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<RawResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::transport(e.to_string()))?
            .to_vec();

        Ok(RawResponse { status, body })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(HttpTransportConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        headers: &[(String, String)],
    ) -> Result<RawResponse> {
        let mut request = self.client.post(url).body(body);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        self.send(request).await
    }

    async fn get(&self, url: &str, headers: &[(String, String)]) -> Result<RawResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        self.send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_are_200_and_201_only() {
        for status in [200, 201] {
            let response = RawResponse {
                status,
                body: Vec::new(),
            };
            assert!(response.is_success());
        }
        for status in [199, 202, 204, 301, 400, 500] {
            let response = RawResponse {
                status,
                body: Vec::new(),
            };
            assert!(!response.is_success());
        }
    }

    #[test]
    fn json_decode_failure_maps_to_decode_error() {
        let response = RawResponse {
            status: 200,
            body: b"not json".to_vec(),
        };
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
