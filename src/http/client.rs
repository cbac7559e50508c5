// Default HTTP transport backed by reqwest.
// Converts plain-data requests into reqwest calls and collects status and body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Method,
    header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT},
};
use tracing::debug;

use crate::error::{Result, SdkError};

use super::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};

const SDK_USER_AGENT: &str = concat!("monthly-cloud-sdk/", env!("CARGO_PKG_VERSION"));

/// Transport that sends requests with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with reqwest's default settings.
    pub fn new() -> Result<Self> {
        Self::build(None)
    }

    /// Create a transport whose requests fail after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::build(Some(timeout))
    }

    /// Wrap an already configured reqwest client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    fn build(timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SDK_USER_AGENT));

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(SdkError::Transport)?;
        Ok(Self { client })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Patch => Method::PATCH,
    }
}

fn header_map(headers: &[(String, String)]) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SdkError::InvalidConfig(format!("header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SdkError::InvalidConfig(format!("header {}: {}", name, e)))?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(method(request.method), &request.url)
            .headers(header_map(&request.headers)?);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, url = %request.url, "received response");
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_map_accepts_valid_headers() {
        let headers = vec![
            ("Accept".to_string(), "application/json".to_string()),
            ("Authorization".to_string(), "Bearer abc".to_string()),
        ];
        let map = header_map(&headers).unwrap();
        assert_eq!(map.get("accept").unwrap(), "application/json");
        assert_eq!(map.get("authorization").unwrap(), "Bearer abc");
    }

    #[test]
    fn test_header_map_rejects_control_characters() {
        let headers = vec![("Authorization".to_string(), "Bearer a\nb".to_string())];
        let err = header_map(&headers).unwrap_err();
        assert!(matches!(err, SdkError::InvalidConfig(_)));
    }

    #[test]
    fn test_method_mapping() {
        assert_eq!(method(HttpMethod::Get), Method::GET);
        assert_eq!(method(HttpMethod::Post), Method::POST);
        assert_eq!(method(HttpMethod::Patch), Method::PATCH);
    }
}
