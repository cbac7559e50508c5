// Shared request headers and response decoding for both builders.

use serde_json::Value;

use crate::error::{Result, SdkError};

use super::transport::HttpResponse;

pub const ACCEPT: &str = "Accept";
pub const AUTHORIZATION: &str = "Authorization";
pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// Headers sent with every call. The bearer header is added when a token is given.
pub fn default_headers(access_token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = vec![(ACCEPT.to_string(), APPLICATION_JSON.to_string())];
    if let Some(token) = access_token {
        headers.push((AUTHORIZATION.to_string(), format!("Bearer {}", token)));
    }
    headers
}

/// Headers for a call carrying a JSON body.
pub fn json_headers(access_token: Option<&str>) -> Vec<(String, String)> {
    let mut headers = default_headers(access_token);
    headers.push((CONTENT_TYPE.to_string(), APPLICATION_JSON.to_string()));
    headers
}

/// Check response status and decode the JSON body.
///
/// An empty 2xx body decodes to `Value::Null`.
pub fn decode_response(url: &str, response: &HttpResponse) -> Result<Value> {
    match response.status {
        200..=299 => {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            Ok(serde_json::from_str(&response.body)?)
        }
        401 => Err(SdkError::Unauthorized),
        404 => Err(SdkError::NotFound(url.to_string())),
        status => Err(SdkError::Http {
            status,
            body: response.body.clone(),
        }),
    }
}
