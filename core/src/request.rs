//! Generic JSON request builder and response normalizer.
//!
//! # Design
//! `RequestClient` holds only a `base_url`. `build_request` turns a path,
//! method, optional JSON body and optional access token into an
//! `HttpRequest`; `parse_response` turns any `HttpResponse` into either the
//! parsed JSON body or an `ApiError::Request`. Every typed endpoint in
//! `catalog` and `auth` is a thin layer over these two functions.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, AUTH_HEADER};

/// Shape of the error bodies returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RequestClient {
    base_url: String,
}

impl RequestClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request for `path` (relative, starting with `/`).
    ///
    /// The body is serialized as JSON and tagged with the JSON content type;
    /// the token, when present, goes into the `X-Authorization` header.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        path: &str,
        method: HttpMethod,
        body: Option<&B>,
        access_token: Option<&str>,
    ) -> Result<HttpRequest, ApiError> {
        let mut headers = Vec::new();
        let body = match body {
            Some(body) => {
                let json = serde_json::to_string(body)
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                headers.push(("content-type".to_string(), "application/json".to_string()));
                Some(json)
            }
            None => None,
        };
        if let Some(token) = access_token {
            headers.push((AUTH_HEADER.to_string(), token.to_string()));
        }

        Ok(HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body,
        })
    }

    /// Bodyless variant of `build_request`.
    pub fn build_empty(&self, path: &str, method: HttpMethod, access_token: Option<&str>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(token) = access_token {
            headers.push((AUTH_HEADER.to_string(), token.to_string()));
        }
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    /// Normalize a response into parsed JSON.
    ///
    /// 204 and empty 2xx bodies yield `{}`. Non-2xx responses fail with the
    /// server's `message` field, falling back to the status text.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        if !response.is_success() {
            return Err(request_error(&response));
        }
        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// `parse_response` followed by deserialization into `T`.
    pub fn parse_as<T: DeserializeOwned>(&self, response: HttpResponse) -> Result<T, ApiError> {
        let value = self.parse_response(response)?;
        serde_json::from_value(value).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Build, execute once, and parse. No retries.
    pub fn request<T, B>(
        &self,
        transport: &T,
        path: &str,
        method: HttpMethod,
        body: Option<&B>,
        access_token: Option<&str>,
    ) -> Result<Value, ApiError>
    where
        T: Transport + ?Sized,
        B: Serialize + ?Sized,
    {
        let request = self.build_request(path, method, body, access_token)?;
        let response = transport.execute(request)?;
        self.parse_response(response)
    }
}

fn request_error(response: &HttpResponse) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .or_else(|| response.status_text().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {}", response.status));
    ApiError::Request {
        status: response.status,
        message,
    }
}
