//! The network primitive the client wraps.
//!
//! [`FetchClient`](crate::FetchClient) never talks to the network itself: it
//! hands a fully assembled [`TransportRequest`] to a [`Transport`] and gets
//! back the raw status, headers and body bytes. [`ReqwestTransport`] is the
//! default; tests and embedders can plug in their own.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::{Method, StatusCode};

use crate::{TransportError, TransportErrorKind};

/// A request ready to be sent.
#[derive(Clone, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// Raw response as read off the wire.
#[derive(Clone, Debug)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Builds a response whose status text is the canonical reason phrase.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status.canonical_reason().unwrap_or_default().to_owned(),
            headers,
            body: body.into(),
        }
    }

    /// `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Declared content type, or an empty string.
    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }
}

/// Sends one request and reads the complete response body.
///
/// Implementations must be cancel-safe: the client drops the returned future
/// when the call times out or its signal fires.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url).map_err(|err| {
            TransportError::new(
                TransportErrorKind::Request,
                format!("invalid url '{}': {err}", request.url),
            )
        })?;

        let mut builder = self
            .http
            .request(request.method, url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(TransportResponse::new(status, headers, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::{Method, StatusCode};

    use super::{ReqwestTransport, Transport, TransportRequest, TransportResponse};
    use crate::TransportErrorKind;

    #[test]
    fn status_text_uses_canonical_reason() {
        let response = TransportResponse::new(StatusCode::UNAUTHORIZED, HeaderMap::new(), "");
        assert_eq!(response.status_text, "Unauthorized");
        assert!(!response.is_success());
    }

    #[test]
    fn content_type_defaults_to_empty() {
        let mut headers = HeaderMap::new();
        let response = TransportResponse::new(StatusCode::OK, headers.clone(), "");
        assert_eq!(response.content_type(), "");

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let response = TransportResponse::new(StatusCode::OK, headers, "OK");
        assert_eq!(response.content_type(), "text/plain");
    }

    #[tokio::test]
    async fn relative_url_is_a_request_error() {
        let transport = ReqwestTransport::default();
        let err = transport
            .send(TransportRequest {
                method: Method::GET,
                url: "/users".to_owned(),
                headers: HeaderMap::new(),
                body: None,
            })
            .await
            .expect_err("relative url cannot be sent");
        assert_eq!(err.kind(), TransportErrorKind::Request);
        assert!(!err.is_retryable());
    }
}
