use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::{FetchError, Result};

/// Request payload.
///
/// The variant decides how the payload goes on the wire; nothing is inferred
/// from the value at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum Body {
    /// Serialized as JSON text.
    Json(serde_json::Value),
    /// Sent as-is. Set the content type through the request headers.
    Raw(Vec<u8>),
}

impl Body {
    /// Serializes any `Serialize` value into a [`Body::Json`].
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|err| FetchError::InvalidRequest(format!("body is not valid JSON: {err}")))
    }

    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }

    pub(crate) fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::Json(value) => serde_json::to_vec(value).map_err(|err| {
                FetchError::InvalidRequest(format!("failed to encode JSON body: {err}"))
            }),
            Self::Raw(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<serde_json::Value> for Body {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Raw(bytes)
    }
}

/// Per-call options: query parameters, body, header overrides, cancellation.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    /// Query parameters in insertion order; keys are unique.
    pub params: Vec<(String, String)>,
    pub body: Option<Body>,
    /// Overrides for the client's default headers.
    pub headers: HeaderMap,
    /// Caller-owned cancellation signal.
    pub signal: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a query parameter, replacing the value of an existing key in place.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.params.push((key, value)),
        }
        self
    }

    pub fn params<I, K, V>(self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .fold(self, |options, (key, value)| options.param(key, value))
    }

    pub fn json(mut self, value: serde_json::Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    pub fn raw(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(Body::Raw(bytes.into()));
        self
    }

    pub fn body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// What a request interceptor sees and may replace.
#[derive(Clone, Debug)]
pub struct RequestConfig {
    pub method: Method,
    /// Absolute URL or path relative to the client's base URL.
    pub url: String,
    pub options: RequestOptions,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>, options: RequestOptions) -> Self {
        Self {
            method,
            url: url.into(),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
    use serde::Serialize;
    use serde_json::json;

    use crate::{Body, RequestOptions};

    #[test]
    fn param_keeps_insertion_order_and_replaces_in_place() {
        let options = RequestOptions::new()
            .param("b", "1")
            .param("a", "2")
            .param("b", "3");
        assert_eq!(
            options.params,
            vec![("b".to_owned(), "3".to_owned()), ("a".to_owned(), "2".to_owned())]
        );
    }

    #[test]
    fn headers_extend_replaces_existing_key() {
        let mut extra = HeaderMap::new();
        extra.insert(ACCEPT, HeaderValue::from_static("text/plain"));
        let options = RequestOptions::new()
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .headers(extra);
        assert_eq!(options.headers.get_all(ACCEPT).iter().count(), 1);
        assert_eq!(options.headers[ACCEPT], "text/plain");
    }

    #[test]
    fn body_json_from_serializable() {
        #[derive(Serialize)]
        struct Login<'a> {
            u: &'a str,
        }

        let body = Body::json(&Login { u: "a" }).expect("struct must serialize");
        assert_eq!(body, Body::Json(json!({"u": "a"})));
        assert_eq!(body.to_bytes().expect("must encode"), br#"{"u":"a"}"#.to_vec());
    }

    #[test]
    fn raw_body_is_sent_verbatim() {
        let body = Body::Raw(b"a=1&b=2".to_vec());
        assert!(!body.is_json());
        assert_eq!(body.to_bytes().expect("must encode"), b"a=1&b=2".to_vec());
    }
}
