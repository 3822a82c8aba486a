use reqwest::header::{HeaderMap, CONTENT_TYPE};
use serde::de::DeserializeOwned;

use crate::{transport::TransportResponse, FetchError, Result};

/// Decoded response body: structured JSON or raw text, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ResponseData {
    Json(serde_json::Value),
    Text(String),
}

impl ResponseData {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Json(_) => None,
        }
    }
}

/// Uniform result of a completed call.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedResponse {
    /// `true` for 2xx statuses.
    pub ok: bool,
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub data: ResponseData,
}

impl NormalizedResponse {
    /// Returns a response header as text, matching the name case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Deserializes structured data into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.data {
            ResponseData::Json(value) => T::deserialize(value)
                .map_err(|err| FetchError::Decode(format!("unexpected response shape: {err}"))),
            ResponseData::Text(_) => Err(FetchError::Decode(
                "response body is text, not JSON".to_owned(),
            )),
        }
    }

    /// Body text when the response was not structured.
    pub fn text(&self) -> Option<&str> {
        self.data.as_text()
    }

    /// Message used when this response becomes an HTTP error.
    ///
    /// A non-empty string `message` field in JSON data wins, then the status
    /// text, then `"HTTP Error"`.
    pub fn error_message(&self) -> String {
        let from_body = self
            .data
            .as_json()
            .and_then(|value| value.get("message"))
            .and_then(serde_json::Value::as_str)
            .filter(|message| !message.is_empty());

        match from_body {
            Some(message) => message.to_owned(),
            None if !self.status_text.is_empty() => self.status_text.clone(),
            None => "HTTP Error".to_owned(),
        }
    }
}

/// `application/json` and `+json` media types are decoded as structured data.
pub fn is_structured_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}

/// Decodes the body according to the declared content type.
///
/// An empty structured body decodes as JSON `null`.
pub fn normalize(raw: TransportResponse) -> Result<NormalizedResponse> {
    let data = decode_body(&raw)?;
    Ok(wrap(raw, data))
}

/// Like [`normalize`], but a structured body that fails to parse is kept as
/// text. Used for error statuses, where gateways often answer with HTML
/// under a JSON content type.
pub(crate) fn normalize_lenient(raw: TransportResponse) -> NormalizedResponse {
    let data = decode_body(&raw)
        .unwrap_or_else(|_| ResponseData::Text(String::from_utf8_lossy(&raw.body).into_owned()));
    wrap(raw, data)
}

fn decode_body(raw: &TransportResponse) -> Result<ResponseData> {
    let structured = raw
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(is_structured_content_type);

    if !structured {
        return Ok(ResponseData::Text(
            String::from_utf8_lossy(&raw.body).into_owned(),
        ));
    }
    if raw.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResponseData::Json(serde_json::Value::Null));
    }
    serde_json::from_slice(&raw.body)
        .map(ResponseData::Json)
        .map_err(|err| {
            FetchError::Decode(format!(
                "invalid JSON response body: {err}; body: {}",
                String::from_utf8_lossy(&raw.body)
            ))
        })
}

fn wrap(raw: TransportResponse, data: ResponseData) -> NormalizedResponse {
    NormalizedResponse {
        ok: raw.status.is_success(),
        status: raw.status.as_u16(),
        status_text: raw.status_text,
        headers: raw.headers,
        data,
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
    use reqwest::StatusCode;
    use serde::Deserialize;
    use serde_json::json;

    use super::{is_structured_content_type, normalize, normalize_lenient, ResponseData};
    use crate::{transport::TransportResponse, FetchError};

    fn raw(status: StatusCode, content_type: &'static str, body: &str) -> TransportResponse {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        TransportResponse::new(status, headers, body.as_bytes().to_vec())
    }

    #[test]
    fn plain_text_is_not_parsed() {
        let response = normalize(raw(StatusCode::OK, "text/plain", "OK")).expect("must normalize");
        assert!(response.ok);
        assert_eq!(response.data, ResponseData::Text("OK".to_owned()));
        assert_eq!(response.text(), Some("OK"));
    }

    #[test]
    fn json_is_decoded_even_for_errors() {
        let response = normalize(raw(
            StatusCode::UNAUTHORIZED,
            "application/json; charset=utf-8",
            r#"{"message":"bad creds"}"#,
        ))
        .expect("must normalize");
        assert!(!response.ok);
        assert_eq!(response.status, 401);
        assert_eq!(response.data, ResponseData::Json(json!({"message": "bad creds"})));
        assert_eq!(response.error_message(), "bad creds");
    }

    #[test]
    fn json_looking_text_stays_text() {
        let response =
            normalize(raw(StatusCode::OK, "text/html", r#"{"id":1}"#)).expect("must normalize");
        assert_eq!(response.data.as_text(), Some(r#"{"id":1}"#));
    }

    #[test]
    fn missing_content_type_is_text() {
        let response =
            normalize(TransportResponse::new(StatusCode::OK, HeaderMap::new(), "[1]")).expect("must normalize");
        assert_eq!(response.data, ResponseData::Text("[1]".to_owned()));
    }

    #[test]
    fn empty_json_body_is_null() {
        let response =
            normalize(raw(StatusCode::NO_CONTENT, "application/json", "")).expect("must normalize");
        assert_eq!(response.data, ResponseData::Json(serde_json::Value::Null));
    }

    #[test]
    fn invalid_json_is_decode_error() {
        let err = normalize(raw(StatusCode::OK, "application/json", "{nope"))
            .expect_err("body is not JSON");
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn lenient_keeps_malformed_error_body_as_text() {
        let response = normalize_lenient(raw(
            StatusCode::BAD_GATEWAY,
            "application/json",
            "<html>bad gateway</html>",
        ));
        assert!(!response.ok);
        assert_eq!(response.status, 502);
        assert_eq!(response.text(), Some("<html>bad gateway</html>"));
        assert_eq!(response.error_message(), "Bad Gateway");

        let parsed = normalize_lenient(raw(StatusCode::NOT_FOUND, "application/json", r#"{"message":"gone"}"#));
        assert_eq!(parsed.data, ResponseData::Json(json!({"message": "gone"})));
    }

    #[test]
    fn structured_types() {
        assert!(is_structured_content_type("application/json"));
        assert!(is_structured_content_type("Application/JSON; charset=utf-8"));
        assert!(is_structured_content_type("application/problem+json"));
        assert!(!is_structured_content_type("text/plain"));
        assert!(!is_structured_content_type(""));
    }

    #[test]
    fn error_message_falls_back() {
        let mut response = normalize(raw(
            StatusCode::INTERNAL_SERVER_ERROR,
            "application/json",
            r#"{"message":""}"#,
        ))
        .expect("must normalize");
        assert_eq!(response.error_message(), "Internal Server Error");

        response.status_text.clear();
        assert_eq!(response.error_message(), "HTTP Error");
    }

    #[test]
    fn typed_json_access() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct User {
            id: u64,
        }

        let response =
            normalize(raw(StatusCode::OK, "application/json", r#"{"id":1}"#)).expect("must normalize");
        assert_eq!(response.json::<User>().expect("must decode"), User { id: 1 });
        assert_eq!(response.header("content-type"), Some("application/json"));
    }
}
