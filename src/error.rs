use std::fmt;
use std::time::Duration;

use crate::NormalizedResponse;

/// Boxed error type used for failures raised by user-supplied stages.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Message carried by every [`FetchError::Aborted`].
pub const ABORT_MESSAGE: &str = "Request timed out or aborted";

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Server answered with a non-success status. Never retried.
    #[error("{message}")]
    Http {
        /// Message from the JSON body, the status text, or `"HTTP Error"`.
        message: String,
        /// Numeric HTTP status code.
        status: u16,
        /// Normalized response after the response-interceptor chain.
        response: Box<NormalizedResponse>,
    },
    /// Call cancelled by its timeout or by the caller's signal. Never retried.
    #[error("Request timed out or aborted")]
    Aborted {
        #[source]
        cause: AbortCause,
    },
    /// Transport failure before any response, after retries were exhausted.
    #[error("network error: {0}")]
    Network(TransportError),
    /// A request or response interceptor failed.
    #[error("interceptor error: {0}")]
    Interceptor(BoxError),
    /// A structured success body could not be decoded. Error statuses keep
    /// such a body as text inside [`FetchError::Http`].
    #[error("decode error: {0}")]
    Decode(String),
    /// The request could not be assembled (bad header value, unencodable body).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// HTTP status, present only for [`FetchError::Http`].
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Attached response, present only for [`FetchError::Http`].
    pub fn response(&self) -> Option<&NormalizedResponse> {
        match self {
            Self::Http { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Underlying cancellation cause, present only for [`FetchError::Aborted`].
    pub fn cause(&self) -> Option<&AbortCause> {
        match self {
            Self::Aborted { cause } => Some(cause),
            _ => None,
        }
    }

    /// `true` when the call took the abort path.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted { .. })
    }
}

/// Why a call took the abort path.
#[derive(Debug, thiserror::Error)]
pub enum AbortCause {
    #[error("timeout of {}ms elapsed", .0.as_millis())]
    Timeout(Duration),
    #[error("request cancelled by caller signal")]
    Signal,
    /// The transport itself reported a timeout or cancellation.
    #[error(transparent)]
    Transport(TransportError),
}

/// Coarse classification of a [`TransportError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Aborted,
    Body,
    /// The request was malformed before it reached the network.
    Request,
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Aborted => "aborted",
            Self::Body => "body",
            Self::Request => "request",
            Self::Other => "other",
        };
        f.write_str(text)
    }
}

/// Failure reported by a [`Transport`](crate::Transport).
#[derive(Debug, thiserror::Error)]
#[error("{kind} failure: {source}")]
pub struct TransportError {
    kind: TransportErrorKind,
    #[source]
    source: BoxError,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn connect(source: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Connect, source)
    }

    pub fn timeout(source: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Timeout, source)
    }

    pub fn aborted(source: impl Into<BoxError>) -> Self {
        Self::new(TransportErrorKind::Aborted, source)
    }

    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Timeout and cancellation failures take the abort path.
    pub fn is_abort(&self) -> bool {
        matches!(
            self.kind,
            TransportErrorKind::Timeout | TransportErrorKind::Aborted
        )
    }

    /// Malformed requests fail the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        !self.is_abort() && self.kind != TransportErrorKind::Request
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_builder() {
            TransportErrorKind::Request
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err)
    }
}
