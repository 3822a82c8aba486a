//! `fetcher-http` is an async HTTP request client with a configurable
//! execution pipeline.
//!
//! Every call made through [`FetchClient`] goes through the same steps:
//! - request interceptors may replace the [`RequestConfig`]
//! - the URL is resolved against the base URL and the query appended
//! - default headers, per-call headers and a fresh token are merged
//! - the transport is called under a timeout and the caller's signal
//! - transport failures are retried with a fixed delay
//! - the body is decoded by content type and response interceptors run
//!
//! ```no_run
//! use fetcher_http::{ClientOptions, FetchClient, RequestOptions};
//!
//! # async fn run() -> fetcher_http::Result<()> {
//! let client = FetchClient::new(
//!     ClientOptions::default()
//!         .with_base_url("https://api.example.com")
//!         .with_retries(2, 100),
//! )
//! .with_bearer_token_provider(|| std::env::var("API_TOKEN").ok());
//!
//! let users = client
//!     .get("/users", RequestOptions::new().param("page", "1"))
//!     .await?;
//! println!("{} {:?}", users.status, users.data);
//! # Ok(())
//! # }
//! ```

mod abort;
mod client;
mod error;
mod headers;
mod interceptor;
mod options;
mod request;
mod response;
pub mod transport;
mod uri;

pub use client::{default_client, ErrorObserver, FetchClient};
pub use error::{AbortCause, BoxError, FetchError, TransportError, TransportErrorKind, ABORT_MESSAGE};
pub use headers::{merge_headers, TokenProvider};
pub use interceptor::{Interceptors, RequestInterceptor, ResponseInterceptor};
pub use options::ClientOptions;
pub use request::{Body, RequestConfig, RequestOptions};
pub use response::{is_structured_content_type, normalize, NormalizedResponse, ResponseData};
pub use transport::{ReqwestTransport, Transport};
pub use uri::{compose_url, is_absolute_url};

pub use reqwest::{header, Method, StatusCode};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, FetchError>;
