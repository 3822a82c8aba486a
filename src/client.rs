use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tokio::time::sleep;

use crate::{
    abort::AbortController,
    headers::{merge_headers, normalize_bearer_authorization, TokenProvider},
    interceptor::{Interceptors, RequestInterceptor, ResponseInterceptor},
    response::{normalize, normalize_lenient},
    transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse},
    uri::compose_url,
    AbortCause, Body, ClientOptions, FetchError, NormalizedResponse, RequestConfig,
    RequestOptions, Result, TransportError,
};

/// Receives every error that ends a call with an HTTP, abort, decode or
/// exhausted network failure, right before it is returned to the caller.
pub trait ErrorObserver: Send + Sync {
    fn on_error(&self, error: &FetchError);
}

impl<F> ErrorObserver for F
where
    F: Fn(&FetchError) + Send + Sync,
{
    fn on_error(&self, error: &FetchError) {
        self(error)
    }
}

#[derive(Clone)]
/// HTTP client running every call through interceptors, a timeout and retries.
pub struct FetchClient {
    transport: Arc<dyn Transport>,
    options: ClientOptions,
    token: Option<TokenProvider>,
    interceptors: Interceptors,
    on_error: Option<Arc<dyn ErrorObserver>>,
}

impl fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchClient")
            .field("options", &self.options)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("interceptors", &self.interceptors)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

/// Process-wide client built once from [`ClientOptions::default`].
///
/// Like any [`FetchClient`] it is read-only after construction; build a
/// dedicated client when different options are needed.
pub fn default_client() -> &'static FetchClient {
    static DEFAULT: OnceLock<FetchClient> = OnceLock::new();
    DEFAULT.get_or_init(FetchClient::default)
}

impl FetchClient {
    /// Creates a client sending through a fresh `reqwest::Client`.
    pub fn new(options: ClientOptions) -> Self {
        Self {
            transport: Arc::new(ReqwestTransport::default()),
            options,
            token: None,
            interceptors: Interceptors::new(),
            on_error: None,
        }
    }

    /// Creates a client from `FETCHER_*` environment variables.
    ///
    /// See [`ClientOptions::from_env`] for the variables read.
    pub fn from_env() -> std::result::Result<Self, String> {
        ClientOptions::from_env().map(Self::new)
    }

    /// Returns the options this client was built with.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Replaces the client options.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the network transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Sets the function queried for the `Authorization` value on every attempt.
    ///
    /// The returned value is sent verbatim. `None` or an empty string sends
    /// no token.
    pub fn with_token_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.token = Some(Arc::new(provider));
        self
    }

    /// Like [`FetchClient::with_token_provider`], adding the `Bearer ` prefix
    /// when the token lacks it.
    pub fn with_bearer_token_provider<F>(self, provider: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        self.with_token_provider(move || {
            provider()
                .filter(|token| !token.trim().is_empty())
                .map(|token| normalize_bearer_authorization(&token))
        })
    }

    /// Appends a stage to the request-interceptor chain.
    pub fn with_request_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: RequestInterceptor + 'static,
    {
        self.interceptors.push_request(Arc::new(interceptor));
        self
    }

    /// Appends a stage to the response-interceptor chain.
    pub fn with_response_interceptor<I>(mut self, interceptor: I) -> Self
    where
        I: ResponseInterceptor + 'static,
    {
        self.interceptors.push_response(Arc::new(interceptor));
        self
    }

    /// Sets the hook told about failed calls. Panics inside it are caught.
    pub fn with_error_observer<O>(mut self, observer: O) -> Self
    where
        O: ErrorObserver + 'static,
    {
        self.on_error = Some(Arc::new(observer));
        self
    }

    /// Sends a `GET` request.
    pub async fn get(&self, url: &str, options: RequestOptions) -> Result<NormalizedResponse> {
        self.request(Method::GET, url, options).await
    }

    /// Sends a `POST` request.
    pub async fn post(&self, url: &str, options: RequestOptions) -> Result<NormalizedResponse> {
        self.request(Method::POST, url, options).await
    }

    /// Sends a `PUT` request.
    pub async fn put(&self, url: &str, options: RequestOptions) -> Result<NormalizedResponse> {
        self.request(Method::PUT, url, options).await
    }

    /// Sends a `DELETE` request.
    pub async fn delete(&self, url: &str, options: RequestOptions) -> Result<NormalizedResponse> {
        self.request(Method::DELETE, url, options).await
    }

    /// Runs one call through the full pipeline.
    ///
    /// Request interceptors run once; URL, params and body are then fixed.
    /// Headers and the token are rebuilt for every attempt, and every attempt
    /// gets its own timeout. Only transport failures are retried; HTTP error
    /// statuses, aborts and interceptor failures end the call immediately.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        options: RequestOptions,
    ) -> Result<NormalizedResponse> {
        let config = self
            .interceptors
            .apply_request(RequestConfig::new(method, url, options))
            .await?;
        let RequestConfig {
            method,
            url,
            options,
        } = config;

        let full_url = compose_url(&self.options.base_url, &url, &options.params);
        let body = options.body.as_ref().map(Body::to_bytes).transpose()?;
        let json_body = options.body.as_ref().is_some_and(Body::is_json);

        let controller = AbortController::start(
            Duration::from_millis(self.options.timeout_ms),
            options.signal.clone(),
        );
        let mut attempt = 0usize;
        loop {
            let token = self.token.as_ref().and_then(|provider| provider());
            let mut headers =
                merge_headers(&self.options.default_headers, &options.headers, token.as_deref())?;
            if json_body && !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            let request = TransportRequest {
                method: method.clone(),
                url: full_url.clone(),
                headers,
                body: body.clone(),
            };

            #[cfg(feature = "tracing")]
            tracing::debug!(method = %request.method, url = %request.url, attempt, "sending request");

            let outcome = controller.run(self.transport.send(request)).await;
            match outcome {
                Ok(Ok(raw)) => return self.settle(raw).await,
                Ok(Err(err)) if err.is_abort() => {
                    return Err(self.fail(FetchError::Aborted {
                        cause: AbortCause::Transport(err),
                    }));
                }
                Ok(Err(err)) => {
                    if err.is_retryable() && attempt < self.options.max_retries {
                        attempt += 1;
                        if let Err(cause) = controller.guard(self.wait_before_retry(&err)).await {
                            return Err(self.fail(FetchError::Aborted { cause }));
                        }
                        continue;
                    }
                    return Err(self.fail(FetchError::Network(err)));
                }
                Err(cause) => return Err(self.fail(FetchError::Aborted { cause })),
            }
        }
    }

    async fn settle(&self, raw: TransportResponse) -> Result<NormalizedResponse> {
        let ok = raw.is_success();
        let status = raw.status.as_u16();
        let normalized = if ok {
            normalize(raw).map_err(|err| self.fail(err))?
        } else {
            normalize_lenient(raw)
        };
        let response = self.interceptors.apply_response(normalized).await?;
        if ok {
            return Ok(response);
        }

        Err(self.fail(FetchError::Http {
            message: response.error_message(),
            status,
            response: Box::new(response),
        }))
    }

    /// Reports `error` to the observer and hands it back for returning.
    fn fail(&self, error: FetchError) -> FetchError {
        #[cfg(feature = "tracing")]
        if error.is_aborted() {
            tracing::warn!(error = %error, "request aborted");
        }

        if let Some(observer) = &self.on_error {
            if catch_unwind(AssertUnwindSafe(|| observer.on_error(&error))).is_err() {
                #[cfg(feature = "tracing")]
                tracing::warn!("error observer panicked; returning the error");
            }
        }
        error
    }

    /// Waits the fixed retry delay before the next attempt.
    async fn wait_before_retry(&self, _cause: &TransportError) {
        let delay_ms = self.options.retry_delay_ms;

        #[cfg(feature = "tracing")]
        tracing::debug!(error = %_cause, "retrying request after {} ms", delay_ms);

        sleep(Duration::from_millis(delay_ms)).await;
    }
}
