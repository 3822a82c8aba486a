//! Ordered request and response transformation chains.
//!
//! A stage sees the current value and returns `Ok(Some(replacement))` to
//! swap it or `Ok(None)` to keep it. Stages run one after another in
//! registration order; the first error stops the chain and fails the call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{BoxError, FetchError, NormalizedResponse, RequestConfig, Result};

#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn intercept(
        &self,
        config: &RequestConfig,
    ) -> std::result::Result<Option<RequestConfig>, BoxError>;
}

#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    async fn intercept(
        &self,
        response: &NormalizedResponse,
    ) -> std::result::Result<Option<NormalizedResponse>, BoxError>;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(&RequestConfig) -> std::result::Result<Option<RequestConfig>, BoxError> + Send + Sync,
{
    async fn intercept(
        &self,
        config: &RequestConfig,
    ) -> std::result::Result<Option<RequestConfig>, BoxError> {
        self(config)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(&NormalizedResponse) -> std::result::Result<Option<NormalizedResponse>, BoxError>
        + Send
        + Sync,
{
    async fn intercept(
        &self,
        response: &NormalizedResponse,
    ) -> std::result::Result<Option<NormalizedResponse>, BoxError> {
        self(response)
    }
}

/// Both interceptor chains of a client.
#[derive(Clone, Default)]
pub struct Interceptors {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
}

impl Interceptors {
    /// Creates empty chains.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage to the request chain.
    pub fn push_request(&mut self, interceptor: Arc<dyn RequestInterceptor>) {
        self.request.push(interceptor);
    }

    /// Appends a stage to the response chain.
    pub fn push_response(&mut self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.response.push(interceptor);
    }

    /// Number of request stages.
    pub fn request_len(&self) -> usize {
        self.request.len()
    }

    /// Number of response stages.
    pub fn response_len(&self) -> usize {
        self.response.len()
    }

    /// Runs the request stages in registration order. `None` from a stage
    /// keeps the previous value; the first failure stops the chain.
    pub async fn apply_request(&self, config: RequestConfig) -> Result<RequestConfig> {
        let mut current = config;
        for stage in &self.request {
            if let Some(replacement) = stage
                .intercept(&current)
                .await
                .map_err(FetchError::Interceptor)?
            {
                current = replacement;
            }
        }
        Ok(current)
    }

    /// Runs the response stages with the same contract as
    /// [`Interceptors::apply_request`].
    pub async fn apply_response(&self, response: NormalizedResponse) -> Result<NormalizedResponse> {
        let mut current = response;
        for stage in &self.response {
            if let Some(replacement) = stage
                .intercept(&current)
                .await
                .map_err(FetchError::Interceptor)?
            {
                current = replacement;
            }
        }
        Ok(current)
    }
}

impl std::fmt::Debug for Interceptors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptors")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .finish()
    }
}
