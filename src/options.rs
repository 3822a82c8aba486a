use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};

/// Client-wide configuration: base URL, timeout, retry and default headers.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Prefix joined in front of every relative request path.
    pub base_url: String,
    /// Time budget for each attempt, in milliseconds. Retry waits are not counted.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Fixed delay between retries in milliseconds.
    pub retry_delay_ms: u64,
    /// Headers sent with every request unless overridden per call.
    pub default_headers: HeaderMap,
}

impl Default for ClientOptions {
    fn default() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Self {
            base_url: String::new(),
            timeout_ms: 8_000,
            max_retries: 0,
            retry_delay_ms: 500,
            default_headers,
        }
    }
}

impl ClientOptions {
    /// Reads options from environment variables, falling back to defaults.
    ///
    /// Reads:
    /// - `FETCHER_BASE_URL`
    /// - `FETCHER_TIMEOUT_MS`
    /// - `FETCHER_RETRIES`
    /// - `FETCHER_RETRY_DELAY_MS`
    ///
    /// Returns an error if a numeric variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut options = Self::default();
        if let Some(base_url) = lookup("FETCHER_BASE_URL") {
            options.base_url = base_url.trim().to_owned();
        }
        if let Some(value) = lookup("FETCHER_TIMEOUT_MS") {
            options.timeout_ms = parse_number("FETCHER_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("FETCHER_RETRIES") {
            options.max_retries = parse_number("FETCHER_RETRIES", &value)?;
        }
        if let Some(value) = lookup("FETCHER_RETRY_DELAY_MS") {
            options.retry_delay_ms = parse_number("FETCHER_RETRY_DELAY_MS", &value)?;
        }
        Ok(options)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_retries(mut self, max_retries: usize, retry_delay_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{name} must be a non-negative integer, got '{value}'"))
}
