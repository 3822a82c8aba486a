use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

use crate::{FetchError, Result};

/// Supplies the `Authorization` value; called on every attempt.
pub type TokenProvider = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// Merges client defaults, per-call overrides and an optional token.
///
/// A key present in `overrides` replaces every default value for that key.
/// A non-empty `token` is set as `Authorization` and wins over both.
pub fn merge_headers(
    defaults: &HeaderMap,
    overrides: &HeaderMap,
    token: Option<&str>,
) -> Result<HeaderMap> {
    let mut merged = defaults.clone();
    for name in overrides.keys() {
        merged.remove(name);
    }
    for (name, value) in overrides {
        merged.append(name.clone(), value.clone());
    }

    if let Some(token) = token.filter(|token| !token.is_empty()) {
        let mut value = HeaderValue::from_str(token).map_err(|_| {
            FetchError::InvalidRequest("token is not a valid Authorization header value".to_owned())
        })?;
        value.set_sensitive(true);
        merged.insert(AUTHORIZATION, value);
    }

    Ok(merged)
}

/// Prefixes `Bearer ` unless the token already carries it.
pub(crate) fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
