//! Request URL composition.

/// Returns `true` when `path` already carries an `http` or `https` scheme.
pub fn is_absolute_url(path: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        path.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Resolves `path` against `base_url` and appends `params` as a query string.
///
/// Absolute URLs are used verbatim; anything else is appended to the base URL
/// as-is. Parameters are form-urlencoded in insertion order and joined with
/// `?` or `&` depending on whether a query is already present.
pub fn compose_url(base_url: &str, path: &str, params: &[(String, String)]) -> String {
    let url = if is_absolute_url(path) {
        path.to_owned()
    } else {
        format!("{base_url}{path}")
    };
    append_query(url, params)
}

fn append_query(url: String, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return url;
    }

    let mut serializer = ::url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        serializer.append_pair(key, value);
    }
    let query = serializer.finish();

    let (without_fragment, fragment) = match url.split_once('#') {
        Some((left, right)) => (left, Some(right)),
        None => (url.as_str(), None),
    };
    let joiner = if without_fragment.contains('?') { '&' } else { '?' };

    let mut composed = format!("{without_fragment}{joiner}{query}");
    if let Some(fragment) = fragment {
        composed.push('#');
        composed.push_str(fragment);
    }
    composed
}

#[cfg(test)]
mod tests {
    use super::{compose_url, is_absolute_url};

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn relative_path_is_appended_to_base() {
        assert_eq!(
            compose_url("https://api.test", "/users", &[]),
            "https://api.test/users"
        );
        assert_eq!(compose_url("", "/users", &[]), "/users");
    }

    #[test]
    fn absolute_url_ignores_base() {
        assert_eq!(
            compose_url("https://api.test", "http://other.test/x", &[]),
            "http://other.test/x"
        );
        assert_eq!(
            compose_url("https://api.test", "HTTPS://other.test/x", &[]),
            "HTTPS://other.test/x"
        );
    }

    #[test]
    fn scheme_detection_requires_separator() {
        assert!(is_absolute_url("https://a"));
        assert!(!is_absolute_url("httpbin/get"));
        assert!(!is_absolute_url("/http://nested"));
        assert!(!is_absolute_url("ftp://files.test"));
    }

    #[test]
    fn params_are_encoded_in_insertion_order() {
        let url = compose_url(
            "https://api.test",
            "/search",
            &pairs(&[("q", "a b&c"), ("page", "2"), ("lang", "é")]),
        );
        assert_eq!(url, "https://api.test/search?q=a+b%26c&page=2&lang=%C3%A9");
    }

    #[test]
    fn params_join_existing_query_with_ampersand() {
        let url = compose_url("https://api.test", "/search?q=x", &pairs(&[("page", "2")]));
        assert_eq!(url, "https://api.test/search?q=x&page=2");
    }

    #[test]
    fn params_go_before_fragment() {
        let url = compose_url("", "https://api.test/docs#intro", &pairs(&[("v", "1")]));
        assert_eq!(url, "https://api.test/docs?v=1#intro");
    }

    #[test]
    fn empty_params_leave_url_untouched() {
        assert_eq!(
            compose_url("https://api.test", "/a?b=c", &[]),
            "https://api.test/a?b=c"
        );
    }
}
