//! URL helpers for endpoint and tool server addresses.

/// Strip trailing slashes so endpoints can be appended without doubling them.
///
/// ```
/// use todochat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://todo.example.com/"), "https://todo.example.com");
/// assert_eq!(normalize_base_url("https://api.openai.com/v1///"), "https://api.openai.com/v1");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use todochat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://api.openai.com/v1/", "/responses"),
///     "https://api.openai.com/v1/responses"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Append `suffix` unless the normalized URL already ends with it.
pub fn append_path_once(base_url: &str, suffix: &str) -> String {
    let normalized = normalize_base_url(base_url);
    let suffix = format!("/{}", suffix.trim_matches('/'));
    if normalized.ends_with(&suffix) {
        normalized
    } else {
        format!("{normalized}{suffix}")
    }
}
