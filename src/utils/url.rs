//! URL helpers for consistent endpoint construction
//!
//! Backend base URLs arrive from config or the environment with or without
//! trailing slashes; these helpers keep the joined endpoint URLs free of
//! doubled slashes.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use askdocs::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path into a full request URL.
///
/// # Examples
///
/// ```
/// use askdocs::utils::url::endpoint_url;
///
/// assert_eq!(
///     endpoint_url("http://localhost:8000/", "api/v1/ask"),
///     "http://localhost:8000/api/v1/ask"
/// );
/// ```
pub fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    let base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", base, endpoint)
}
