//! URL utilities for consistent URL handling
//!
//! The backend address is user-entered (`host:port` most of the time), so
//! everything that talks to it goes through these helpers.

use reqwest::Url;

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use labchat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:6006"), "http://localhost:6006");
/// assert_eq!(normalize_base_url("http://localhost:6006///"), "http://localhost:6006");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Turn a server address into a base URL, defaulting to plain HTTP when no
/// scheme was given.
///
/// # Examples
///
/// ```
/// use labchat::utils::url::base_url_from_address;
///
/// assert_eq!(base_url_from_address("localhost:6006"), "http://localhost:6006");
/// assert_eq!(base_url_from_address("https://lab.example.org/"), "https://lab.example.org");
/// ```
pub fn base_url_from_address(address: &str) -> String {
    let address = address.trim();
    if address.contains("://") {
        normalize_base_url(address)
    } else {
        normalize_base_url(&format!("http://{address}"))
    }
}

/// Append path segments to `base_url`, percent-encoding each one so that a
/// segment containing `/` stays a single segment.
///
/// # Examples
///
/// ```
/// use labchat::utils::url::construct_api_url;
///
/// let url = construct_api_url("http://localhost:6006", &["users", "bob", "files", "papers/a b.pdf"])
///     .unwrap();
/// assert_eq!(url.as_str(), "http://localhost:6006/users/bob/files/papers%2Fa%20b.pdf");
/// ```
pub fn construct_api_url(base_url: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(&normalize_base_url(base_url))
        .map_err(|err| format!("invalid server address '{base_url}': {err}"))?;
    {
        let mut path = url
            .path_segments_mut()
            .map_err(|()| format!("server address '{base_url}' cannot carry a path"))?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}
