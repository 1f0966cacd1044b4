//! Joining the configured service address with API paths.

/// Strips trailing slashes so joined paths never contain `//`.
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Joins a service base URL with an API path such as `api/chat/invoke`.
///
/// ```
/// use chatterm::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/api/user"),
///     "http://localhost:8000/api/user"
/// );
/// ```
pub fn construct_api_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        normalize_base_url(base_url),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_and_leading_slashes_collapse() {
        assert_eq!(
            construct_api_url("http://localhost:8000///", "api/chats/c1"),
            "http://localhost:8000/api/chats/c1"
        );
        assert_eq!(
            construct_api_url("https://chat.example.com/prefix", "/api/config"),
            "https://chat.example.com/prefix/api/config"
        );
    }

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            normalize_base_url("  http://localhost:8000/ \n"),
            "http://localhost:8000"
        );
    }
}
