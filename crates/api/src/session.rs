//! Session token carried in the `assetline_session` cookie.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;

pub const SESSION_COOKIE: &str = "assetline_session";

/// Session token presented by the client, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Mint a fresh session token.
pub fn new_session_token() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// `Set-Cookie` value handing `token` to the client.
pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; assetline_session=abc-123; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc-123"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("assetline_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn minted_tokens_are_unique() {
        assert_ne!(new_session_token(), new_session_token());
        assert!(session_cookie("t").starts_with("assetline_session=t;"));
    }
}
