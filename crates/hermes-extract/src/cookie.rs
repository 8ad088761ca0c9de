//! `Cookie` header parsing.

use http::header::COOKIE;
use http::HeaderMap;
use serde_json::{Map, Value};

/// Cookies sent with a request, in header order.
///
/// # Example
///
/// ```rust
/// use hermes_extract::Cookies;
/// use http::{HeaderMap, HeaderValue};
///
/// let mut headers = HeaderMap::new();
/// headers.insert(http::header::COOKIE, HeaderValue::from_static("sid=abc; theme=\"dark\""));
///
/// let cookies = Cookies::from_headers(&headers);
/// assert_eq!(cookies.get("sid"), Some("abc"));
/// assert_eq!(cookies.get("theme"), Some("dark"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookies {
    pairs: Vec<(String, String)>,
}

impl Cookies {
    /// Parses every `Cookie` header in `headers`.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let pairs = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|cookie| {
                let (name, value) = cookie.trim().split_once('=')?;
                let name = name.trim();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"');
                let value = urlencoding::decode(value)
                    .map_or_else(|_| value.to_string(), |decoded| decoded.into_owned());
                Some((name.to_string(), value))
            })
            .collect();
        Self { pairs }
    }

    /// Value of the first cookie named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if no cookie was sent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Cookies as a JSON object; the first occurrence of a name wins.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (name, value) in &self.pairs {
            map.entry(name.clone())
                .or_insert_with(|| Value::String(value.clone()));
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(values: &[&'static str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for value in values {
            headers.append(COOKIE, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn test_cookies_empty() {
        let cookies = Cookies::from_headers(&HeaderMap::new());
        assert!(cookies.is_empty());
        assert_eq!(cookies.to_json(), serde_json::json!({}));
    }

    #[test]
    fn test_cookies_multiple_headers() {
        let cookies = Cookies::from_headers(&headers(&["a=1; b=2", "c=3"]));
        assert_eq!(cookies.len(), 3);
        assert_eq!(cookies.get("c"), Some("3"));
    }

    #[test]
    fn test_cookies_decoding_and_malformed() {
        let cookies = Cookies::from_headers(&headers(&["name=John%20Doe; broken; =x; ok=1"]));
        assert_eq!(cookies.get("name"), Some("John Doe"));
        assert_eq!(cookies.get("ok"), Some("1"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_cookies_first_wins() {
        let cookies = Cookies::from_headers(&headers(&["id=1; id=2"]));
        assert_eq!(cookies.get("id"), Some("1"));
        assert_eq!(cookies.to_json()["id"], "1");
    }
}
