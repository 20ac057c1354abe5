use std::collections::HashMap;

use serde_json::{Map, Value};

/// Header holding the viewer's cookies.
pub const COOKIE_HEADER: &str = "cookie";

/// Cookies sent with a single request, by name.
///
/// Built fresh for each request and dropped once the decision is made.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::parse_cookies;
/// use serde_json::json;
///
/// let headers = json!({"cookie": [{"key": "Cookie", "value": "A=1; B=2;C=3"}]});
/// let cookies = parse_cookies(headers.as_object());
///
/// assert_eq!(cookies.len(), 3);
/// assert_eq!(cookies.get("B"), Some("2"));
/// assert!(cookies.contains("C"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCookies {
    cookies: HashMap<String, String>,
}

impl ParsedCookies {
    /// Reports whether a cookie with this name was sent, whatever its value.
    pub fn contains(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// Returns the value of the named cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Number of distinct cookie names.
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns `true` if no cookies were parsed.
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Iterates over `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cookies.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parses the `cookie` header out of a request's header mapping.
///
/// Only the first `cookie` entry is read. Its value is split on `;`, then each
/// segment is split once on the first `=`, and both sides are trimmed. A name
/// sent twice keeps its last value.
///
/// Nothing here fails. An absent or malformed `cookie` header gives an empty
/// result. Segments that are blank, have no `=`, or have an empty name are
/// skipped.
pub fn parse_cookies(headers: Option<&Map<String, Value>>) -> ParsedCookies {
    let mut parsed = ParsedCookies::default();

    let Some(raw) = headers
        .and_then(|h| h.get(COOKIE_HEADER))
        .and_then(|entries| entries.get(0))
        .and_then(|entry| entry.get("value"))
        .and_then(Value::as_str)
    else {
        return parsed;
    };

    for segment in raw.split(';') {
        if segment.trim().is_empty() {
            continue;
        }

        let Some((name, value)) = segment.split_once('=') else {
            tracing::debug!(segment, "skipping cookie segment without '='");
            continue;
        };

        let name = name.trim();
        if name.is_empty() {
            tracing::debug!("skipping cookie segment with empty name");
            continue;
        }

        parsed
            .cookies
            .insert(name.to_string(), value.trim().to_string());
    }

    parsed
}
