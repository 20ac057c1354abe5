use serde_json::{json, Map, Value};

use crate::error::Result;

/// Top-level attributes a well-formed CDN viewer request carries.
const EXPECTED_ATTRIBUTES: [&str; 7] = [
    "body",
    "clientIp",
    "headers",
    "method",
    "origin",
    "querystring",
    "uri",
];

/// A viewer request as delivered by the CDN edge runtime.
///
/// The request is kept as raw JSON so that missing or malformed nesting can be
/// inspected without failing deserialization, and so that a pass-through
/// decision forwards the *same* object the runtime handed in.
///
/// Headers follow the edge convention: each lower-cased header name maps to a
/// list of `{"key", "value"}` entries, of which only the first is used.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::EdgeRequest;
///
/// let request = EdgeRequest::from_json(
///     r#"{"uri": "/myProfile", "clientIp": "1.2.3.4", "headers": {}}"#,
/// )
/// .expect("valid JSON");
///
/// assert_eq!(request.uri(), Some("/myProfile"));
/// assert_eq!(request.client_ip(), Some("1.2.3.4"));
/// assert_eq!(request.querystring(), None);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRequest {
    raw: Value,
}

impl EdgeRequest {
    /// Wraps an already-decoded request value.
    ///
    /// Any JSON value is accepted. A value that is not an object simply has
    /// no fields.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Decodes a request from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if `text` is not valid JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    /// Extracts the request from a CDN viewer-request event.
    ///
    /// Live events wrap the request as `Records[0].cf.request`. Offline
    /// fixtures pass the bare request, so anything without that envelope is
    /// taken as the request itself.
    pub fn from_event(event: Value) -> Self {
        let is_envelope = event
            .pointer("/Records/0/cf/request")
            .is_some_and(Value::is_object);

        if is_envelope {
            let mut event = event;
            let request = event
                .pointer_mut("/Records/0/cf/request")
                .map(Value::take)
                .unwrap_or(Value::Null);
            Self::new(request)
        } else {
            Self::new(event)
        }
    }

    /// Returns the raw request value.
    pub fn as_value(&self) -> &Value {
        &self.raw
    }

    /// Consumes the request, returning the raw value.
    pub fn into_value(self) -> Value {
        self.raw
    }

    /// Request path, if present and a string.
    pub fn uri(&self) -> Option<&str> {
        self.str_attr("uri")
    }

    /// Viewer address as reported by the edge, if present and a string.
    pub fn client_ip(&self) -> Option<&str> {
        self.str_attr("clientIp")
    }

    /// Raw query string, if present and a string.
    pub fn querystring(&self) -> Option<&str> {
        self.str_attr("querystring")
    }

    /// Header mapping, if present and an object.
    pub fn headers(&self) -> Option<&Map<String, Value>> {
        self.raw.get("headers").and_then(Value::as_object)
    }

    /// Reports whether the request carries exactly the expected top-level
    /// attributes.
    ///
    /// This is a diagnostic only. Requests of any shape are still evaluated.
    pub fn has_expected_shape(&self) -> bool {
        match self.raw.as_object() {
            Some(map) => {
                map.len() == EXPECTED_ATTRIBUTES.len()
                    && EXPECTED_ATTRIBUTES.iter().all(|k| map.contains_key(*k))
            }
            None => false,
        }
    }

    /// Replaces `headers.host` with a single entry naming `host`.
    ///
    /// The overwrite is unconditional: an absent host is written as `null`.
    /// A missing or non-object `headers` attribute is replaced by a mapping
    /// holding only the host entry. Non-object requests are left untouched.
    pub(crate) fn set_host(&mut self, host: Option<&str>) {
        let Some(request) = self.raw.as_object_mut() else {
            return;
        };

        let entry = json!([{ "key": "host", "value": host }]);
        match request.get_mut("headers").and_then(Value::as_object_mut) {
            Some(headers) => {
                headers.insert("host".to_string(), entry);
            }
            None => {
                let mut headers = Map::new();
                headers.insert("host".to_string(), entry);
                request.insert("headers".to_string(), Value::Object(headers));
            }
        }
    }

    fn str_attr(&self, name: &str) -> Option<&str> {
        self.raw.get(name).and_then(Value::as_str)
    }
}

impl From<Value> for EdgeRequest {
    fn from(raw: Value) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_request() -> Value {
        json!({
            "body": {"action": "read-only", "data": "", "encoding": "base64", "inputTruncated": false},
            "clientIp": "34.116.22.33",
            "headers": {
                "host": [{"key": "Host", "value": "k8s.gokates"}],
                "user-agent": [{"key": "User-Agent", "value": "curl/8.0"}]
            },
            "method": "GET",
            "origin": {"custom": {"domainName": "gokates-io.s3.amazonaws.com"}},
            "querystring": "a=1",
            "uri": "/index.html"
        })
    }

    #[test]
    fn accessors_read_string_attributes() {
        let request = EdgeRequest::new(full_request());

        assert_eq!(request.uri(), Some("/index.html"));
        assert_eq!(request.client_ip(), Some("34.116.22.33"));
        assert_eq!(request.querystring(), Some("a=1"));
        assert!(request.headers().is_some());
    }

    #[test]
    fn accessors_reject_non_strings() {
        let request = EdgeRequest::new(json!({"uri": 42, "clientIp": null, "headers": []}));

        assert_eq!(request.uri(), None);
        assert_eq!(request.client_ip(), None);
        assert!(request.headers().is_none());
    }

    #[test]
    fn non_object_request_has_no_fields() {
        let request = EdgeRequest::new(json!("just a string"));

        assert_eq!(request.uri(), None);
        assert!(!request.has_expected_shape());
    }

    #[test]
    fn from_json_rejects_invalid_text() {
        assert!(EdgeRequest::from_json("{\"uri\": ").is_err());
    }

    #[test]
    fn expected_shape_requires_all_seven_attributes() {
        let request = EdgeRequest::new(full_request());
        assert!(request.has_expected_shape());

        let mut partial = full_request();
        partial.as_object_mut().unwrap().remove("body");
        assert!(!EdgeRequest::new(partial).has_expected_shape());

        let mut extra = full_request();
        extra
            .as_object_mut()
            .unwrap()
            .insert("extra".to_string(), json!(1));
        assert!(!EdgeRequest::new(extra).has_expected_shape());
    }

    #[test]
    fn from_event_unwraps_envelope() {
        let event = json!({"Records": [{"cf": {"request": full_request()}}]});
        let request = EdgeRequest::from_event(event);

        assert_eq!(request.uri(), Some("/index.html"));
        assert!(request.has_expected_shape());
    }

    #[test]
    fn from_event_accepts_bare_request() {
        let request = EdgeRequest::from_event(full_request());
        assert_eq!(request.as_value(), &full_request());
    }

    #[test]
    fn set_host_replaces_only_host_header() {
        let mut request = EdgeRequest::new(full_request());
        request.set_host(Some("gokates-io.s3.amazonaws.com"));

        let mut expected = full_request();
        expected["headers"]["host"] = json!([{"key": "host", "value": "gokates-io.s3.amazonaws.com"}]);
        assert_eq!(request.into_value(), expected);
    }

    #[test]
    fn set_host_writes_null_when_absent() {
        let mut request = EdgeRequest::new(full_request());
        request.set_host(None);

        assert_eq!(
            request.as_value()["headers"]["host"],
            json!([{"key": "host", "value": null}])
        );
    }

    #[test]
    fn set_host_creates_missing_headers() {
        let mut request = EdgeRequest::new(json!({"uri": "/"}));
        request.set_host(Some("origin.example"));

        assert_eq!(
            request.as_value()["headers"],
            json!({"host": [{"key": "host", "value": "origin.example"}]})
        );
    }

    #[test]
    fn set_host_ignores_non_object_request() {
        let mut request = EdgeRequest::new(json!([1, 2, 3]));
        request.set_host(Some("origin.example"));
        assert_eq!(request.into_value(), json!([1, 2, 3]));
    }
}
