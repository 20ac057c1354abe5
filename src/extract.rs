use std::fmt;

use serde_json::Value;

use crate::request::EdgeRequest;

/// Header carrying the viewer's two-letter country code.
pub const VIEWER_COUNTRY_HEADER: &str = "cloudfront-viewer-country";
/// Header carrying the viewer's user agent.
pub const USER_AGENT_HEADER: &str = "user-agent";
/// Header carrying the requested host.
pub const HOST_HEADER: &str = "host";

/// Key read inside each header entry.
const HEADER_VALUE_KEY: &str = "value";

static NULL: Value = Value::Null;

/// Where a field lives inside its container.
///
/// Header fields are lists of `{key, value}` entries and are read at
/// `container[name][0][nested_key]`. The origin descriptor is not header
/// shaped and is read at `container["origin"][nested_key]["domainName"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPath<'a> {
    /// A header-shaped field, by lower-cased header name.
    Header(&'a str),
    /// The custom origin's domain name.
    OriginDomain,
}

impl fmt::Display for FieldPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header(name) => write!(f, "{}", name),
            Self::OriginDomain => write!(f, "origin"),
        }
    }
}

/// Error describing why a field could not be extracted.
///
/// These never leave the extractor through [`extract`]: every kind is logged
/// and downgraded to an absent field. [`try_extract`] exposes them for callers
/// that want the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    kind: FieldErrorKind,
    field: String,
}

impl FieldError {
    /// Creates a new field error for the named field.
    pub fn new(kind: FieldErrorKind, field: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
        }
    }

    /// Returns the error kind.
    pub fn kind(&self) -> FieldErrorKind {
        self.kind
    }

    /// Returns the name of the field that failed.
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' is absent ({})", self.field, self.kind)
    }
}

impl std::error::Error for FieldError {}

/// Kind of extraction failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    /// A key is absent at some nesting level.
    Missing,
    /// The value exists but is not a string.
    TypeMismatch,
    /// The value is a string that is blank after trimming.
    Empty,
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "missing"),
            Self::TypeMismatch => write!(f, "type mismatch"),
            Self::Empty => write!(f, "empty value"),
        }
    }
}

/// Looks up a field and validates it, reporting why it is unusable.
///
/// The returned string is the value as stored. Trimming is only used to
/// decide emptiness.
///
/// # Errors
///
/// Returns a [`FieldError`] if any level of the path is missing, the value is
/// not a string, or the value is blank.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::{try_extract, FieldErrorKind, FieldPath};
/// use serde_json::json;
///
/// let headers = json!({"host": [{"key": "Host", "value": "k8s.gokates"}]});
/// assert_eq!(try_extract(&headers, FieldPath::Header("host"), "value"), Ok("k8s.gokates"));
///
/// let err = try_extract(&headers, FieldPath::Header("user-agent"), "value").unwrap_err();
/// assert_eq!(err.kind(), FieldErrorKind::Missing);
/// ```
pub fn try_extract<'v>(
    container: &'v Value,
    path: FieldPath<'_>,
    nested_key: &str,
) -> Result<&'v str, FieldError> {
    let missing = || FieldError::new(FieldErrorKind::Missing, path.to_string());

    let value = match path {
        FieldPath::Header(name) => container
            .get(name)
            .and_then(|entries| entries.get(0))
            .and_then(|entry| entry.get(nested_key)),
        FieldPath::OriginDomain => container
            .get("origin")
            .and_then(|origin| origin.get(nested_key))
            .and_then(|custom| custom.get("domainName")),
    }
    .ok_or_else(missing)?;

    let text = value
        .as_str()
        .ok_or_else(|| FieldError::new(FieldErrorKind::TypeMismatch, path.to_string()))?;

    if text.trim().is_empty() {
        return Err(FieldError::new(FieldErrorKind::Empty, path.to_string()));
    }

    Ok(text)
}

/// Extracts a field, downgrading every failure to `None`.
///
/// Resolution and absence are both traced at debug level. This function
/// never fails.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::{extract, FieldPath};
/// use serde_json::json;
///
/// let headers = json!({"cloudfront-viewer-country": [{"key": "CloudFront-Viewer-Country", "value": 7}]});
/// assert_eq!(extract(&headers, FieldPath::Header("cloudfront-viewer-country"), "value"), None);
/// ```
pub fn extract(container: &Value, path: FieldPath<'_>, nested_key: &str) -> Option<String> {
    match try_extract(container, path, nested_key) {
        Ok(value) => {
            tracing::debug!(field = %path, nested_key, value, "field resolved");
            Some(value.to_string())
        }
        Err(err) => {
            tracing::debug!(field = %path, nested_key, reason = %err.kind(), "field absent");
            None
        }
    }
}

/// The flat view of a request that the policy evaluates.
///
/// Built once per request. Every field the extractor could not validate is
/// `None`, except `user_agent`, which is coerced to an empty string so that
/// substring checks always have an operand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    /// Viewer country code from the edge geo header.
    pub country_code: Option<String>,
    /// Viewer user agent, empty when absent.
    pub user_agent: String,
    /// Host header as received.
    pub host: Option<String>,
    /// Domain name of the custom origin.
    pub domain_name: Option<String>,
    /// Request path.
    pub uri: Option<String>,
    /// Viewer address.
    pub client_ip: Option<String>,
    /// Raw query string.
    pub query_string: Option<String>,
}

impl ExtractedFields {
    /// Extracts every field the policy needs from a request.
    ///
    /// Missing or malformed metadata at any level yields absent fields; this
    /// never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use edge_gatekeeper::{EdgeRequest, ExtractedFields};
    /// use serde_json::json;
    ///
    /// let request = EdgeRequest::new(json!({"uri": "/", "headers": {}}));
    /// let fields = ExtractedFields::from_request(&request);
    ///
    /// assert_eq!(fields.user_agent, "");
    /// assert_eq!(fields.country_code, None);
    /// assert_eq!(fields.uri.as_deref(), Some("/"));
    /// ```
    pub fn from_request(request: &EdgeRequest) -> Self {
        let raw = request.as_value();
        let headers = raw.get("headers").unwrap_or(&NULL);

        let country_code = extract(
            headers,
            FieldPath::Header(VIEWER_COUNTRY_HEADER),
            HEADER_VALUE_KEY,
        );
        let user_agent = extract(headers, FieldPath::Header(USER_AGENT_HEADER), HEADER_VALUE_KEY)
            .unwrap_or_default();
        let host = extract(headers, FieldPath::Header(HOST_HEADER), HEADER_VALUE_KEY);
        let domain_name = extract(raw, FieldPath::OriginDomain, "custom");

        Self {
            country_code,
            user_agent,
            host,
            domain_name,
            uri: request.uri().map(str::to_string),
            client_ip: request.client_ip().map(str::to_string),
            query_string: request.querystring().map(str::to_string),
        }
    }

    /// Reports whether the user agent looks like a mobile browser.
    ///
    /// True for any `iPhone` agent and for agents naming both `Android` and
    /// `Mobile`.
    pub fn source_is_mobile(&self) -> bool {
        let ua = self.user_agent.as_str();
        ua.contains("iPhone") || (ua.contains("Android") && ua.contains("Mobile"))
    }
}
