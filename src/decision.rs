use serde_json::{json, Value};

use crate::request::EdgeRequest;

/// Outcome of evaluating one viewer request.
///
/// There are exactly two outcomes: short-circuit the request with a redirect
/// to the block page, or forward it to the origin.
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyDecision {
    /// Answer the viewer with a redirect; the origin never sees the request.
    Redirect(Redirect),
    /// Forward the request to the origin.
    PassThrough(PassThrough),
}

impl PolicyDecision {
    /// Returns `true` for a redirect decision.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// Converts the decision into the value handed back to the edge runtime.
    ///
    /// A redirect becomes a response object; a pass-through becomes the
    /// forwarded request object.
    pub fn into_response(self) -> Value {
        match self {
            Self::Redirect(redirect) => redirect.to_response(),
            Self::PassThrough(pass) => pass.into_request(),
        }
    }
}

/// A redirect response pointing the viewer at the block page.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::Redirect;
/// use serde_json::json;
///
/// let redirect = Redirect::found("https://block.gokates.io");
/// assert_eq!(
///     redirect.to_response(),
///     json!({
///         "status": "302",
///         "statusDescription": "Found",
///         "headers": {"location": [{"key": "Location", "value": "https://block.gokates.io"}]}
///     })
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// HTTP status code.
    pub status: u16,
    /// Reason phrase sent with the status.
    pub status_description: &'static str,
    /// Redirect target.
    pub location: String,
}

impl Redirect {
    /// Creates a `302 Found` redirect to `location`.
    pub fn found(location: impl Into<String>) -> Self {
        Self {
            status: 302,
            status_description: "Found",
            location: location.into(),
        }
    }

    /// Renders the edge response object.
    ///
    /// The status is a string and the only header is `Location`.
    pub fn to_response(&self) -> Value {
        json!({
            "status": self.status.to_string(),
            "statusDescription": self.status_description,
            "headers": {
                "location": [{ "key": "Location", "value": self.location }],
            },
        })
    }
}

/// A request cleared for forwarding to the origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PassThrough {
    /// The forwarded request, with its host header normalized.
    pub request: EdgeRequest,
    /// Host written into `headers.host`, `None` when the origin domain was
    /// absent.
    pub normalized_host: Option<String>,
}

impl PassThrough {
    /// Returns the forwarded request object.
    pub fn into_request(self) -> Value {
        self.request.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_response_shape() {
        let response = Redirect::found("https://block.gokates.io").to_response();

        assert_eq!(response["status"], "302");
        assert_eq!(response["statusDescription"], "Found");
        let headers = response["headers"].as_object().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(
            headers["location"],
            json!([{"key": "Location", "value": "https://block.gokates.io"}])
        );
    }

    #[test]
    fn redirect_decision_into_response() {
        let decision = PolicyDecision::Redirect(Redirect::found("https://block.example"));
        assert!(decision.is_redirect());
        assert_eq!(decision.into_response()["status"], "302");
    }

    #[test]
    fn pass_through_into_response_is_request() {
        let request = EdgeRequest::new(json!({"uri": "/index.html"}));
        let decision = PolicyDecision::PassThrough(PassThrough {
            request: request.clone(),
            normalized_host: None,
        });

        assert!(!decision.is_redirect());
        assert_eq!(decision.into_response(), request.into_value());
    }
}
