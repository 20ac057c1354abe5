use std::sync::Arc;

use serde_json::Value;

use crate::{
    config::PolicyConfig,
    cookie::parse_cookies,
    decision::PolicyDecision,
    error::Result,
    extract::ExtractedFields,
    policy::evaluate,
    request::EdgeRequest,
};

/// The viewer-request hook.
///
/// `Gatekeeper` is the only entry point the edge runtime needs. It holds the
/// validated policy behind an `Arc`; clones share it, and concurrent calls to
/// [`handle`](Self::handle) touch nothing but their own request.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::{Gatekeeper, PolicyConfig};
/// use serde_json::json;
///
/// let gatekeeper = Gatekeeper::new(PolicyConfig::default()).expect("valid config");
///
/// let response = gatekeeper.handle_event(json!({
///     "uri": "/myProfile",
///     "clientIp": "1.2.3.4",
///     "headers": {
///         "cloudfront-viewer-country": [{"key": "CloudFront-Viewer-Country", "value": "RU"}]
///     }
/// }));
///
/// assert_eq!(response["status"], "302");
/// ```
#[derive(Debug, Clone)]
pub struct Gatekeeper {
    config: Arc<PolicyConfig>,
}

impl Gatekeeper {
    /// Validates `config` and builds a gatekeeper around it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the policy fails
    /// validation.
    pub fn new(config: PolicyConfig) -> Result<Self> {
        Self::from_shared(Arc::new(config))
    }

    /// Builds a gatekeeper around an already shared policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the policy fails
    /// validation.
    pub fn from_shared(config: Arc<PolicyConfig>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the policy in force.
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Decides what happens to one viewer request.
    pub fn handle(&self, request: EdgeRequest) -> PolicyDecision {
        let span = tracing::debug_span!("viewer_request", uri = request.uri());
        let _enter = span.enter();

        if !request.has_expected_shape() {
            tracing::warn!("request does not have the expected attributes");
        }

        let extracted = ExtractedFields::from_request(&request);
        let cookies = parse_cookies(request.headers());

        evaluate(request, &extracted, &cookies, &self.config)
    }

    /// Runs the hook on a raw CDN event and returns the runtime's answer.
    ///
    /// Accepts either the event envelope or a bare request. The result is a
    /// redirect response object or the forwarded request object.
    pub fn handle_event(&self, event: Value) -> Value {
        self.handle(EdgeRequest::from_event(event)).into_response()
    }
}
