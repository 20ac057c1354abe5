use crate::{
    config::PolicyConfig,
    cookie::ParsedCookies,
    decision::{PassThrough, PolicyDecision, Redirect},
    extract::ExtractedFields,
    request::EdgeRequest,
};

/// Which blocking conditions hold for a request.
///
/// A request is blocked only when all four hold. Absent data is biased
/// toward letting the request through, except for the country code: a
/// viewer with no country is treated as outside the allowed locations.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::{BlockCheck, EdgeRequest, ExtractedFields, ParsedCookies, PolicyConfig};
/// use serde_json::json;
///
/// let request = EdgeRequest::new(json!({"uri": "/myProfile", "clientIp": "1.2.3.4", "headers": {}}));
/// let fields = ExtractedFields::from_request(&request);
///
/// let check = BlockCheck::assess(&fields, &ParsedCookies::default(), &PolicyConfig::default());
/// assert!(check.sensitive_uri);
/// assert!(check.outside_allowed_geo);
/// assert!(check.should_block());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockCheck {
    /// The path is one of the sensitive URIs.
    pub sensitive_uri: bool,
    /// The viewer country is absent or not allowed.
    pub outside_allowed_geo: bool,
    /// The viewer address is not allow-listed.
    pub untrusted_client_ip: bool,
    /// The session cookie was not sent.
    pub missing_session_cookie: bool,
}

impl BlockCheck {
    /// Evaluates each blocking condition independently.
    pub fn assess(
        extracted: &ExtractedFields,
        cookies: &ParsedCookies,
        config: &PolicyConfig,
    ) -> Self {
        let sensitive_uri = extracted
            .uri
            .as_deref()
            .is_some_and(|uri| config.is_sensitive_uri(uri));

        let outside_allowed_geo = !extracted
            .country_code
            .as_deref()
            .is_some_and(|code| config.is_allowed_geo(code));

        let untrusted_client_ip = extracted
            .client_ip
            .as_deref()
            .is_some_and(|ip| !config.is_allowed_client_ip(ip));

        let missing_session_cookie = !cookies.contains(&config.session_cookie);

        Self {
            sensitive_uri,
            outside_allowed_geo,
            untrusted_client_ip,
            missing_session_cookie,
        }
    }

    /// Returns `true` when every condition holds.
    pub fn should_block(&self) -> bool {
        self.sensitive_uri
            && self.outside_allowed_geo
            && self.untrusted_client_ip
            && self.missing_session_cookie
    }
}

/// Applies the access policy to one request.
///
/// Blocked requests get a `302 Found` redirect to the configured block page.
/// Everything else passes through with `headers.host` overwritten by the
/// origin domain name, even when that name is absent. No other part of the
/// request changes.
///
/// This never fails: by the time it runs, every unusable field has already
/// been reduced to an absent value.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::{evaluate, parse_cookies, EdgeRequest, ExtractedFields, PolicyConfig};
/// use serde_json::json;
///
/// let request = EdgeRequest::new(json!({
///     "uri": "/myProfile",
///     "clientIp": "1.2.3.4",
///     "headers": {
///         "cloudfront-viewer-country": [{"key": "CloudFront-Viewer-Country", "value": "RU"}]
///     }
/// }));
/// let config = PolicyConfig::default();
/// let fields = ExtractedFields::from_request(&request);
/// let cookies = parse_cookies(request.headers());
///
/// let decision = evaluate(request, &fields, &cookies, &config);
/// assert!(decision.is_redirect());
/// ```
pub fn evaluate(
    request: EdgeRequest,
    extracted: &ExtractedFields,
    cookies: &ParsedCookies,
    config: &PolicyConfig,
) -> PolicyDecision {
    let source_is_mobile = extracted.source_is_mobile();
    let check = BlockCheck::assess(extracted, cookies, config);

    tracing::debug!(
        uri = extracted.uri.as_deref(),
        country_code = extracted.country_code.as_deref(),
        client_ip = extracted.client_ip.as_deref(),
        host = extracted.host.as_deref(),
        domain_name = extracted.domain_name.as_deref(),
        source_is_mobile,
        ?check,
        "evaluating request"
    );

    if check.should_block() {
        tracing::info!(
            uri = extracted.uri.as_deref(),
            location = %config.block_page,
            "blocking request"
        );
        return PolicyDecision::Redirect(Redirect::found(config.block_page.as_str()));
    }

    let mut request = request;
    let normalized_host = extracted.domain_name.clone();
    request.set_host(normalized_host.as_deref());

    tracing::info!(
        uri = extracted.uri.as_deref(),
        host = normalized_host.as_deref(),
        "passing request to origin"
    );

    PolicyDecision::PassThrough(PassThrough {
        request,
        normalized_host,
    })
}
