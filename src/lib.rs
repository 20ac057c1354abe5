//! Viewer-request gatekeeper for CDN edge hooks.
//!
//! For every incoming viewer request this crate decides, synchronously and
//! before the origin is contacted, whether to forward the request or answer it
//! with a redirect to a block page. The access rule combines:
//! - **Path sensitivity**: only listed URIs are ever blocked
//! - **Geographic origin**: viewers from allowed countries pass
//! - **Client address**: allow-listed IPs pass
//! - **Session cookie**: viewers presenting the session cookie pass
//!
//! # Core Types
//!
//! - [`Gatekeeper`]: The hook itself, holding the shared [`PolicyConfig`]
//! - [`EdgeRequest`]: The raw viewer request as delivered by the edge
//! - [`ExtractedFields`]: The flat, validated view the rule is evaluated on
//! - [`ParsedCookies`]: Cookies sent with the request
//! - [`PolicyDecision`]: Either a [`Redirect`] or a [`PassThrough`]
//!
//! Malformed request metadata never aborts an evaluation. Each unusable field
//! is logged and treated as absent; see [`FieldErrorKind`] for the cases.
//!
//! # Examples
//!
//! ```
//! use edge_gatekeeper::{EdgeRequest, Gatekeeper, PolicyConfig, PolicyDecision};
//! use serde_json::json;
//!
//! let gatekeeper = Gatekeeper::new(PolicyConfig::default()).expect("valid config");
//!
//! let request = EdgeRequest::new(json!({
//!     "uri": "/index.html",
//!     "clientIp": "34.116.22.33",
//!     "headers": {"host": [{"key": "Host", "value": "k8s.gokates"}]},
//!     "origin": {"custom": {"domainName": "gokates-io.s3.amazonaws.com"}}
//! }));
//!
//! match gatekeeper.handle(request) {
//!     PolicyDecision::PassThrough(pass) => {
//!         assert_eq!(pass.normalized_host.as_deref(), Some("gokates-io.s3.amazonaws.com"));
//!     }
//!     PolicyDecision::Redirect(_) => unreachable!("/index.html is not sensitive"),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod cookie;
mod decision;
mod error;
mod extract;
mod gatekeeper;
mod policy;
mod request;

pub use config::PolicyConfig;
pub use cookie::{parse_cookies, ParsedCookies, COOKIE_HEADER};
pub use decision::{PassThrough, PolicyDecision, Redirect};
pub use error::{Error, Result};
pub use extract::{
    extract, try_extract, ExtractedFields, FieldError, FieldErrorKind, FieldPath, HOST_HEADER,
    USER_AGENT_HEADER, VIEWER_COUNTRY_HEADER,
};
pub use gatekeeper::Gatekeeper;
pub use policy::{evaluate, BlockCheck};
pub use request::EdgeRequest;
