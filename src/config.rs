use std::fs;
use std::net::IpAddr;
use std::path::Path;

use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};

/// The static access policy, fixed at deployment time.
///
/// A `PolicyConfig` is built and validated once at startup, then shared
/// read-only (typically behind an `Arc`) by every evaluation. Nothing mutates
/// it afterwards.
///
/// # Examples
///
/// ```
/// use edge_gatekeeper::PolicyConfig;
///
/// let config = PolicyConfig::from_toml_str(r#"
///     allowed_geo_locations = ["UK", "SG"]
///     sensitive_uris = ["/myProfile"]
///     allowed_client_ips = ["125.132.32.23"]
///     session_cookie = "ALOW_MY_SESSION"
///     block_page = "https://block.gokates.io"
/// "#).expect("valid config");
///
/// assert!(config.is_sensitive_uri("/myProfile"));
/// assert!(!config.is_sensitive_uri("/myprofile"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    /// Viewer country codes exempt from blocking.
    pub allowed_geo_locations: Vec<String>,
    /// Paths the policy applies to. Matched exactly and case-sensitively.
    pub sensitive_uris: Vec<String>,
    /// Viewer addresses exempt from blocking. Matched as exact strings.
    pub allowed_client_ips: Vec<String>,
    /// Name of the cookie whose presence marks a valid session.
    pub session_cookie: String,
    /// Redirect target for blocked requests.
    pub block_page: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allowed_geo_locations: vec!["UK".to_string(), "SG".to_string()],
            sensitive_uris: vec![
                "/myPersonalData".to_string(),
                "/myProfile".to_string(),
                "/purchase-history".to_string(),
            ],
            allowed_client_ips: vec![
                "125.132.32.23".to_string(),
                "221.56.36.88".to_string(),
                "232.121.56.79".to_string(),
            ],
            session_cookie: "ALOW_MY_SESSION".to_string(),
            block_page: "https://block.gokates.io".to_string(),
        }
    }
}

impl PolicyConfig {
    /// Parses and validates a TOML policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigParse`] for malformed TOML or unknown keys and
    /// [`Error::Config`] when a value fails [`validate`](Self::validate).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML policy file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigIo`] if the file cannot be read, otherwise the
    /// same errors as [`from_toml_str`](Self::from_toml_str).
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks that every configured value is well formed.
    ///
    /// - geo codes are two ASCII uppercase letters
    /// - sensitive URIs are non-empty absolute paths
    /// - client IPs are IPv4 or IPv6 addresses
    /// - the session cookie name is a bare token
    /// - the block page is an absolute `http` or `https` URL
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending value.
    pub fn validate(&self) -> Result<()> {
        if let Some(code) = self
            .allowed_geo_locations
            .iter()
            .find(|code| !is_geo_code(code))
        {
            return Err(Error::Config(format!(
                "geo location '{code}' is not a two-letter uppercase country code"
            )));
        }

        if let Some(uri) = self.sensitive_uris.iter().find(|uri| !uri.starts_with('/')) {
            return Err(Error::Config(format!(
                "sensitive uri '{uri}' must start with '/'"
            )));
        }

        if let Some(ip) = self
            .allowed_client_ips
            .iter()
            .find(|ip| ip.parse::<IpAddr>().is_err())
        {
            return Err(Error::Config(format!(
                "allowed client ip '{ip}' is not an IP address"
            )));
        }

        if !is_cookie_name(&self.session_cookie) {
            return Err(Error::Config(format!(
                "session cookie name '{}' must be non-empty without '=', ';' or whitespace",
                self.session_cookie
            )));
        }

        let block_page = Url::parse(&self.block_page)
            .map_err(|e| Error::Config(format!("block page '{}': {e}", self.block_page)))?;
        if !matches!(block_page.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "block page '{}' must use http or https",
                self.block_page
            )));
        }

        Ok(())
    }

    /// Reports whether `uri` is one of the sensitive paths.
    pub fn is_sensitive_uri(&self, uri: &str) -> bool {
        self.sensitive_uris.iter().any(|u| u == uri)
    }

    /// Reports whether `code` is an allowed viewer country.
    pub fn is_allowed_geo(&self, code: &str) -> bool {
        self.allowed_geo_locations.iter().any(|c| c == code)
    }

    /// Reports whether `ip` is an allow-listed viewer address.
    pub fn is_allowed_client_ip(&self, ip: &str) -> bool {
        self.allowed_client_ips.iter().any(|a| a == ip)
    }
}

fn is_geo_code(code: &str) -> bool {
    code.len() == 2 && code.bytes().all(|b| b.is_ascii_uppercase())
}

fn is_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && !name
            .chars()
            .any(|c| c == '=' || c == ';' || c.is_whitespace() || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        allowed_geo_locations = ["UK", "SG"]
        sensitive_uris = ["/myPersonalData", "/myProfile", "/purchase-history"]
        allowed_client_ips = ["125.132.32.23", "2001:db8::1"]
        session_cookie = "ALOW_MY_SESSION"
        block_page = "https://block.gokates.io"
    "#;

    #[test]
    fn default_is_valid() {
        assert!(PolicyConfig::default().validate().is_ok());
    }

    #[test]
    fn parses_valid_toml() {
        let config = PolicyConfig::from_toml_str(VALID).expect("valid config");

        assert_eq!(config.allowed_geo_locations, vec!["UK", "SG"]);
        assert_eq!(config.sensitive_uris.len(), 3);
        assert!(config.is_allowed_client_ip("2001:db8::1"));
        assert_eq!(config.session_cookie, "ALOW_MY_SESSION");
    }

    #[test]
    fn rejects_unknown_keys() {
        let text = format!("{VALID}\nextra = true\n");
        let err = PolicyConfig::from_toml_str(&text).unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn rejects_missing_keys() {
        let err = PolicyConfig::from_toml_str("session_cookie = \"S\"").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn rejects_bracketed_geo_code() {
        let config = PolicyConfig {
            allowed_geo_locations: vec!["UK".to_string(), "SG]".to_string()],
            ..PolicyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("SG]"));
    }

    #[test]
    fn rejects_lowercase_geo_code() {
        let config = PolicyConfig {
            allowed_geo_locations: vec!["uk".to_string()],
            ..PolicyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_relative_uri() {
        let config = PolicyConfig {
            sensitive_uris: vec!["myProfile".to_string()],
            ..PolicyConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_bad_client_ip() {
        let config = PolicyConfig {
            allowed_client_ips: vec!["245.22.245".to_string()],
            ..PolicyConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("245.22.245"));
    }

    #[test]
    fn rejects_bad_cookie_names() {
        for name in ["", "A B", "A=B", "A;B"] {
            let config = PolicyConfig {
                session_cookie: name.to_string(),
                ..PolicyConfig::default()
            };
            assert!(config.validate().is_err(), "accepted cookie name {name:?}");
        }
    }

    #[test]
    fn rejects_bad_block_page() {
        for page in ["block.gokates.io", "ftp://block.gokates.io", ""] {
            let config = PolicyConfig {
                block_page: page.to_string(),
                ..PolicyConfig::default()
            };
            assert!(config.validate().is_err(), "accepted block page {page:?}");
        }
    }

    #[test]
    fn membership_is_exact() {
        let config = PolicyConfig::default();

        assert!(config.is_sensitive_uri("/myProfile"));
        assert!(!config.is_sensitive_uri("/myProfile/"));
        assert!(!config.is_sensitive_uri("/MYPROFILE"));
        assert!(config.is_allowed_geo("UK"));
        assert!(!config.is_allowed_geo("uk"));
        assert!(config.is_allowed_client_ip("221.56.36.88"));
        assert!(!config.is_allowed_client_ip(" 221.56.36.88"));
    }

    #[test]
    fn load_from_missing_path_is_io_error() {
        let err = PolicyConfig::load_from_path("/nonexistent/gatekeeper.toml").unwrap_err();
        assert!(matches!(err, Error::ConfigIo(_)));
    }
}
