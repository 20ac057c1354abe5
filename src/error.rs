use thiserror::Error;

/// Errors that can occur while setting up or feeding the gatekeeper.
///
/// Request evaluation itself never fails: malformed request metadata is
/// downgraded to absent fields instead (see [`FieldError`]). These errors only
/// come from loading configuration or decoding raw JSON input.
///
/// [`FieldError`]: crate::FieldError
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration values failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file could not be read
    #[error("Failed to read config file: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// The configuration file is not valid TOML for [`PolicyConfig`](crate::PolicyConfig)
    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Raw request input was not valid JSON
    #[error("Invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = Error::Config("geo code 'SG]' is not two uppercase letters".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: geo code 'SG]' is not two uppercase letters"
        );
    }

    #[test]
    fn json_error_converts() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: Error = parse.into();
        assert!(matches!(err, Error::Json(_)));
        assert!(err.to_string().starts_with("Invalid request JSON"));
    }
}
