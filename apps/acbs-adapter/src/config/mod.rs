//! Configuration module for the ACBS adapter.
//!
//! Loads YAML configuration with environment variable interpolation and
//! validates the connection settings before any client is built.
//!
//! # Usage
//!
//! ```rust,ignore
//! use acbs_adapter::config::load_config;
//!
//! // Load from default path (config.yaml)
//! let config = load_config(None)?;
//!
//! println!("ACBS base URL: {}", config.acbs.base_url);
//! ```
//!
//! # Example
//!
//! ```yaml
//! acbs:
//!   base_url: ${ACBS_BASE_URL}
//!   api_key: ${ACBS_API_KEY}
//!   api_key_header_name: ${ACBS_API_KEY_HEADER_NAME:-x-api-key}
//!   use_return_exception_header: true
//!   authentication:
//!     base_url: ${ACBS_AUTHENTICATION_BASE_URL}
//!     login_name: ${ACBS_AUTHENTICATION_LOGIN_NAME}
//!     password: ${ACBS_AUTHENTICATION_PASSWORD}
//!     client_id: ${ACBS_AUTHENTICATION_CLIENT_ID}
//! ```

mod acbs;
mod observability;

use serde::Deserialize;
use thiserror::Error;

pub use acbs::{AcbsConfig, AuthenticationConfig};
pub use observability::{LoggingConfig, ObservabilityConfig};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        /// Path to the config file.
        path: String,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// Failed to parse YAML configuration.
    #[error("Failed to parse config YAML: {0}")]
    ParseError(#[from] serde_yaml_bw::Error),

    /// Configuration validation failed.
    #[error("Config validation failed: {0}")]
    ValidationError(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// ACBS connection settings.
    pub acbs: AcbsConfig,
    /// Observability configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ============================================
// Configuration Loading
// ============================================

/// Load configuration from a YAML file with environment variable interpolation.
///
/// # Arguments
///
/// * `path` - Optional path to the config file. Defaults to "config.yaml".
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, parsed, or validated.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or("config.yaml");

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_string(),
        source: e,
    })?;

    load_config_from_string(&contents)
}

/// Load configuration from a YAML string (useful for testing).
///
/// # Errors
///
/// Returns a `ConfigError` if the YAML cannot be parsed or validated.
pub fn load_config_from_string(yaml: &str) -> Result<Config, ConfigError> {
    let interpolated = interpolate_env_vars(yaml);
    let mut config: Config = serde_yaml_bw::from_str(&interpolated)?;
    normalize_config(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Interpolate environment variables in a string.
///
/// Supports both `${VAR}` and `${VAR:-default}` syntax.
#[allow(clippy::expect_used)] // Regex is compile-time constant; expect() is safe here
fn interpolate_env_vars(input: &str) -> String {
    use std::sync::OnceLock;

    static ENV_VAR_REGEX: OnceLock<regex::Regex> = OnceLock::new();

    let re = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("env var regex is valid")
    });

    re.replace_all(input, |cap: &regex::Captures<'_>| {
        let default_value = cap.get(2).map(|m| m.as_str());
        match std::env::var(&cap[1]) {
            Ok(v) if !v.is_empty() => v,
            _ => default_value.map_or_else(String::new, str::to_string),
        }
    })
    .into_owned()
}

/// Strip trailing slashes so paths can be appended verbatim.
fn normalize_config(config: &mut Config) {
    let trim = |url: &mut String| {
        let trimmed_len = url.trim_end_matches('/').len();
        url.truncate(trimmed_len);
    };
    trim(&mut config.acbs.base_url);
    trim(&mut config.acbs.authentication.base_url);
}

/// Validate configuration values.
fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let acbs = &config.acbs;
    let auth = &acbs.authentication;

    for (field, url) in [
        ("acbs.base_url", &acbs.base_url),
        ("acbs.authentication.base_url", &auth.base_url),
    ] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "{field} must be an http(s) URL"
            )));
        }
    }

    for (field, value) in [
        ("acbs.api_key", &acbs.api_key),
        ("acbs.api_key_header_name", &acbs.api_key_header_name),
        ("acbs.authentication.login_name", &auth.login_name),
        ("acbs.authentication.password", &auth.password),
        ("acbs.authentication.client_id", &auth.client_id),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{field} must not be empty"
            )));
        }
    }

    if acbs.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "acbs.timeout_secs must be positive".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    const MINIMAL: &str = r#"
acbs:
  base_url: "https://acbs.example.com/api/v1/"
  api_key: "key"
  api_key_header_name: "x-api-key"
  authentication:
    base_url: "https://idp.example.com/auth"
    login_name: "user"
    password: "secret"
    client_id: "client"
"#;

    #[test]
    fn test_load_minimal_config() {
        let config = match load_config_from_string(MINIMAL) {
            Ok(c) => c,
            Err(e) => panic!("should load minimal config: {e}"),
        };

        assert_eq!(config.acbs.base_url, "https://acbs.example.com/api/v1");
        assert_eq!(config.acbs.api_key_header_name, "x-api-key");
        assert!(!config.acbs.use_return_exception_header);
        assert_eq!(config.acbs.timeout(), Duration::from_secs(30));
        assert_eq!(config.acbs.authentication.client_id, "client");
        assert_eq!(config.observability.logging.level, "info");
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
acbs:
  base_url: "http://localhost:8080"
  api_key: "key"
  api_key_header_name: "Ocp-Apim-Subscription-Key"
  use_return_exception_header: true
  timeout_secs: 5
  authentication:
    base_url: "http://localhost:8081/"
    login_name: "user"
    password: "secret"
    client_id: "client"
observability:
  logging:
    level: "debug"
    format: "pretty"
"#;

        let config = load_config_from_string(yaml).unwrap();
        assert!(config.acbs.use_return_exception_header);
        assert_eq!(config.acbs.timeout_secs, 5);
        assert_eq!(config.acbs.authentication.base_url, "http://localhost:8081");
        assert_eq!(config.observability.logging.level, "debug");
        assert_eq!(config.observability.logging.format, "pretty");
    }

    #[test]
    fn test_env_var_with_default_when_missing() {
        let input = "header: ${ACBS_CONFIG_TEST_NONEXISTENT_VAR:-x-api-key}";
        let result = interpolate_env_vars(input);
        assert_eq!(result, "header: x-api-key");
    }

    #[test]
    fn test_env_var_with_default_uses_existing() {
        let input = "path: ${PATH:-default}";
        let result = interpolate_env_vars(input);
        assert_ne!(result, "path: default");
        assert!(result.starts_with("path: "));
    }

    #[test]
    fn test_env_var_without_default_becomes_empty() {
        let input = "api_key: ${ACBS_CONFIG_TEST_UNLIKELY_TO_EXIST}";
        let result = interpolate_env_vars(input);
        assert_eq!(result, "api_key: ");
    }

    #[test]
    fn test_validation_rejects_non_http_url() {
        let yaml = MINIMAL.replace("https://idp.example.com/auth", "idp.example.com");
        let Err(err) = load_config_from_string(&yaml) else {
            panic!("expected error for invalid URL");
        };
        assert!(err.to_string().contains("acbs.authentication.base_url"));
    }

    #[test]
    fn test_validation_rejects_empty_password() {
        let yaml = MINIMAL.replace(r#"password: "secret""#, r#"password: """#);
        let Err(err) = load_config_from_string(&yaml) else {
            panic!("expected error for empty password");
        };
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let yaml = MINIMAL.replace("  authentication:", "  timeout_secs: 0\n  authentication:");
        let Err(err) = load_config_from_string(&yaml) else {
            panic!("expected error for zero timeout");
        };
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_missing_acbs_section_is_parse_error() {
        let result = load_config_from_string("observability: {}\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.acbs.authentication.login_name, "user");
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some("/nonexistent/acbs-config.yaml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load_config_from_string(MINIMAL).unwrap();
        let debug = format!("{:?}", config.acbs);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("\"key\""));
    }
}
