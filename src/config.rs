//! YAML configuration file support.
//!
//! One file configures the trace stages and the CLI's log output.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: "1.0"
//! name: "ecfp-2 explanations"
//!
//! trace:
//!   version: 1
//!   radius: 2
//!   isomeric: true
//!   kekulize: false
//!   include_per_center: true
//!   include_radius_tag: true
//!   mark_root: true
//!   fingerprint_size: 2048
//!
//! logging:
//!   filter: "info"
//!   format: "json"
//! ```

use std::fs;
use std::path::Path;

use explain::{TraceConfig, DEFAULT_FINGERPRINT_SIZE, DEFAULT_RADIUS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct EcfpConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub trace: TraceYamlConfig,

    #[serde(default)]
    pub logging: LoggingYamlConfig,
}

impl EcfpConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: EcfpConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.trace.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Stage configuration for [`crate::TraceSession::explain`].
    pub fn trace_config(&self) -> TraceConfig {
        self.trace.to_trace_config()
    }
}

impl Default for EcfpConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            trace: TraceYamlConfig::default(),
            logging: LoggingYamlConfig::default(),
        }
    }
}

/// `trace:` section; every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TraceYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_radius")]
    pub radius: u32,

    #[serde(default = "true_value")]
    pub isomeric: bool,

    #[serde(default)]
    pub kekulize: bool,

    #[serde(default = "true_value")]
    pub include_per_center: bool,

    #[serde(default = "true_value")]
    pub include_radius_tag: bool,

    #[serde(default = "true_value")]
    pub mark_root: bool,

    #[serde(default = "default_fingerprint_size")]
    pub fingerprint_size: usize,
}

impl TraceYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_trace_config()
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("trace: {err}")))
    }

    pub fn to_trace_config(&self) -> TraceConfig {
        TraceConfig {
            version: self.version,
            radius: self.radius,
            isomeric: self.isomeric,
            kekulize: self.kekulize,
            include_per_center: self.include_per_center,
            include_radius_tag: self.include_radius_tag,
            mark_root: self.mark_root,
            fingerprint_size: self.fingerprint_size,
        }
    }
}

impl Default for TraceYamlConfig {
    fn default() -> Self {
        let cfg = TraceConfig::default();
        Self {
            version: cfg.version,
            radius: cfg.radius,
            isomeric: cfg.isomeric,
            kekulize: cfg.kekulize,
            include_per_center: cfg.include_per_center,
            include_radius_tag: cfg.include_radius_tag,
            mark_root: cfg.mark_root,
            fingerprint_size: cfg.fingerprint_size,
        }
    }
}

/// `logging:` section read by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingYamlConfig {
    /// `tracing_subscriber::EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,

    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(ConfigLoadError::Validation(format!(
                "logging.format must be \"text\" or \"json\" (got {other:?})"
            ))),
        }
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

impl Default for LoggingYamlConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: default_log_format(),
        }
    }
}

fn default_version() -> u32 {
    1
}
fn default_radius() -> u32 {
    DEFAULT_RADIUS
}
fn true_value() -> bool {
    true
}
fn default_fingerprint_size() -> usize {
    DEFAULT_FINGERPRINT_SIZE
}
fn default_log_filter() -> String {
    "warn".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_valid_yaml() {
        let yaml = r#"
version: "1.0"
name: "test config"
trace:
  radius: 3
  kekulize: true
"#;

        let config = EcfpConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.name, Some("test config".to_string()));
        let trace = config.trace_config();
        assert_eq!(trace.radius, 3);
        assert!(trace.kekulize);
        assert!(trace.isomeric);
        assert_eq!(trace.fingerprint_size, 2048);
    }

    #[test]
    fn test_load_from_file() {
        let yaml = r#"
version: "1.0"
trace:
  fingerprint_size: 1024
logging:
  format: "json"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml.as_bytes()).unwrap();

        let config = EcfpConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.trace.fingerprint_size, 1024);
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let result = EcfpConfig::from_file("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigLoadError::FileRead(_))));
    }

    #[test]
    fn test_default_config() {
        let config = EcfpConfig::default();
        assert_eq!(config.version, "1.0");
        assert!(config.name.is_none());
        assert_eq!(config.trace_config(), TraceConfig::default());
        assert_eq!(config.logging.filter, "warn");
    }

    #[test]
    fn test_unsupported_version() {
        let result = EcfpConfig::from_yaml("version: \"2.0\"\n");
        assert!(matches!(result, Err(ConfigLoadError::UnsupportedVersion(v)) if v == "2.0"));
    }

    #[test]
    fn test_trace_validation() {
        let yaml = r#"
version: "1.0"
trace:
  fingerprint_size: 0
"#;

        let result = EcfpConfig::from_yaml(yaml);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("fingerprint_size must be >= 1"));
    }

    #[test]
    fn test_logging_validation() {
        let yaml = r#"
version: "1.0"
logging:
  format: "xml"
"#;

        let err = EcfpConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("logging.format"));
    }

    #[test]
    fn test_malformed_yaml() {
        let result = EcfpConfig::from_yaml("version: [unclosed");
        assert!(matches!(result, Err(ConfigLoadError::YamlParse(_))));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = EcfpConfig {
            name: Some("roundtrip".into()),
            ..EcfpConfig::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(EcfpConfig::from_yaml(&yaml).unwrap(), config);
    }
}
